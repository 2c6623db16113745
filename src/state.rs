// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

use std::sync::Arc;

use crate::error::CoreResult;
use crate::investigation::{InvestigationEngine, PackageTransport};
use crate::ledger::AuditLedger;
use crate::projector::PublicStatusProjector;
use crate::rugid::PseudonymGenerator;
use crate::storage::DataStore;
use crate::vault::{IdentityVault, VaultKeys};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: DataStore,
    pub ledger: Arc<AuditLedger>,
    pub vault: Arc<IdentityVault>,
    pub generator: Arc<PseudonymGenerator>,
    pub engine: Arc<InvestigationEngine>,
    pub projector: Arc<PublicStatusProjector>,
}

impl AppState {
    /// Wire up the full component graph over an initialized store.
    pub fn build(
        store: DataStore,
        keys: VaultKeys,
        rugid_salt: String,
        transport: PackageTransport,
        send_timeout: std::time::Duration,
    ) -> CoreResult<Self> {
        let ledger = Arc::new(AuditLedger::open(store.clone())?);
        let vault = Arc::new(IdentityVault::new(
            store.clone(),
            Arc::clone(&ledger),
            keys,
        ));
        let generator = Arc::new(PseudonymGenerator::new(
            store.clone(),
            Arc::clone(&vault),
            rugid_salt,
        ));
        let engine = Arc::new(
            InvestigationEngine::new(
                store.clone(),
                Arc::clone(&ledger),
                Arc::clone(&vault),
                transport,
            )
            .with_send_timeout(send_timeout),
        );
        let projector = Arc::new(PublicStatusProjector::new(store.clone()));

        Ok(Self {
            store,
            ledger,
            vault,
            generator,
            engine,
            projector,
        })
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    /// State over a temp directory with ephemeral keys and the in-memory
    /// package transport.
    pub fn state() -> (TempDir, AppState) {
        let temp = TempDir::new().expect("temp dir");
        let paths = StoragePaths::new(temp.path());
        let mut store = DataStore::new(paths);
        store.initialize().expect("storage init");
        let state = AppState::build(
            store,
            VaultKeys::ephemeral(),
            "test-salt".to_string(),
            PackageTransport::memory(),
            std::time::Duration::from_secs(5),
        )
        .expect("state build");
        (temp, state)
    }
}
