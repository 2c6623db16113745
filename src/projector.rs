// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Public status projection.
//!
//! Collapses vault and investigation state into the four coarse labels
//! safe to show without authentication. The projection is deliberately
//! lossy: it never exposes who reported, which agent is assigned, or
//! how far an individual case has progressed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{CoreError, CoreResult};
use crate::investigation::model::Investigation;
use crate::rugid::RugIdEntry;
use crate::storage::{DataStore, StorageError};
use crate::vault::{IdentityRecord, VaultStatus};

/// Coarse public label for a RugID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PublicLabel {
    /// Id issued, identity not (or no longer) verified
    Registered,
    /// Identity verified, nothing pending
    Verified,
    /// At least one open case, or a dead-man unmask pending
    UnderInvestigation,
    /// Identity was disclosed to an authority
    Blacklisted,
}

impl std::fmt::Display for PublicLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Registered => "registered",
            Self::Verified => "verified",
            Self::UnderInvestigation => "under_investigation",
            Self::Blacklisted => "blacklisted",
        };
        f.write_str(s)
    }
}

/// The public view of a RugID.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicStatus {
    /// The queried id.
    pub rug_id: String,
    /// Coarse status label.
    pub status: PublicLabel,
    /// When the underlying state last changed.
    pub last_change_date: DateTime<Utc>,
}

/// Projects internal state onto the public status surface.
pub struct PublicStatusProjector {
    store: DataStore,
}

impl PublicStatusProjector {
    pub fn new(store: DataStore) -> Self {
        Self { store }
    }

    /// Project the public status for a RugID.
    ///
    /// Unknown ids are a `NotFound`; any read failure propagates rather
    /// than degrading to a more permissive label.
    pub fn project(&self, rug_id: &str) -> CoreResult<PublicStatus> {
        let entry: RugIdEntry = match self.store.read_json(self.store.paths().rugid_entry(rug_id))
        {
            Ok(entry) => entry,
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::NotFound(format!("RugID {rug_id}")))
            }
            Err(e) => return Err(e.into()),
        };

        let record: IdentityRecord = self
            .store
            .read_json(self.store.paths().identity_record(&entry.record_id))?;

        let cases = self.cases_for(rug_id)?;
        let mut last_change = record.updated_at;
        for case in &cases {
            if case.updated_at > last_change {
                last_change = case.updated_at;
            }
        }

        let any_package_sent = cases
            .iter()
            .any(|c| c.status == crate::investigation::InvestigationStatus::PackageSent);
        let any_open = cases.iter().any(|c| !c.status.is_terminal());

        let status = if record.status == VaultStatus::Released || any_package_sent {
            PublicLabel::Blacklisted
        } else if any_open || record.status == VaultStatus::PendingUnmask {
            PublicLabel::UnderInvestigation
        } else if record.status == VaultStatus::Verified {
            PublicLabel::Verified
        } else {
            PublicLabel::Registered
        };

        Ok(PublicStatus {
            rug_id: rug_id.to_string(),
            status,
            last_change_date: last_change,
        })
    }

    fn cases_for(&self, rug_id: &str) -> CoreResult<Vec<Investigation>> {
        let ids = self
            .store
            .list_files(self.store.paths().investigations_dir(), "json")?;
        let mut out = Vec::new();
        for id in ids {
            let case: Investigation =
                match self.store.read_json(self.store.paths().investigation(&id)) {
                    Ok(case) => case,
                    Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                        continue
                    }
                    Err(e) => return Err(e.into()),
                };
            if case.rug_id.as_deref() == Some(rug_id) {
                out.push(case);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Actor, Role};
    use crate::investigation::{
        InvestigationEngine, InvestigationStatus, PackageTransport, TransitionParams,
    };
    use crate::ledger::AuditLedger;
    use crate::rugid::PseudonymGenerator;
    use crate::storage::StoragePaths;
    use crate::vault::{IdentityVault, VaultKeys, VerificationDecision};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Harness {
        _temp: TempDir,
        vault: Arc<IdentityVault>,
        generator: PseudonymGenerator,
        engine: InvestigationEngine,
        projector: PublicStatusProjector,
    }

    fn harness() -> Harness {
        let temp = TempDir::new().unwrap();
        let paths = StoragePaths::new(temp.path());
        let mut store = DataStore::new(paths);
        store.initialize().unwrap();
        let ledger = Arc::new(AuditLedger::open(store.clone()).unwrap());
        let vault = Arc::new(IdentityVault::new(
            store.clone(),
            Arc::clone(&ledger),
            VaultKeys::ephemeral(),
        ));
        let generator =
            PseudonymGenerator::new(store.clone(), Arc::clone(&vault), "salt".to_string());
        let engine = InvestigationEngine::new(
            store.clone(),
            ledger,
            Arc::clone(&vault),
            PackageTransport::memory(),
        );
        let projector = PublicStatusProjector::new(store);
        Harness {
            _temp: temp,
            vault,
            generator,
            engine,
            projector,
        }
    }

    fn admin() -> Actor {
        Actor::new("admin-1", Role::Admin)
    }

    fn agent(id: &str) -> Actor {
        Actor::new(id, Role::Agent)
    }

    fn issued(h: &Harness) -> String {
        let record = h
            .vault
            .submit(&serde_json::json!({"legal_name": "Jane Doe"}), &admin())
            .unwrap();
        h.vault
            .set_verification_status(&record.record_id, VerificationDecision::Verified, &admin())
            .unwrap();
        h.generator
            .issue(&record.record_id, &admin())
            .unwrap()
            .as_str()
            .to_string()
    }

    #[test]
    fn unknown_id_is_not_found() {
        let h = harness();
        assert!(matches!(
            h.projector.project("RID-AB12CD34EF56"),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn verified_record_projects_verified() {
        let h = harness();
        let rug_id = issued(&h);
        let status = h.projector.project(&rug_id).unwrap();
        assert_eq!(status.status, PublicLabel::Verified);
        assert_eq!(status.rug_id, rug_id);
    }

    #[test]
    fn open_case_projects_under_investigation() {
        let h = harness();
        let rug_id = issued(&h);

        let report = h
            .engine
            .create_report(
                "SafeMoonX",
                Some(rug_id.clone()),
                "rug pull",
                vec![],
                "r@example.com",
                &Actor::new("rep-1", Role::Reporter),
            )
            .unwrap();
        h.engine
            .create_investigation(&report.report_id, None, &agent("agent-1"))
            .unwrap();

        let status = h.projector.project(&rug_id).unwrap();
        assert_eq!(status.status, PublicLabel::UnderInvestigation);
    }

    #[test]
    fn rejected_case_falls_back_to_verified() {
        let h = harness();
        let rug_id = issued(&h);
        let report = h
            .engine
            .create_report(
                "SafeMoonX",
                Some(rug_id.clone()),
                "rug pull",
                vec![],
                "r@example.com",
                &Actor::new("rep-1", Role::Reporter),
            )
            .unwrap();
        let case = h
            .engine
            .create_investigation(&report.report_id, None, &agent("agent-1"))
            .unwrap();
        h.engine
            .transition(
                &case.investigation_id,
                InvestigationStatus::Rejected,
                &TransitionParams::default(),
                &admin(),
            )
            .unwrap();

        let status = h.projector.project(&rug_id).unwrap();
        assert_eq!(status.status, PublicLabel::Verified);
    }

    #[test]
    fn pending_unmask_projects_under_investigation() {
        let h = harness();
        let rug_id = issued(&h);
        let entry: RugIdEntry = h
            .projector
            .store
            .read_json(h.projector.store.paths().rugid_entry(&rug_id))
            .unwrap();
        h.vault
            .arm_dead_man_switch(
                &entry.record_id,
                Utc::now() + chrono::Duration::milliseconds(5),
                &admin(),
            )
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        h.vault.sweep_expired_switches().unwrap();

        let status = h.projector.project(&rug_id).unwrap();
        assert_eq!(status.status, PublicLabel::UnderInvestigation);
    }

    #[test]
    fn released_record_projects_blacklisted() {
        let h = harness();
        let rug_id = issued(&h);
        let entry: RugIdEntry = h
            .projector
            .store
            .read_json(h.projector.store.paths().rugid_entry(&rug_id))
            .unwrap();
        h.vault
            .arm_dead_man_switch(
                &entry.record_id,
                Utc::now() + chrono::Duration::milliseconds(5),
                &admin(),
            )
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        h.vault.sweep_expired_switches().unwrap();
        h.vault
            .request_disclosure(&entry.record_id, &admin(), "dead-man release")
            .unwrap();

        let status = h.projector.project(&rug_id).unwrap();
        assert_eq!(status.status, PublicLabel::Blacklisted);
    }

    #[test]
    fn projection_carries_no_internal_detail() {
        let h = harness();
        let rug_id = issued(&h);
        let status = h.projector.project(&rug_id).unwrap();
        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("record_id"));
        assert!(!json.contains("assigned"));
        assert!(!json.contains("envelope"));
    }
}
