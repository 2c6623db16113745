// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Path constants and utilities for the persistent storage layout.

use std::path::{Path, PathBuf};

/// Base directory for all persistent storage.
/// In production this must be mounted on encrypted, access-controlled storage.
pub const DATA_ROOT: &str = "/data";

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Vault Paths ==========

    /// Directory containing all identity records.
    pub fn vault_dir(&self) -> PathBuf {
        self.root.join("vault")
    }

    /// Path to a specific identity record file.
    pub fn identity_record(&self, record_id: &str) -> PathBuf {
        self.vault_dir().join(format!("{record_id}.json"))
    }

    // ========== RugID Index Paths ==========

    /// Directory containing the RugID uniqueness index.
    pub fn rugids_dir(&self) -> PathBuf {
        self.root.join("rugids")
    }

    /// Path to a RugID index entry (maps the id back to its record).
    pub fn rugid_entry(&self, rug_id: &str) -> PathBuf {
        self.rugids_dir().join(format!("{rug_id}.json"))
    }

    // ========== Investigation Paths ==========

    /// Directory containing all investigations.
    pub fn investigations_dir(&self) -> PathBuf {
        self.root.join("investigations")
    }

    /// Path to a specific investigation file.
    pub fn investigation(&self, investigation_id: &str) -> PathBuf {
        self.investigations_dir()
            .join(format!("{investigation_id}.json"))
    }

    // ========== Report Paths ==========

    /// Directory containing all fraud reports.
    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    /// Path to a specific report file.
    pub fn report(&self, report_id: &str) -> PathBuf {
        self.reports_dir().join(format!("{report_id}.json"))
    }

    // ========== Audit Ledger Paths ==========

    /// Directory containing the audit ledger.
    pub fn ledger_dir(&self) -> PathBuf {
        self.root.join("ledger")
    }

    /// Path to the hash-chained audit log (JSONL, append-only).
    pub fn ledger_chain_file(&self) -> PathBuf {
        self.ledger_dir().join("chain.jsonl")
    }
}
