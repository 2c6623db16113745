// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! # Persistent Storage Module
//!
//! File-backed storage for all core state. Identity PII is encrypted by
//! the vault layer before it reaches this module; everything else is
//! plain JSON.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/
//!   vault/{record_id}.json        # Identity records (PII inside envelope)
//!   rugids/{rug_id}.json          # RugID -> record uniqueness index
//!   investigations/{id}.json      # Investigation case files
//!   reports/{report_id}.json      # Raw fraud reports
//!   ledger/chain.jsonl            # Hash-chained audit log (append-only)
//! ```

pub mod fs;
pub mod paths;

pub use fs::{DataStore, StorageError, StorageResult};
pub use paths::StoragePaths;
