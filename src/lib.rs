// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! RugGuard Core - Identity Vault & Investigation Lifecycle Service
//!
//! Accountability layer for pseudonymous Web3 project launches: verified
//! owner identities are held encrypted in a vault, projects operate under
//! a public RugID, and a fraud investigation that clears the two-person
//! rule can unmask the owner to an external authority. Every sensitive
//! action lands in a hash-chained audit ledger before it is acknowledged.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Actor identity and role checks
//! - `ledger` - Append-only hash-chained audit ledger
//! - `vault` - Layered-envelope identity vault and dead-man's switch
//! - `rugid` - Pseudonym derivation and issuance
//! - `investigation` - Case state machine and package delivery
//! - `projector` - Public status projection
//! - `storage` - File-backed JSON persistence

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod investigation;
pub mod ledger;
pub mod locks;
pub mod models;
pub mod projector;
pub mod rugid;
pub mod state;
pub mod storage;
pub mod vault;
