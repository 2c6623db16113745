// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! # Identity Vault
//!
//! Custody of reporter and project-owner PII. Payloads are sealed into a
//! two-layer encryption envelope on submission and never persisted or
//! logged in plaintext; the only read path is an audited disclosure
//! gated on investigation progress or an elapsed dead-man's switch.
//!
//! - [`envelope`] — layered AES-256-GCM envelope (seal / open)
//! - [`keys`] — layer key material, zeroed on drop
//! - [`record`] — the persisted record and its API projection
//! - [`vault`] — the vault operations and disclosure policy
//! - [`sweep`] — background dead-man's-switch sweeper

pub mod envelope;
pub mod keys;
pub mod record;
pub mod sweep;
#[allow(clippy::module_inception)]
pub mod vault;

pub use envelope::{EnvelopeError, SealedEnvelope};
pub use keys::{LayerKey, VaultKeys};
pub use record::{DisclosedIdentity, IdentityRecord, IdentityRecordResponse, VaultStatus};
pub use sweep::SwitchSweeper;
pub use vault::{IdentityVault, VerificationDecision, SWEEPER_ACTOR};
