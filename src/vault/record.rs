// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Identity record types.
//!
//! An [`IdentityRecord`] is exclusively owned by the vault: the PII it
//! carries exists only inside the sealed envelope, and every mutation
//! goes through [`super::IdentityVault`]. API responses use
//! [`IdentityRecordResponse`], which never includes the envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::envelope::SealedEnvelope;

/// Vault record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VaultStatus {
    /// Submitted, identity verification outcome pending
    PendingVerification,
    /// Identity verified; eligible for RugID issuance
    Verified,
    /// Identity verification rejected
    Rejected,
    /// Dead-man's-switch deadline elapsed; disclosure permitted
    PendingUnmask,
    /// Identity was disclosed (package sent or dead-man release)
    Released,
}

impl std::fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PendingVerification => "pending_verification",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::PendingUnmask => "pending_unmask",
            Self::Released => "released",
        };
        f.write_str(s)
    }
}

/// An identity record as persisted in the vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Unique record identifier (UUID)
    pub record_id: String,
    /// Pseudonymous identifier, once issued (at most one per record)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rug_id: Option<String>,
    /// Sealed identity payload (the only place PII exists)
    pub envelope: SealedEnvelope,
    /// Current vault status
    pub status: VaultStatus,
    /// Dead-man's-switch deadline, if armed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_deadline: Option<DateTime<Utc>>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the switch was last renewed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_renewed_at: Option<DateTime<Utc>>,
    /// When the record last changed
    pub updated_at: DateTime<Utc>,
}

/// Response returned to API clients (never includes the envelope).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityRecordResponse {
    /// Unique record identifier
    pub record_id: String,
    /// Pseudonymous identifier, once issued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rug_id: Option<String>,
    /// Current vault status
    pub status: VaultStatus,
    /// Dead-man's-switch deadline, if armed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_deadline: Option<DateTime<Utc>>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record last changed
    pub updated_at: DateTime<Utc>,
}

impl From<IdentityRecord> for IdentityRecordResponse {
    fn from(record: IdentityRecord) -> Self {
        Self {
            record_id: record.record_id,
            rug_id: record.rug_id,
            status: record.status,
            switch_deadline: record.switch_deadline,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Decrypted identity material returned by a vault open.
///
/// Exists only for the duration of the disclosure call; callers must not
/// cache it beyond the request that triggered the disclosure.
#[derive(Debug, Clone)]
pub struct DisclosedIdentity {
    /// Record the payload belongs to.
    pub record_id: String,
    /// The record's RugID, if issued.
    pub rug_id: Option<String>,
    /// The decrypted identity payload.
    pub payload: serde_json::Value,
}
