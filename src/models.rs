// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`, `Deserialize`, and `ToSchema` for automatic JSON
//! handling and OpenAPI documentation.
//!
//! Domain state lives with its owner (`vault::record`,
//! `investigation::model`); this module only carries the wire shapes
//! around it. Nothing here ever contains decrypted identity material
//! except [`DisclosureResponse`], which exists for the duration of a
//! granted disclosure request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::vault::VerificationDecision;

// =============================================================================
// Identity Vault
// =============================================================================

/// Submit an identity payload to the vault.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitIdentityRequest {
    /// Free-form identity payload (legal name, document references, ...).
    /// Sealed before it touches disk.
    pub payload: serde_json::Value,
}

/// Decide identity verification for a submitted record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    pub decision: VerificationDecision,
}

/// Arm the dead-man's switch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArmSwitchRequest {
    /// Absolute deadline; must be in the future.
    pub deadline: DateTime<Utc>,
}

/// Push the dead-man's-switch deadline out.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenewSwitchRequest {
    /// New absolute deadline; must be in the future.
    pub deadline: DateTime<Utc>,
}

/// Request an audited disclosure of a vaulted identity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DisclosureRequest {
    /// Why the vault should open. Digested into the audit ledger.
    pub justification: String,
}

/// A granted disclosure. Call-scoped; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DisclosureResponse {
    pub record_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rug_id: Option<String>,
    /// The decrypted identity payload.
    pub payload: serde_json::Value,
}

// =============================================================================
// RugID
// =============================================================================

/// Response for a newly issued RugID.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueRugIdResponse {
    pub rug_id: String,
    pub record_id: String,
}

// =============================================================================
// Reports & Investigations
// =============================================================================

/// Submit a fraud report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateReportRequest {
    pub project_name: String,
    /// RugID of the accused project owner, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rug_id: Option<String>,
    pub description: String,
    #[serde(default)]
    pub evidence_links: Vec<String>,
    pub reporter_contact: String,
}

/// Open an investigation from a report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateInvestigationRequest {
    pub report_ref: String,
    /// Issued RugID to tie the case to when the report named none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_rug_id: Option<String>,
}

/// Apply one state machine transition.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransitionRequest {
    /// Target state name (`assigned`, `in_progress`, ...).
    pub target: String,
    /// Agent to assign (required for `assigned`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Verification notes (required for `pending_verification`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Send the evidence package for an approved investigation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendPackageRequest {
    /// Authority endpoint the package is POSTed to.
    pub destination: String,
}

/// Confirmation of a sent package.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendPackageResponse {
    pub investigation_id: String,
    /// SHA-256 digest of the package as delivered.
    pub package_digest: String,
}

// =============================================================================
// Audit
// =============================================================================

/// Result of an audit chain verification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditVerifyResponse {
    /// First sequence number verified.
    pub from_seq: u64,
    /// Last sequence number verified.
    pub to_seq: u64,
    /// Whether the chain recomputed cleanly over the range.
    pub valid: bool,
}

// =============================================================================
// Health
// =============================================================================

/// Service health summary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Whether the data store answered the write-read-delete probe.
    pub storage_ok: bool,
    /// Last audit ledger sequence number.
    pub ledger_seq: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_request_parses_minimal_body() {
        let request: TransitionRequest =
            serde_json::from_str(r#"{"target": "in_progress"}"#).unwrap();
        assert_eq!(request.target, "in_progress");
        assert!(request.assignee.is_none());
        assert!(request.notes.is_none());
    }

    #[test]
    fn report_request_defaults_evidence_links() {
        let request: CreateReportRequest = serde_json::from_str(
            r#"{"project_name": "X", "description": "d", "reporter_contact": "r@example.com"}"#,
        )
        .unwrap();
        assert!(request.evidence_links.is_empty());
        assert!(request.rug_id.is_none());
    }
}
