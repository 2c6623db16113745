// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Investigation and report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Investigation state machine status.
///
/// ```text
/// reported -> assigned -> in_progress -> pending_verification
///   -> pending_final_verification -> approved -> package_sent
///                                 -> rejected
/// ```
///
/// `rejected` and `package_sent` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationStatus {
    /// Report intake complete, no agent yet
    Reported,
    /// Agent assigned
    Assigned,
    /// Agent actively investigating
    InProgress,
    /// Agent submitted verification notes
    PendingVerification,
    /// Second reviewer confirmed (two-person rule satisfied)
    PendingFinalVerification,
    /// Admin approved; package release pending
    Approved,
    /// Investigation rejected (terminal)
    Rejected,
    /// Evidence package sent to the external authority (terminal)
    PackageSent,
}

impl InvestigationStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::PackageSent)
    }

    /// Whether this status satisfies the vault disclosure threshold
    /// (at or beyond `pending_final_verification`).
    pub fn meets_disclosure_threshold(&self) -> bool {
        matches!(
            self,
            Self::PendingFinalVerification | Self::Approved | Self::PackageSent
        )
    }

    /// Parse from the wire name used by the transition endpoint.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reported" => Some(Self::Reported),
            "assigned" => Some(Self::Assigned),
            "in_progress" => Some(Self::InProgress),
            "pending_verification" => Some(Self::PendingVerification),
            "pending_final_verification" => Some(Self::PendingFinalVerification),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "package_sent" => Some(Self::PackageSent),
            _ => None,
        }
    }
}

impl std::fmt::Display for InvestigationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Reported => "reported",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::PendingVerification => "pending_verification",
            Self::PendingFinalVerification => "pending_final_verification",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::PackageSent => "package_sent",
        };
        f.write_str(s)
    }
}

/// An investigation case file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Investigation {
    /// Unique case identifier (UUID)
    pub investigation_id: String,
    /// Linked RugID, if the report named one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rug_id: Option<String>,
    /// The report that opened this case
    pub report_ref: String,
    /// Current state machine status
    pub status: InvestigationStatus,
    /// Evidence references collected so far
    pub evidence: Vec<String>,
    /// Assigned agent ids (in assignment order)
    pub assigned_agents: Vec<String>,
    /// Verification notes from the assigned agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_notes: Option<String>,
    /// Agent who moved the case to `pending_verification`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    /// Reviewer who moved the case to `pending_final_verification`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_by: Option<String>,
    /// When the case was opened
    pub created_at: DateTime<Utc>,
    /// When the case last transitioned
    pub updated_at: DateTime<Utc>,
}

impl Investigation {
    /// Whether the given agent is currently assigned to this case.
    pub fn is_assigned(&self, agent_id: &str) -> bool {
        self.assigned_agents.iter().any(|a| a == agent_id)
    }
}

/// A raw fraud report as submitted.
///
/// Immutable once stored, except for the link to the investigation that
/// consumed it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Report {
    /// Unique report identifier (UUID)
    pub report_id: String,
    /// Project the report concerns
    pub project_name: String,
    /// RugID named by the reporter, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rug_id: Option<String>,
    /// Free-form description of the suspected fraud
    pub description: String,
    /// Links to supporting evidence
    pub evidence_links: Vec<String>,
    /// How to reach the reporter
    pub reporter_contact: String,
    /// Investigation opened from this report, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_investigation: Option<String>,
    /// When the report was submitted
    pub created_at: DateTime<Utc>,
}
