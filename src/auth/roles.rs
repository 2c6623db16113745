// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Actor roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Actor roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Final verification, approval, and package release
/// - `Agent` - Investigation work (assignment, verification)
/// - `Owner` - Project owner (identity submission, switch renewal)
/// - `Reporter` - Fraud report submission only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Investigation agent
    Agent,
    /// Verified project owner
    Owner,
    /// Report submitter
    Reporter,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            // Admin can do anything
            (Role::Admin, _) => true,
            // Agents can do agent things
            (Role::Agent, Role::Agent) => true,
            // Owners manage their own identity
            (Role::Owner, Role::Owner) => true,
            // Reporters can submit reports
            (Role::Reporter, Role::Reporter) => true,
            // Agents may also file reports on behalf of reporters
            (Role::Agent, Role::Reporter) => true,
            // Everything else is denied
            _ => false,
        }
    }

    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "agent" => Some(Role::Agent),
            "owner" => Some(Role::Owner),
            "reporter" => Some(Role::Reporter),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is Reporter (least privilege).
    fn default() -> Self {
        Role::Reporter
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Agent => write!(f, "agent"),
            Role::Owner => write!(f, "owner"),
            Role::Reporter => write!(f, "reporter"),
        }
    }
}
