// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Actor identity errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Actor identity error type.
#[derive(Debug)]
pub enum AuthError {
    /// Actor identity headers are missing
    MissingActorIdentity,
    /// Actor identity headers are malformed
    InvalidActorIdentity,
    /// Role header does not name a known role
    UnknownRole,
    /// Insufficient permissions
    InsufficientPermissions,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingActorIdentity => "missing_actor_identity",
            AuthError::InvalidActorIdentity => "invalid_actor_identity",
            AuthError::UnknownRole => "unknown_role",
            AuthError::InsufficientPermissions => "insufficient_permissions",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingActorIdentity
            | AuthError::InvalidActorIdentity
            | AuthError::UnknownRole => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingActorIdentity => {
                write!(f, "Actor identity headers are required")
            }
            AuthError::InvalidActorIdentity => {
                write!(f, "Actor identity headers are malformed")
            }
            AuthError::UnknownRole => write!(f, "Unknown actor role"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
