// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Core error taxonomy and its HTTP representation.
//!
//! `CoreError` is returned by the vault, generator, engine, and ledger.
//! The API layer converts it into `ApiError` responses; the core never
//! retries a denied disclosure or a failed audit append on its own.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::StorageError;

/// Errors produced by the core components.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed input; the caller corrects and retries.
    #[error("validation error: {0}")]
    Validation(String),

    /// Entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// State machine misuse; never silently coerced.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Disclosure policy violation.
    #[error("vault access denied: {0}")]
    VaultAccessDenied(String),

    /// Actor's role does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Two-person rule violation on final verification.
    #[error("self-approval not allowed: the verifying agent cannot advance their own verification")]
    SelfApprovalNotAllowed,

    /// Dead-man's-switch deadline already passed; renewal refused.
    #[error("switch already triggered: deadline has passed")]
    SwitchAlreadyTriggered,

    /// RugID derivation exhausted its nonce budget. Fatal configuration
    /// issue (salt rotation required), not a caller retry.
    #[error("id generation exhausted after {attempts} attempts")]
    IdGenerationExhausted { attempts: u32 },

    /// The audit ledger could not record the action. The triggering
    /// operation must be aborted, never committed un-logged.
    #[error("audit write failed: {0}")]
    AuditWriteFailed(String),

    /// Disclosure or external send exceeded its deadline; nothing was
    /// committed.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// The external authority rejected or failed the package delivery.
    #[error("package delivery failed: {0}")]
    PackageDelivery(String),

    /// Envelope seal or open failure (corrupt field or key mismatch).
    #[error("envelope error: {0}")]
    Envelope(#[from] crate::vault::envelope::EnvelopeError),

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let status = match &e {
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::InvalidTransition(_) => StatusCode::CONFLICT,
            CoreError::VaultAccessDenied(_) => StatusCode::FORBIDDEN,
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoreError::SelfApprovalNotAllowed => StatusCode::FORBIDDEN,
            CoreError::SwitchAlreadyTriggered => StatusCode::CONFLICT,
            CoreError::IdGenerationExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::AuditWriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CoreError::PackageDelivery(_) => StatusCode::BAD_GATEWAY,
            CoreError::Envelope(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
