// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Identity vault endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    models::{
        ArmSwitchRequest, DisclosureRequest, DisclosureResponse, RenewSwitchRequest,
        SetStatusRequest, SubmitIdentityRequest,
    },
    state::AppState,
    vault::IdentityRecordResponse,
};

#[utoipa::path(
    post,
    path = "/v1/identity",
    request_body = SubmitIdentityRequest,
    tag = "Identity",
    responses(
        (status = 201, body = IdentityRecordResponse),
        (status = 400, description = "Empty or malformed payload")
    )
)]
pub async fn submit_identity(
    State(state): State<AppState>,
    Auth(actor): Auth,
    Json(request): Json<SubmitIdentityRequest>,
) -> Result<(StatusCode, Json<IdentityRecordResponse>), ApiError> {
    let record = state.vault.submit(&request.payload, &actor)?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/v1/identity/{record_id}",
    params(("record_id" = String, Path, description = "Vault record identifier")),
    tag = "Identity",
    responses(
        (status = 200, body = IdentityRecordResponse),
        (status = 404, description = "Unknown record")
    )
)]
pub async fn get_identity(
    State(state): State<AppState>,
    Auth(_actor): Auth,
    Path(record_id): Path<String>,
) -> Result<Json<IdentityRecordResponse>, ApiError> {
    let record = state.vault.get(&record_id)?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/v1/identity/{record_id}/status",
    params(("record_id" = String, Path, description = "Vault record identifier")),
    request_body = SetStatusRequest,
    tag = "Identity",
    responses(
        (status = 200, body = IdentityRecordResponse),
        (status = 409, description = "Record is not pending verification")
    )
)]
pub async fn set_identity_status(
    State(state): State<AppState>,
    AdminOnly(actor): AdminOnly,
    Path(record_id): Path<String>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<IdentityRecordResponse>, ApiError> {
    let record = state
        .vault
        .set_verification_status(&record_id, request.decision, &actor)?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/v1/identity/{record_id}/switch",
    params(("record_id" = String, Path, description = "Vault record identifier")),
    request_body = ArmSwitchRequest,
    tag = "Identity",
    responses(
        (status = 200, body = IdentityRecordResponse),
        (status = 400, description = "Deadline is not in the future")
    )
)]
pub async fn arm_switch(
    State(state): State<AppState>,
    Auth(actor): Auth,
    Path(record_id): Path<String>,
    Json(request): Json<ArmSwitchRequest>,
) -> Result<Json<IdentityRecordResponse>, ApiError> {
    let record = state
        .vault
        .arm_dead_man_switch(&record_id, request.deadline, &actor)?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    put,
    path = "/v1/identity/{record_id}/switch",
    params(("record_id" = String, Path, description = "Vault record identifier")),
    request_body = RenewSwitchRequest,
    tag = "Identity",
    responses(
        (status = 200, body = IdentityRecordResponse),
        (status = 409, description = "Deadline already passed; switch triggered")
    )
)]
pub async fn renew_switch(
    State(state): State<AppState>,
    Auth(actor): Auth,
    Path(record_id): Path<String>,
    Json(request): Json<RenewSwitchRequest>,
) -> Result<Json<IdentityRecordResponse>, ApiError> {
    let record = state
        .vault
        .renew_dead_man_switch(&record_id, request.deadline, &actor)?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/v1/identity/{record_id}/disclose",
    params(("record_id" = String, Path, description = "Vault record identifier")),
    request_body = DisclosureRequest,
    tag = "Identity",
    responses(
        (status = 200, body = DisclosureResponse),
        (status = 403, description = "Disclosure policy denied the request")
    )
)]
pub async fn request_disclosure(
    State(state): State<AppState>,
    AdminOnly(actor): AdminOnly,
    Path(record_id): Path<String>,
    Json(request): Json<DisclosureRequest>,
) -> Result<Json<DisclosureResponse>, ApiError> {
    let disclosed = state
        .vault
        .request_disclosure(&record_id, &actor, &request.justification)?;
    Ok(Json(DisclosureResponse {
        record_id: disclosed.record_id,
        rug_id: disclosed.rug_id,
        payload: disclosed.payload,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Actor, Role};
    use crate::state::testing;
    use crate::vault::{VaultStatus, VerificationDecision};

    fn owner() -> Actor {
        Actor::new("owner-1", Role::Owner)
    }

    fn admin() -> Actor {
        Actor::new("admin-1", Role::Admin)
    }

    #[tokio::test]
    async fn submit_returns_created_without_payload_echo() {
        let (_temp, state) = testing::state();
        let request = SubmitIdentityRequest {
            payload: serde_json::json!({"legal_name": "Jane Doe"}),
        };

        let (status, Json(response)) =
            submit_identity(State(state), Auth(owner()), Json(request))
                .await
                .expect("submission succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.status, VaultStatus::PendingVerification);

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("Jane Doe"));
    }

    #[tokio::test]
    async fn status_decision_flows_through() {
        let (_temp, state) = testing::state();
        let record = state
            .vault
            .submit(&serde_json::json!({"legal_name": "Jane Doe"}), &owner())
            .unwrap();

        let Json(response) = set_identity_status(
            State(state),
            AdminOnly(admin()),
            Path(record.record_id),
            Json(SetStatusRequest {
                decision: VerificationDecision::Verified,
            }),
        )
        .await
        .expect("decision succeeds");

        assert_eq!(response.status, VaultStatus::Verified);
    }

    #[tokio::test]
    async fn disclosure_denied_maps_to_forbidden() {
        let (_temp, state) = testing::state();
        let record = state
            .vault
            .submit(&serde_json::json!({"legal_name": "Jane Doe"}), &owner())
            .unwrap();
        state
            .vault
            .set_verification_status(&record.record_id, VerificationDecision::Verified, &admin())
            .unwrap();

        let error = request_disclosure(
            State(state),
            AdminOnly(admin()),
            Path(record.record_id),
            Json(DisclosureRequest {
                justification: "curiosity".to_string(),
            }),
        )
        .await
        .expect_err("no grounds for disclosure");

        assert_eq!(error.status, StatusCode::FORBIDDEN);
    }
}
