// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! RugID issuance endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{auth::AdminOnly, error::ApiError, models::IssueRugIdResponse, state::AppState};

#[utoipa::path(
    post,
    path = "/v1/identity/{record_id}/rugid",
    params(("record_id" = String, Path, description = "Vault record identifier")),
    tag = "RugID",
    responses(
        (status = 201, body = IssueRugIdResponse),
        (status = 403, description = "Record is not verified"),
        (status = 400, description = "Record already has a RugID")
    )
)]
pub async fn issue_rugid(
    State(state): State<AppState>,
    AdminOnly(actor): AdminOnly,
    Path(record_id): Path<String>,
) -> Result<(StatusCode, Json<IssueRugIdResponse>), ApiError> {
    let rug_id = state.generator.issue(&record_id, &actor)?;
    Ok((
        StatusCode::CREATED,
        Json(IssueRugIdResponse {
            rug_id: rug_id.as_str().to_string(),
            record_id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Actor, Role};
    use crate::rugid::RugId;
    use crate::state::testing;
    use crate::vault::VerificationDecision;

    #[tokio::test]
    async fn issue_returns_well_formed_id() {
        let (_temp, state) = testing::state();
        let admin = Actor::new("admin-1", Role::Admin);
        let record = state
            .vault
            .submit(&serde_json::json!({"legal_name": "Jane Doe"}), &admin)
            .unwrap();
        state
            .vault
            .set_verification_status(&record.record_id, VerificationDecision::Verified, &admin)
            .unwrap();

        let (status, Json(response)) = issue_rugid(
            State(state),
            AdminOnly(admin),
            Path(record.record_id.clone()),
        )
        .await
        .expect("issuance succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.record_id, record.record_id);
        assert!(RugId::parse(&response.rug_id).is_ok());
    }

    #[tokio::test]
    async fn unverified_record_is_refused() {
        let (_temp, state) = testing::state();
        let admin = Actor::new("admin-1", Role::Admin);
        let record = state
            .vault
            .submit(&serde_json::json!({"legal_name": "Jane Doe"}), &admin)
            .unwrap();

        let error = issue_rugid(State(state), AdminOnly(admin), Path(record.record_id))
            .await
            .expect_err("unverified record");
        assert_eq!(error.status, StatusCode::FORBIDDEN);
    }
}
