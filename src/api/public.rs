// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Unauthenticated public status endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::ApiError, projector::PublicStatus, state::AppState};

#[utoipa::path(
    get,
    path = "/v1/public/status/{rug_id}",
    params(("rug_id" = String, Path, description = "Public RugID")),
    tag = "Public",
    responses(
        (status = 200, body = PublicStatus),
        (status = 404, description = "Unknown RugID")
    )
)]
pub async fn public_status(
    State(state): State<AppState>,
    Path(rug_id): Path<String>,
) -> Result<Json<PublicStatus>, ApiError> {
    Ok(Json(state.projector.project(&rug_id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Actor, Role};
    use crate::projector::PublicLabel;
    use crate::state::testing;
    use crate::vault::VerificationDecision;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn unknown_id_is_404() {
        let (_temp, state) = testing::state();
        let error = public_status(State(state), Path("RID-AB12CD34EF56".to_string()))
            .await
            .expect_err("unknown id");
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn verified_id_projects_verified() {
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
        let rug_id = state.generator.issue(&record.record_id, &admin).unwrap();

        let Json(status) = public_status(State(state), Path(rug_id.as_str().to_string()))
            .await
            .expect("projection succeeds");
        assert_eq!(status.status, PublicLabel::Verified);
    }
}
