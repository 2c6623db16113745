// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Report intake and investigation lifecycle endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    investigation::{Investigation, InvestigationStatus, Report, TransitionParams},
    models::{
        CreateInvestigationRequest, CreateReportRequest, SendPackageRequest, SendPackageResponse,
        TransitionRequest,
    },
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/reports",
    request_body = CreateReportRequest,
    tag = "Investigations",
    responses(
        (status = 201, body = Report),
        (status = 400, description = "Missing project name or description")
    )
)]
pub async fn create_report(
    State(state): State<AppState>,
    Auth(actor): Auth,
    Json(request): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let report = state.engine.create_report(
        &request.project_name,
        request.rug_id,
        &request.description,
        request.evidence_links,
        &request.reporter_contact,
        &actor,
    )?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[utoipa::path(
    post,
    path = "/v1/investigations",
    request_body = CreateInvestigationRequest,
    tag = "Investigations",
    responses(
        (status = 201, body = Investigation),
        (status = 404, description = "Unknown report"),
        (status = 409, description = "Report already backs an investigation")
    )
)]
pub async fn create_investigation(
    State(state): State<AppState>,
    Auth(actor): Auth,
    Json(request): Json<CreateInvestigationRequest>,
) -> Result<(StatusCode, Json<Investigation>), ApiError> {
    let investigation = state
        .engine
        .create_investigation(&request.report_ref, request.linked_rug_id.as_deref(), &actor)?;
    Ok((StatusCode::CREATED, Json(investigation)))
}

#[utoipa::path(
    get,
    path = "/v1/investigations/{investigation_id}",
    params(("investigation_id" = String, Path, description = "Case identifier")),
    tag = "Investigations",
    responses(
        (status = 200, body = Investigation),
        (status = 404, description = "Unknown investigation")
    )
)]
pub async fn get_investigation(
    State(state): State<AppState>,
    Auth(_actor): Auth,
    Path(investigation_id): Path<String>,
) -> Result<Json<Investigation>, ApiError> {
    Ok(Json(state.engine.get(&investigation_id)?))
}

#[utoipa::path(
    post,
    path = "/v1/investigations/{investigation_id}/transition",
    params(("investigation_id" = String, Path, description = "Case identifier")),
    request_body = TransitionRequest,
    tag = "Investigations",
    responses(
        (status = 200, body = Investigation),
        (status = 409, description = "Transition not allowed from the current state"),
        (status = 403, description = "Role or two-person-rule violation")
    )
)]
pub async fn transition(
    State(state): State<AppState>,
    Auth(actor): Auth,
    Path(investigation_id): Path<String>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Investigation>, ApiError> {
    let target = InvestigationStatus::parse(&request.target).ok_or_else(|| {
        ApiError::bad_request(format!("unknown target state: {}", request.target))
    })?;
    let params = TransitionParams {
        assignee: request.assignee,
        notes: request.notes,
    };
    let investigation = state
        .engine
        .transition(&investigation_id, target, &params, &actor)?;
    Ok(Json(investigation))
}

#[utoipa::path(
    post,
    path = "/v1/investigations/{investigation_id}/package",
    params(("investigation_id" = String, Path, description = "Case identifier")),
    request_body = SendPackageRequest,
    tag = "Investigations",
    responses(
        (status = 200, body = SendPackageResponse),
        (status = 409, description = "Case is not approved"),
        (status = 502, description = "Authority endpoint failed"),
        (status = 504, description = "Delivery exceeded the send deadline")
    )
)]
pub async fn send_package(
    State(state): State<AppState>,
    AdminOnly(actor): AdminOnly,
    Path(investigation_id): Path<String>,
    Json(request): Json<SendPackageRequest>,
) -> Result<Json<SendPackageResponse>, ApiError> {
    let package_digest = state
        .engine
        .send_package(&investigation_id, &request.destination, &actor)
        .await?;
    Ok(Json(SendPackageResponse {
        investigation_id,
        package_digest,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Actor, Role};
    use crate::state::testing;

    fn reporter() -> Actor {
        Actor::new("reporter-1", Role::Reporter)
    }

    fn agent() -> Actor {
        Actor::new("agent-1", Role::Agent)
    }

    #[tokio::test]
    async fn report_and_investigation_intake() {
        let (_temp, state) = testing::state();

        let (status, Json(report)) = create_report(
            State(state.clone()),
            Auth(reporter()),
            Json(CreateReportRequest {
                project_name: "SafeMoonX".to_string(),
                rug_id: None,
                description: "liquidity pulled overnight".to_string(),
                evidence_links: vec!["https://evidence.example/tx1".to_string()],
                reporter_contact: "reporter@example.com".to_string(),
            }),
        )
        .await
        .expect("report intake succeeds");
        assert_eq!(status, StatusCode::CREATED);

        let (status, Json(investigation)) = create_investigation(
            State(state),
            Auth(agent()),
            Json(CreateInvestigationRequest {
                report_ref: report.report_id.clone(),
                linked_rug_id: None,
            }),
        )
        .await
        .expect("investigation opens");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(investigation.status, InvestigationStatus::Reported);
        assert_eq!(investigation.report_ref, report.report_id);
    }

    #[tokio::test]
    async fn unknown_target_state_is_bad_request() {
        let (_temp, state) = testing::state();
        let error = transition(
            State(state),
            Auth(agent()),
            Path("case-1".to_string()),
            Json(TransitionRequest {
                target: "escalated".to_string(),
                assignee: None,
                notes: None,
            }),
        )
        .await
        .expect_err("unknown state");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transition_conflict_maps_to_409() {
        let (_temp, state) = testing::state();
        let report = state
            .engine
            .create_report("X", None, "desc", vec![], "r@example.com", &reporter())
            .unwrap();
        let case = state
            .engine
            .create_investigation(&report.report_id, None, &agent())
            .unwrap();

        let error = transition(
            State(state),
            Auth(Actor::new("admin-1", Role::Admin)),
            Path(case.investigation_id),
            Json(TransitionRequest {
                target: "approved".to_string(),
                assignee: None,
                notes: None,
            }),
        )
        .await
        .expect_err("cannot approve from reported");
        assert_eq!(error.status, StatusCode::CONFLICT);
    }
}
