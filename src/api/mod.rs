// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Role,
    investigation::{Investigation, InvestigationStatus, Report},
    ledger::{AuditAction, AuditEntry},
    models::{
        ArmSwitchRequest, AuditVerifyResponse, CreateInvestigationRequest, CreateReportRequest,
        DisclosureRequest, DisclosureResponse, HealthResponse, IssueRugIdResponse,
        RenewSwitchRequest, SendPackageRequest, SendPackageResponse, SetStatusRequest,
        SubmitIdentityRequest, TransitionRequest,
    },
    projector::{PublicLabel, PublicStatus},
    state::AppState,
    vault::{IdentityRecordResponse, VaultStatus, VerificationDecision},
};

pub mod audit;
pub mod health;
pub mod identity;
pub mod investigations;
pub mod public;
pub mod rugid;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/identity", post(identity::submit_identity))
        .route("/identity/{record_id}", get(identity::get_identity))
        .route(
            "/identity/{record_id}/status",
            post(identity::set_identity_status),
        )
        .route(
            "/identity/{record_id}/switch",
            post(identity::arm_switch).put(identity::renew_switch),
        )
        .route(
            "/identity/{record_id}/disclose",
            post(identity::request_disclosure),
        )
        .route("/identity/{record_id}/rugid", post(rugid::issue_rugid))
        .route("/public/status/{rug_id}", get(public::public_status))
        .route("/reports", post(investigations::create_report))
        .route("/investigations", post(investigations::create_investigation))
        .route(
            "/investigations/{investigation_id}",
            get(investigations::get_investigation),
        )
        .route(
            "/investigations/{investigation_id}/transition",
            post(investigations::transition),
        )
        .route(
            "/investigations/{investigation_id}/package",
            post(investigations::send_package),
        )
        .route("/audit/verify", get(audit::verify_chain))
        .route("/health", get(health::health))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        identity::submit_identity,
        identity::get_identity,
        identity::set_identity_status,
        identity::arm_switch,
        identity::renew_switch,
        identity::request_disclosure,
        rugid::issue_rugid,
        public::public_status,
        investigations::create_report,
        investigations::create_investigation,
        investigations::get_investigation,
        investigations::transition,
        investigations::send_package,
        audit::verify_chain,
        health::health
    ),
    components(
        schemas(
            SubmitIdentityRequest,
            SetStatusRequest,
            ArmSwitchRequest,
            RenewSwitchRequest,
            DisclosureRequest,
            DisclosureResponse,
            IssueRugIdResponse,
            CreateReportRequest,
            CreateInvestigationRequest,
            TransitionRequest,
            SendPackageRequest,
            SendPackageResponse,
            AuditVerifyResponse,
            HealthResponse,
            IdentityRecordResponse,
            VaultStatus,
            VerificationDecision,
            Investigation,
            InvestigationStatus,
            Report,
            PublicStatus,
            PublicLabel,
            AuditAction,
            AuditEntry,
            Role
        )
    ),
    tags(
        (name = "Identity", description = "Identity vault submission, verification, and disclosure"),
        (name = "RugID", description = "Pseudonym issuance"),
        (name = "Public", description = "Unauthenticated public status"),
        (name = "Investigations", description = "Report intake and case lifecycle"),
        (name = "Audit", description = "Hash-chain verification"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;
