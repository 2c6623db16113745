// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 RugGuard

//! Health endpoint.

use axum::{extract::State, Json};

use crate::{models::HealthResponse, state::AppState};

#[utoipa::path(
    get,
    path = "/v1/health",
    tag = "Health",
    responses((status = 200, body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage_ok = state.store.health_check().is_ok();
    Json(HealthResponse {
        status: if storage_ok { "ok" } else { "degraded" }.to_string(),
        storage_ok,
        ledger_seq: state.ledger.last_seq(),
    })
}
