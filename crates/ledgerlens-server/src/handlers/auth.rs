//! Identity and health handlers

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use ledgerlens_core::ai::AiProvider;

use crate::{request_owner, AppError, AppState};

#[derive(Serialize)]
pub struct MeResponse {
    pub owner: String,
}

/// Who the server thinks the caller is
pub async fn get_me(headers: HeaderMap) -> Json<MeResponse> {
    Json(MeResponse {
        owner: request_owner(&headers),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    /// None when no AI provider is configured
    pub ai: Option<bool>,
}

/// Liveness: database reachable, AI provider responding (if configured)
pub async fn get_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, AppError> {
    let database = state.db.conn().is_ok();

    let ai = match &state.ai {
        Some(client) => Some(client.health_check().await),
        None => None,
    };

    Ok(Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
        ai,
    }))
}
