//! Analytics and insights handlers
//!
//! All analytics are computed on demand from the transactions table.
//! Nothing here is cached or precomputed.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use ledgerlens_core::insights;
use ledgerlens_core::models::{AdminDashboard, AnalyticsSummary};

use crate::{request_owner, AppError, AppState};

/// Full analytics bundle for the caller
pub async fn get_analytics_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let owner = request_owner(&headers);
    let summary = state.db.analytics_summary(&owner)?;
    Ok(Json(summary))
}

#[derive(Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<String>,
}

/// AI-generated spending advice. Degrades to an empty list when no
/// provider is configured or the model fails.
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<InsightsResponse>, AppError> {
    let owner = request_owner(&headers);

    let insights = match &state.ai {
        Some(ai) => insights::generate_insights(&state.db, ai, &state.retry, &owner).await,
        None => Vec::new(),
    };

    Ok(Json(InsightsResponse { insights }))
}

/// Cross-owner operational stats
pub async fn get_admin_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdminDashboard>, AppError> {
    let dashboard = state.db.admin_dashboard()?;
    Ok(Json(dashboard))
}
