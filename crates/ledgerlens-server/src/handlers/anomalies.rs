//! Anomaly review handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use ledgerlens_core::models::{Anomaly, AnomalySeverity, AnomalyStatus};

use crate::{request_owner, AppError, AppState, SuccessResponse};

#[derive(Deserialize)]
pub struct ListAnomaliesQuery {
    pub status: Option<String>,
    pub severity: Option<String>,
}

/// List the caller's anomalies, newest first, with optional status and
/// severity filters
pub async fn list_anomalies(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListAnomaliesQuery>,
) -> Result<Json<Vec<Anomaly>>, AppError> {
    let owner = request_owner(&headers);

    let status = match query.status.as_deref() {
        Some(s) => Some(
            s.parse::<AnomalyStatus>()
                .map_err(|e| AppError::bad_request(&e))?,
        ),
        None => None,
    };
    let severity = match query.severity.as_deref() {
        Some(s) => Some(
            s.parse::<AnomalySeverity>()
                .map_err(|e| AppError::bad_request(&e))?,
        ),
        None => None,
    };

    let anomalies = state.db.list_anomalies(&owner, status, severity)?;
    Ok(Json(anomalies))
}

pub async fn get_anomaly(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Anomaly>, AppError> {
    let owner = request_owner(&headers);
    let anomaly = state
        .db
        .get_anomaly_for_owner(id, &owner)?
        .ok_or_else(|| AppError::not_found("Anomaly not found"))?;
    Ok(Json(anomaly))
}

#[derive(Deserialize)]
pub struct UpdateAnomalyStatusRequest {
    pub status: String,
}

/// Move an anomaly through the review workflow. Only `new` anomalies
/// can move, and only to a reviewed state.
pub async fn update_anomaly_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAnomalyStatusRequest>,
) -> Result<Json<Anomaly>, AppError> {
    let owner = request_owner(&headers);

    let next = req
        .status
        .parse::<AnomalyStatus>()
        .map_err(|e| AppError::bad_request(&e))?;

    let anomaly = state.db.update_anomaly_status(id, &owner, next)?;
    Ok(Json(anomaly))
}

pub async fn delete_anomaly(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    let owner = request_owner(&headers);
    if !state.db.delete_anomaly(id, &owner)? {
        return Err(AppError::not_found("Anomaly not found"));
    }
    Ok(Json(SuccessResponse { success: true }))
}
