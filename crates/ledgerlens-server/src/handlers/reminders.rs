//! Reminder handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use ledgerlens_core::models::{
    NewReminder, Reminder, ReminderPriority, ReminderStatus, ReminderType, ReminderUpdate,
};

use crate::{request_owner, AppError, AppState, SuccessResponse};

#[derive(Deserialize)]
pub struct ListRemindersQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub reminder_type: Option<String>,
}

/// List the caller's reminders, earliest due date first
pub async fn list_reminders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListRemindersQuery>,
) -> Result<Json<Vec<Reminder>>, AppError> {
    let owner = request_owner(&headers);

    let status = match query.status.as_deref() {
        Some(s) => Some(
            s.parse::<ReminderStatus>()
                .map_err(|e| AppError::bad_request(&e))?,
        ),
        None => None,
    };
    let reminder_type = match query.reminder_type.as_deref() {
        Some(t) => Some(
            t.parse::<ReminderType>()
                .map_err(|e| AppError::bad_request(&e))?,
        ),
        None => None,
    };

    let reminders = state.db.list_reminders(&owner, status, reminder_type)?;
    Ok(Json(reminders))
}

#[derive(Deserialize)]
pub struct CreateReminderRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: NaiveDate,
    #[serde(rename = "type", default)]
    pub reminder_type: ReminderType,
    #[serde(default)]
    pub priority: ReminderPriority,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Create a reminder in `pending` status
pub async fn create_reminder(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateReminderRequest>,
) -> Result<(StatusCode, Json<Reminder>), AppError> {
    let owner = request_owner(&headers);

    if req.title.trim().is_empty() {
        return Err(AppError::bad_request("Title is required"));
    }

    let id = state.db.create_reminder(&NewReminder {
        owner: owner.clone(),
        title: req.title.trim().to_string(),
        description: req.description.filter(|d| !d.trim().is_empty()),
        due_date: req.due_date,
        reminder_type: req.reminder_type,
        priority: req.priority,
        amount: req.amount,
    })?;

    let reminder = state
        .db
        .get_reminder_for_owner(id, &owner)?
        .ok_or_else(|| AppError::internal("Reminder vanished after creation"))?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

pub async fn get_reminder(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Reminder>, AppError> {
    let owner = request_owner(&headers);
    let reminder = state
        .db
        .get_reminder_for_owner(id, &owner)?
        .ok_or_else(|| AppError::not_found("Reminder not found"))?;
    Ok(Json(reminder))
}

#[derive(Deserialize, Default)]
pub struct UpdateReminderRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "type", default)]
    pub reminder_type: Option<ReminderType>,
    #[serde(default)]
    pub priority: Option<ReminderPriority>,
    #[serde(default)]
    pub status: Option<ReminderStatus>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Update a reminder; omitted fields keep their value
pub async fn update_reminder(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateReminderRequest>,
) -> Result<Json<Reminder>, AppError> {
    let owner = request_owner(&headers);

    let reminder = state.db.update_reminder(
        id,
        &owner,
        &ReminderUpdate {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            reminder_type: req.reminder_type,
            priority: req.priority,
            status: req.status,
            amount: req.amount,
        },
    )?;

    Ok(Json(reminder))
}

pub async fn delete_reminder(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    let owner = request_owner(&headers);
    if !state.db.delete_reminder(id, &owner)? {
        return Err(AppError::not_found("Reminder not found"));
    }
    Ok(Json(SuccessResponse { success: true }))
}
