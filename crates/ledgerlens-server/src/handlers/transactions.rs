//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use ledgerlens_core::models::{
    NewTransaction, Transaction, TransactionSummary, TransactionType, TransactionUpdate,
};

use crate::{request_owner, AppError, AppState, SuccessResponse};

#[derive(Deserialize)]
pub struct ListTransactionsQuery {
    pub limit: Option<u32>,
}

/// List the caller's transactions, most recent date first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let owner = request_owner(&headers);
    let txs = state.db.list_transactions(&owner, query.limit)?;
    Ok(Json(txs))
}

#[derive(Deserialize)]
pub struct CreateTransactionRequest {
    pub merchant: String,
    pub category: String,
    #[serde(rename = "type", default)]
    pub tx_type: TransactionType,
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

/// Record a transaction by hand (no source document)
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let owner = request_owner(&headers);

    if req.merchant.trim().is_empty() {
        return Err(AppError::bad_request("Merchant is required"));
    }
    if req.category.trim().is_empty() {
        return Err(AppError::bad_request("Category is required"));
    }

    let id = state.db.create_transaction(&NewTransaction {
        owner,
        document_id: None,
        merchant: req.merchant.trim().to_string(),
        category: req.category.trim().to_string(),
        tx_type: req.tx_type,
        amount: req.amount,
        currency: req.currency.unwrap_or_else(|| "USD".to_string()),
        date: req.date,
        description: req.description.filter(|d| !d.trim().is_empty()),
        ai_confidence: None,
    })?;

    let tx = state
        .db
        .get_transaction(id)?
        .ok_or_else(|| AppError::internal("Transaction vanished after creation"))?;

    Ok((StatusCode::CREATED, Json(tx)))
}

#[derive(Deserialize)]
pub struct TransactionSummaryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Income/expense totals with a category breakdown, optionally bounded
/// to a date window
pub async fn get_transaction_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TransactionSummaryQuery>,
) -> Result<Json<TransactionSummary>, AppError> {
    let owner = request_owner(&headers);
    let summary = state
        .db
        .transaction_summary(&owner, query.start_date, query.end_date)?;
    Ok(Json(summary))
}

pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>, AppError> {
    let owner = request_owner(&headers);
    let tx = state
        .db
        .get_transaction_for_owner(id, &owner)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    Ok(Json(tx))
}

#[derive(Deserialize, Default)]
pub struct UpdateTransactionRequest {
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(rename = "type", default)]
    pub tx_type: Option<TransactionType>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Update a transaction; omitted fields keep their value
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTransactionRequest>,
) -> Result<Json<Transaction>, AppError> {
    let owner = request_owner(&headers);

    let tx = state.db.update_transaction(
        id,
        &owner,
        &TransactionUpdate {
            merchant: req.merchant,
            category: req.category,
            tx_type: req.tx_type,
            amount: req.amount,
            currency: req.currency,
            date: req.date,
            description: req.description,
        },
    )?;

    Ok(Json(tx))
}

/// Delete a transaction (and any anomaly flagged on it, via cascade)
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    let owner = request_owner(&headers);
    if !state.db.delete_transaction(id, &owner)? {
        return Err(AppError::not_found("Transaction not found"));
    }
    Ok(Json(SuccessResponse { success: true }))
}
