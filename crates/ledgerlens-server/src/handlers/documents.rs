//! Document upload and lifecycle handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    Json,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use ledgerlens_core::extract::is_supported_mime;
use ledgerlens_core::models::{Document, DocumentStatus, NewDocument};
use ledgerlens_core::DocumentProcessor;

use crate::{request_owner, AppError, AppState, SuccessResponse, MAX_UPLOAD_SIZE};

/// Header carrying the original filename for raw-body uploads
const FILE_NAME_HEADER: &str = "x-file-name";

/// Keep stored filenames boring: alphanumerics plus . - _
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload.bin".to_string()
    } else {
        cleaned
    }
}

/// Upload a receipt or invoice as a raw request body
///
/// Returns 202 with the pending document; extraction runs on a
/// background task and the client polls `GET /documents/:id`.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let owner = request_owner(request.headers());

    let mime_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .split(';')
        .next()
        .unwrap_or("application/octet-stream")
        .trim()
        .to_string();

    let original_name = request
        .headers()
        .get(FILE_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(sanitize_filename)
        .unwrap_or_else(|| "upload.bin".to_string());

    if !is_supported_mime(&mime_type) {
        return Err(AppError::bad_request(
            "Only PDF and image uploads are supported",
        ));
    }

    let body = axum::body::to_bytes(request.into_body(), MAX_UPLOAD_SIZE)
        .await
        .map_err(|_| AppError::payload_too_large("Upload exceeds the 10 MB limit"))?;

    if body.is_empty() {
        return Err(AppError::bad_request("Empty upload"));
    }

    // Duplicate detection by content hash, scoped to the owner
    let mut hasher = Sha256::new();
    hasher.update(&body);
    let content_hash = hex::encode(hasher.finalize());

    if let Some(existing) = state.db.find_document_by_hash(&owner, &content_hash)? {
        return Err(AppError::conflict(&format!(
            "This file was already uploaded as document {}",
            existing.id
        )));
    }

    // Persist the file under a timestamped name
    std::fs::create_dir_all(&state.uploads_dir)?;
    let stored_name = format!(
        "{}_{}",
        chrono::Utc::now().format("%Y%m%d_%H%M%S%f"),
        original_name
    );
    let file_path = state.uploads_dir.join(&stored_name);
    std::fs::write(&file_path, &body)?;

    let id = state.db.create_document(&NewDocument {
        owner: owner.clone(),
        original_name,
        file_path: file_path.to_string_lossy().to_string(),
        mime_type,
        size_bytes: body.len() as i64,
        content_hash,
    })?;

    info!(document_id = id, owner = %owner, "Document uploaded");

    match &state.ai {
        Some(ai) => {
            let processor = DocumentProcessor::new(state.db.clone(), ai.clone());
            tokio::spawn(async move {
                processor.process(id).await;
            });
        }
        None => {
            // No provider: the document can never be processed, say so now
            state
                .db
                .mark_document_failed(id, "AI provider not configured")?;
        }
    }

    let doc = state
        .db
        .get_document(id)?
        .ok_or_else(|| AppError::internal("Document vanished after creation"))?;

    Ok((StatusCode::ACCEPTED, Json(doc)))
}

#[derive(Deserialize)]
pub struct ListDocumentsQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

/// List the caller's documents, newest first
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    let owner = request_owner(&headers);

    let status = match query.status.as_deref() {
        Some(s) => Some(
            s.parse::<DocumentStatus>()
                .map_err(|e| AppError::bad_request(&e))?,
        ),
        None => None,
    };

    let docs = state
        .db
        .list_documents(&owner, status, query.search.as_deref())?;
    Ok(Json(docs))
}

/// Get one document (the client polls this while processing runs)
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Document>, AppError> {
    let owner = request_owner(&headers);
    let doc = state
        .db
        .get_document_for_owner(id, &owner)?
        .ok_or_else(|| AppError::not_found("Document not found"))?;
    Ok(Json(doc))
}

/// Delete a document, its stored file, and everything materialized
/// from it
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    let owner = request_owner(&headers);
    let doc = state
        .db
        .get_document_for_owner(id, &owner)?
        .ok_or_else(|| AppError::not_found("Document not found"))?;

    if !state.db.delete_document(id, &owner)? {
        return Err(AppError::not_found("Document not found"));
    }

    // Only unlink files that actually live in our uploads directory
    let path = std::path::Path::new(&doc.file_path);
    let inside_uploads = match (path.canonicalize(), state.uploads_dir.canonicalize()) {
        (Ok(file), Ok(dir)) => file.starts_with(&dir),
        _ => false,
    };
    if inside_uploads {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(document_id = id, "Could not remove stored file: {}", e);
        }
    }

    Ok(Json(SuccessResponse { success: true }))
}
