//! Error types for LedgerLens

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("AI provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("AI provider not configured")]
    ProviderUnavailable,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Failures raised while turning an uploaded document into usable text
/// or a structured transaction. These are terminal for a document: the
/// pipeline records them as the document's failure reason.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("No text could be extracted from the document")]
    EmptyDocument,

    #[error("No readable text found in the document")]
    Unreadable,

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("No structured data found in AI response: {0}")]
    NoStructuredData(String),
}

impl Error {
    /// Whether this failure is a transient provider overload that is
    /// worth retrying (HTTP 503 or an explicit overload message).
    pub fn is_overloaded(&self) -> bool {
        match self {
            Error::Provider { status, message } => {
                *status == 503
                    || *status == 529
                    || message.to_lowercase().contains("overloaded")
                    || message.to_lowercase().contains("unavailable")
            }
            Error::Http(e) => e.status().map(|s| s.as_u16() == 503).unwrap_or(false),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
