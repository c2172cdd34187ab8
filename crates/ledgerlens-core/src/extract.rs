//! Text extraction from uploaded files
//!
//! Dispatch on MIME type: PDFs are parsed locally with pdf-extract,
//! images go to the AI provider's vision OCR. Anything else is rejected
//! before it reaches the pipeline.

use tracing::{debug, warn};

use crate::ai::{AiClient, AiProvider};
use crate::error::{ExtractionError, Result};

/// Minimum trimmed character count for extracted text to be worth
/// sending to the model
pub const MIN_READABLE_CHARS: usize = 10;

/// Whether uploads of this MIME type can be processed at all
pub fn is_supported_mime(mime_type: &str) -> bool {
    mime_type.contains("pdf") || mime_type.starts_with("image/")
}

/// Extract raw text from an uploaded file
pub async fn extract_text(path: &str, mime_type: &str, ai: &AiClient) -> Result<String> {
    if mime_type.contains("pdf") {
        let bytes = std::fs::read(path)?;
        extract_pdf_text(&bytes)
    } else if mime_type.starts_with("image/") {
        let bytes = std::fs::read(path)?;
        let text = ai.extract_text(&bytes, mime_type).await?;
        debug!(chars = text.len(), "Vision OCR complete");
        Ok(text)
    } else {
        Err(ExtractionError::UnsupportedType(mime_type.to_string()).into())
    }
}

/// Pull text out of PDF bytes. An unparseable or textless PDF is an
/// empty document as far as the pipeline is concerned.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        warn!("PDF extraction failed: {}", e);
        ExtractionError::EmptyDocument
    })?;

    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyDocument.into());
    }

    debug!(chars = text.len(), "PDF text extracted");
    Ok(text)
}
