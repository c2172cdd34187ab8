//! Run a single file through the extraction pipeline

use std::path::Path;

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};

use ledgerlens_core::ai::AiClient;
use ledgerlens_core::models::{DocumentStatus, NewDocument};
use ledgerlens_core::DocumentProcessor;

use super::open_db;

/// Guess a MIME type from the file extension
pub(crate) fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

pub async fn cmd_process(
    db: Option<&Path>,
    file: &Path,
    mime: Option<&str>,
    owner: &str,
) -> Result<()> {
    let Some(ai) = AiClient::from_env() else {
        bail!("No AI provider configured. Set GEMINI_API_KEY or OPENAI_API_KEY.");
    };

    let mime_type = match mime {
        Some(m) => m.to_string(),
        None => guess_mime(file)
            .with_context(|| format!("Cannot guess MIME type for {}", file.display()))?
            .to_string(),
    };

    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let content_hash = hex::encode(hasher.finalize());

    let database = open_db(db)?;

    if let Some(existing) = database.find_document_by_hash(owner, &content_hash)? {
        bail!(
            "This file was already processed as document {} ({})",
            existing.id,
            existing.status
        );
    }

    let original_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();

    println!("📄 Processing {} ({})...", original_name, mime_type);

    let id = database.create_document(&NewDocument {
        owner: owner.to_string(),
        original_name,
        file_path: file.to_string_lossy().to_string(),
        mime_type,
        size_bytes: bytes.len() as i64,
        content_hash,
    })?;

    DocumentProcessor::new(database.clone(), ai).process(id).await;

    let doc = database
        .get_document(id)?
        .context("Document disappeared during processing")?;

    match doc.status {
        DocumentStatus::Processed => {
            println!("✅ Extraction complete");
            println!(
                "   Merchant: {}",
                doc.merchant.as_deref().unwrap_or("Unknown")
            );
            println!(
                "   Amount: {:.2} {}",
                doc.amount.unwrap_or(0.0),
                doc.currency.as_deref().unwrap_or("USD")
            );
            println!("   Category: {}", doc.category.as_deref().unwrap_or("Other"));
            if let Some(date) = doc.transaction_date {
                println!("   Date: {}", date);
            }

            if let Some(tx) = database.get_transaction_for_document(id)? {
                println!("   Transaction: #{}", tx.id);
                let anomalies = database.list_anomalies(owner, None, None)?;
                if let Some(anomaly) = anomalies.iter().find(|a| a.transaction_id == tx.id) {
                    println!();
                    println!(
                        "⚠️  Anomaly flagged ({}): {}",
                        anomaly.severity, anomaly.description
                    );
                }
            }
        }
        _ => {
            bail!(
                "Processing failed: {}",
                doc.error_message.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}
