//! Document processing pipeline
//!
//! Runs the full upload-to-anomaly sequence for one document:
//! extract text, structure it with the AI provider, persist the
//! extraction, materialize a transaction, then run anomaly detection.
//!
//! The pipeline has a single failure boundary: any error before the
//! transaction is materialized marks the document `failed` with the
//! reason. Anomaly detection is advisory and cannot fail a document.

use tracing::{error, info, warn};

use crate::ai::{retry_on_overload, AiClient, AiProvider, RetryPolicy};
use crate::anomaly::AnomalyDetector;
use crate::db::Database;
use crate::error::{ExtractionError, Result};
use crate::extract;
use crate::models::{DocumentStatus, NewTransaction, TransactionType};

pub struct DocumentProcessor {
    db: Database,
    ai: AiClient,
    policy: RetryPolicy,
}

impl DocumentProcessor {
    pub fn new(db: Database, ai: AiClient) -> Self {
        Self {
            db,
            ai,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Process one document, converting any failure into a persisted
    /// `failed` status. Safe to run on a detached task: never panics,
    /// never returns an error.
    pub async fn process(&self, document_id: i64) {
        match self.run(document_id).await {
            Ok(transaction_id) => {
                info!(document_id, transaction_id, "Document processed");
            }
            Err(e) => {
                warn!(document_id, "Document processing failed: {}", e);
                if let Err(db_err) = self.db.mark_document_failed(document_id, &e.to_string()) {
                    error!(
                        document_id,
                        "Could not record document failure: {}", db_err
                    );
                }
            }
        }
    }

    /// The fallible pipeline body. Returns the materialized transaction id.
    async fn run(&self, document_id: i64) -> Result<i64> {
        let doc = self
            .db
            .get_document(document_id)?
            .ok_or_else(|| crate::error::Error::NotFound(format!("Document {}", document_id)))?;

        self.db
            .update_document_status(document_id, DocumentStatus::Processing)?;

        let text = extract::extract_text(&doc.file_path, &doc.mime_type, &self.ai).await?;
        let text = text.trim();
        if text.chars().count() < extract::MIN_READABLE_CHARS {
            return Err(ExtractionError::Unreadable.into());
        }

        let extracted =
            retry_on_overload(&self.policy, || self.ai.extract_structured(text)).await?;

        let provider = self.ai.name().to_string();
        self.db
            .apply_extraction(document_id, &extracted, text, &provider, None)?;

        let transaction_id = self.db.create_transaction(&NewTransaction {
            owner: doc.owner.clone(),
            document_id: Some(document_id),
            merchant: extracted.merchant.clone(),
            category: extracted.category.clone(),
            tx_type: TransactionType::Expense,
            amount: extracted.amount,
            currency: extracted.currency.clone(),
            date: extracted.date,
            description: if extracted.description.is_empty() {
                None
            } else {
                Some(extracted.description.clone())
            },
            ai_confidence: None,
        })?;

        // Advisory: runs after the transaction exists, cannot undo it
        if let Some(transaction) = self.db.get_transaction(transaction_id)? {
            let detector = AnomalyDetector::new(self.db.clone(), self.ai.clone())
                .with_policy(self.policy);
            detector.detect(&transaction).await;
        }

        Ok(transaction_id)
    }
}
