//! AI-backed anomaly detection
//!
//! Detection is advisory: it runs after a transaction is materialized
//! and any failure here is logged and swallowed. A transaction never
//! fails to exist because the anomaly check did.

use tracing::{debug, warn};

use crate::ai::{
    retry_on_overload, AiClient, AiProvider, AnomalyContext, RetryPolicy,
};
use crate::db::Database;
use crate::error::Result;
use crate::models::{Anomaly, AnomalyCategory, AnomalySeverity, NewAnomaly, Transaction};

/// How many historical transactions inform the spending baseline
pub const HISTORY_WINDOW: u32 = 100;

pub struct AnomalyDetector {
    db: Database,
    ai: AiClient,
    policy: RetryPolicy,
}

impl AnomalyDetector {
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

    /// Assess one transaction against the owner's history. Returns the
    /// created anomaly, or None when the transaction looks normal or
    /// the assessment could not be obtained.
    pub async fn detect(&self, transaction: &Transaction) -> Option<Anomaly> {
        match self.try_detect(transaction).await {
            Ok(anomaly) => anomaly,
            Err(e) => {
                warn!(
                    transaction_id = transaction.id,
                    "Anomaly detection skipped: {}", e
                );
                None
            }
        }
    }

    async fn try_detect(&self, transaction: &Transaction) -> Result<Option<Anomaly>> {
        let history = self.db.recent_transactions(
            &transaction.owner,
            HISTORY_WINDOW,
            Some(transaction.id),
        )?;

        let ctx = build_context(transaction, &history);

        let assessment =
            retry_on_overload(&self.policy, || self.ai.assess_anomaly(&ctx)).await?;

        if !assessment.is_anomaly {
            debug!(
                transaction_id = transaction.id,
                risk_score = assessment.risk_score,
                "Transaction assessed as normal"
            );
            return Ok(None);
        }

        let severity = AnomalySeverity::from_risk_score(assessment.risk_score);
        let id = self.db.create_anomaly(&NewAnomaly {
            owner: transaction.owner.clone(),
            transaction_id: transaction.id,
            category: AnomalyCategory::UnusualAmount,
            severity,
            description: assessment.reason.clone(),
            risk_score: Some(assessment.risk_score),
            recommendation: Some(assessment.recommendation.clone()),
            ai_provider: Some(self.ai.name().to_string()),
        })?;

        debug!(
            transaction_id = transaction.id,
            anomaly_id = id,
            severity = %severity,
            "Anomaly recorded"
        );

        Ok(self.db.get_anomaly_for_owner(id, &transaction.owner)?)
    }
}

/// Build the spending baseline handed to the model: overall mean and
/// same-category mean over the history window
fn build_context(transaction: &Transaction, history: &[Transaction]) -> AnomalyContext {
    let avg_amount = if history.is_empty() {
        0.0
    } else {
        history.iter().map(|t| t.amount).sum::<f64>() / history.len() as f64
    };

    let same_category: Vec<&Transaction> = history
        .iter()
        .filter(|t| t.category == transaction.category)
        .collect();
    let avg_category_amount = if same_category.is_empty() {
        0.0
    } else {
        same_category.iter().map(|t| t.amount).sum::<f64>() / same_category.len() as f64
    };

    AnomalyContext {
        merchant: transaction.merchant.clone(),
        amount: transaction.amount,
        category: transaction.category.clone(),
        date: transaction.date,
        avg_amount,
        avg_category_amount,
        history_len: history.len(),
    }
}
