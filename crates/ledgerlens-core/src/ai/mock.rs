//! Deterministic mock provider for tests
//!
//! Returns scripted values with no network calls. Failure modes can be
//! injected per operation to exercise retry and degradation paths, and
//! a call counter lets tests assert attempt budgets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::types::*;
use super::AiProvider;
use crate::error::{Error, ExtractionError, Result};

/// Scripted failure injected into a mock operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Transient 503-style overload, should be retried
    Overloaded,
    /// Response with no parseable JSON, should fail closed immediately
    NoJson,
}

impl MockFailure {
    fn to_error(self) -> Error {
        match self {
            Self::Overloaded => Error::Provider {
                status: 503,
                message: "The model is overloaded. Please try again later.".to_string(),
            },
            Self::NoJson => Error::Extraction(ExtractionError::NoStructuredData(
                "I'm sorry, I can't read this.".to_string(),
            )),
        }
    }
}

#[derive(Clone)]
pub struct MockProvider {
    pub healthy: bool,
    ocr_text: String,
    extraction: ExtractedTransaction,
    assessment: AnomalyAssessment,
    insights: Vec<String>,
    extract_failure: Option<MockFailure>,
    assess_failure: Option<MockFailure>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            healthy: true,
            ocr_text: "WALMART\n2024-03-15\nGROCERIES\nTOTAL $45.20".to_string(),
            extraction: ExtractedTransaction {
                merchant: "Walmart".to_string(),
                amount: 45.20,
                currency: "USD".to_string(),
                category: "Groceries".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, 15)
                    .unwrap_or_else(|| chrono::Utc::now().date_naive()),
                description: "Weekly groceries".to_string(),
            },
            assessment: AnomalyAssessment {
                is_anomaly: false,
                risk_score: 0.1,
                reason: "Amount is in line with history".to_string(),
                recommendation: "No action needed".to_string(),
            },
            insights: vec![
                "Grocery spending is stable month over month".to_string(),
                "Income covers expenses with room to save".to_string(),
            ],
            extract_failure: None,
            assess_failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    pub fn with_ocr_text(mut self, text: &str) -> Self {
        self.ocr_text = text.to_string();
        self
    }

    pub fn with_extraction(mut self, extraction: ExtractedTransaction) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn with_assessment(mut self, assessment: AnomalyAssessment) -> Self {
        self.assessment = assessment;
        self
    }

    pub fn with_insights(mut self, insights: Vec<String>) -> Self {
        self.insights = insights;
        self
    }

    /// Make every extract_structured call fail the given way
    pub fn failing_extraction(mut self, failure: MockFailure) -> Self {
        self.extract_failure = Some(failure);
        self
    }

    /// Make every assess_anomaly call fail the given way
    pub fn failing_assessment(mut self, failure: MockFailure) -> Self {
        self.assess_failure = Some(failure);
        self
    }

    /// Total model calls made through this mock (shared across clones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    async fn extract_text(&self, _image: &[u8], _mime_type: &str) -> Result<String> {
        self.record_call();
        Ok(self.ocr_text.clone())
    }

    async fn extract_structured(&self, _text: &str) -> Result<ExtractedTransaction> {
        self.record_call();
        if let Some(failure) = self.extract_failure {
            return Err(failure.to_error());
        }
        Ok(self.extraction.clone())
    }

    async fn assess_anomaly(&self, _ctx: &AnomalyContext) -> Result<AnomalyAssessment> {
        self.record_call();
        if let Some(failure) = self.assess_failure {
            return Err(failure.to_error());
        }
        Ok(self.assessment.clone())
    }

    async fn generate_insights(&self, _snapshot: &SpendingSnapshot) -> Result<Vec<String>> {
        self.record_call();
        Ok(self.insights.clone())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.record_call();
        // Deterministic pseudo-embedding derived from the input bytes
        let mut values: Vec<f32> = text
            .bytes()
            .take(16)
            .map(|b| (b as f32) / 255.0)
            .collect();
        values.resize(16, 0.0);
        Ok(values)
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn name(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_scripted_extraction() {
        let mock = MockProvider::new();
        let tx = mock.extract_structured("anything").await.unwrap();
        assert_eq!(tx.merchant, "Walmart");
        assert_eq!(tx.amount, 45.20);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure_modes() {
        let mock = MockProvider::new().failing_extraction(MockFailure::Overloaded);
        assert!(mock.extract_structured("x").await.unwrap_err().is_overloaded());

        let mock = MockProvider::new().failing_extraction(MockFailure::NoJson);
        assert!(!mock.extract_structured("x").await.unwrap_err().is_overloaded());
    }

    #[tokio::test]
    async fn test_mock_embedding_is_deterministic() {
        let mock = MockProvider::new();
        let a = mock.embed("walmart receipt").await.unwrap();
        let b = mock.embed("walmart receipt").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[tokio::test]
    async fn test_call_count_shared_across_clones() {
        let mock = MockProvider::new();
        let clone = mock.clone();
        let _ = clone.extract_structured("x").await;
        let _ = clone.assess_anomaly(&AnomalyContext {
            merchant: "m".to_string(),
            amount: 1.0,
            category: "Other".to_string(),
            date: chrono::Utc::now().date_naive(),
            avg_amount: 1.0,
            avg_category_amount: 1.0,
            history_len: 0,
        })
        .await;
        assert_eq!(mock.call_count(), 2);
    }
}
