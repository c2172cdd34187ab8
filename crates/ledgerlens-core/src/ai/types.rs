//! Shared types for AI operations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which provider produced a response (recorded on documents and anomalies)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured transaction fields pulled out of a receipt or invoice.
/// Every field is defaulted by the parser, so callers never see holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTransaction {
    pub merchant: String,
    pub amount: f64,
    pub currency: String,
    pub category: String,
    pub date: NaiveDate,
    pub description: String,
}

/// Spending baseline handed to the model for anomaly assessment
#[derive(Debug, Clone)]
pub struct AnomalyContext {
    pub merchant: String,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    /// Mean amount across the history window
    pub avg_amount: f64,
    /// Mean amount across same-category history
    pub avg_category_amount: f64,
    /// How many historical transactions informed the averages
    pub history_len: usize,
}

/// The model's verdict on one transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyAssessment {
    #[serde(alias = "isAnomaly", default)]
    pub is_anomaly: bool,
    /// Estimated risk in [0, 1]
    #[serde(alias = "riskScore", default)]
    pub risk_score: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub recommendation: String,
}

/// Three-month spending digest handed to the model for insights
#[derive(Debug, Clone)]
pub struct SpendingSnapshot {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net: f64,
    /// Top expense categories with their totals, largest first
    pub top_categories: Vec<(String, f64)>,
    pub transaction_count: usize,
}
