//! Domain models for LedgerLens

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded receipt or invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    /// Opaque user identity resolved by the server layer
    pub owner: String,
    pub original_name: String,
    pub file_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub status: DocumentStatus,
    /// Merchant name extracted by the AI provider
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    /// Transaction date printed on the receipt
    pub transaction_date: Option<NaiveDate>,
    /// Raw text pulled from the PDF or via vision OCR
    pub extracted_text: Option<String>,
    /// Which provider produced the extraction (gemini, openai, mock)
    pub ai_provider: Option<String>,
    pub confidence: Option<f64>,
    /// Failure reason when status is `failed`
    pub error_message: Option<String>,
    /// SHA-256 of the uploaded bytes, for duplicate detection
    pub content_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A new document record (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub owner: String,
    pub original_name: String,
    pub file_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub content_hash: String,
}

/// Document processing lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Uploaded, not yet picked up by the pipeline
    #[default]
    Pending,
    /// Pipeline is extracting and structuring
    Processing,
    /// Extraction complete, transaction materialized
    Processed,
    /// Terminal failure, see error_message
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }

    /// Whether this status accepts no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Failed)
    }

    /// Status moves forward only: pending -> processing -> processed|failed.
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Processing | Self::Failed),
            Self::Processing => matches!(next, Self::Processed | Self::Failed),
            Self::Processed | Self::Failed => false,
        }
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "processed" => Ok(Self::Processed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown document status: {}", s)),
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub owner: String,
    /// Source document, when materialized from an upload
    pub document_id: Option<i64>,
    pub merchant: String,
    pub category: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Always non-negative; direction comes from tx_type
    pub amount: f64,
    pub currency: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    /// Extraction confidence for AI-materialized transactions
    pub ai_confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Partial update for a transaction; `None` fields keep their value
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub tx_type: Option<TransactionType>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// A new transaction (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub owner: String,
    pub document_id: Option<i64>,
    pub merchant: String,
    pub category: String,
    pub tx_type: TransactionType,
    pub amount: f64,
    pub currency: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub ai_confidence: Option<f64>,
}

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    /// Receipts carry no income signal, so AI-materialized transactions
    /// are always expenses
    #[default]
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A flagged anomaly tied to a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: i64,
    pub owner: String,
    pub transaction_id: i64,
    pub category: AnomalyCategory,
    pub severity: AnomalySeverity,
    pub description: String,
    pub status: AnomalyStatus,
    /// Model-estimated risk in [0, 1]
    pub risk_score: Option<f64>,
    pub recommendation: Option<String>,
    pub ai_provider: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A new anomaly (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewAnomaly {
    pub owner: String,
    pub transaction_id: i64,
    pub category: AnomalyCategory,
    pub severity: AnomalySeverity,
    pub description: String,
    pub risk_score: Option<f64>,
    pub recommendation: Option<String>,
    pub ai_provider: Option<String>,
}

/// What kind of irregularity was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyCategory {
    UnusualAmount,
    Duplicate,
    SuspiciousMerchant,
    UnusualCategory,
    Other,
}

impl AnomalyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnusualAmount => "unusual_amount",
            Self::Duplicate => "duplicate",
            Self::SuspiciousMerchant => "suspicious_merchant",
            Self::UnusualCategory => "unusual_category",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for AnomalyCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unusual_amount" => Ok(Self::UnusualAmount),
            "duplicate" => Ok(Self::Duplicate),
            "suspicious_merchant" => Ok(Self::SuspiciousMerchant),
            "unusual_category" => Ok(Self::UnusualCategory),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown anomaly category: {}", s)),
        }
    }
}

impl std::fmt::Display for AnomalyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity bands derived from the model's risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

impl AnomalySeverity {
    /// Band a risk score: strictly above 0.7 is high, strictly above 0.4
    /// is medium, everything else low. Scores exactly on a boundary fall
    /// into the lower band.
    pub fn from_risk_score(score: f64) -> Self {
        if score > 0.7 {
            Self::High
        } else if score > 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for AnomalySeverity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown anomaly severity: {}", s)),
        }
    }
}

impl std::fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Review workflow for anomalies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyStatus {
    #[default]
    New,
    Reviewed,
    Resolved,
    Ignored,
}

impl AnomalyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewed => "reviewed",
            Self::Resolved => "resolved",
            Self::Ignored => "ignored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::New)
    }

    /// Review moves one way: `new` can move to any reviewed state, after
    /// which the anomaly is frozen.
    pub fn can_transition_to(&self, next: AnomalyStatus) -> bool {
        matches!(self, Self::New) && next != Self::New
    }
}

impl std::str::FromStr for AnomalyStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "reviewed" => Ok(Self::Reviewed),
            "resolved" => Ok(Self::Resolved),
            "ignored" => Ok(Self::Ignored),
            _ => Err(format!("Unknown anomaly status: {}", s)),
        }
    }
}

impl std::fmt::Display for AnomalyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scheduled payment or obligation to keep in view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub priority: ReminderPriority,
    pub status: ReminderStatus,
    /// Expected amount, when known
    pub amount: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A new reminder (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub reminder_type: ReminderType,
    pub priority: ReminderPriority,
    pub amount: Option<f64>,
}

/// Partial update for a reminder; `None` fields keep their value
#[derive(Debug, Clone, Default)]
pub struct ReminderUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub reminder_type: Option<ReminderType>,
    pub priority: Option<ReminderPriority>,
    pub status: Option<ReminderStatus>,
    pub amount: Option<f64>,
}

/// What a reminder is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderType {
    Payment,
    Tax,
    Subscription,
    Insurance,
    #[default]
    Other,
}

impl ReminderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Tax => "tax",
            Self::Subscription => "subscription",
            Self::Insurance => "insurance",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for ReminderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "payment" => Ok(Self::Payment),
            "tax" => Ok(Self::Tax),
            "subscription" => Ok(Self::Subscription),
            "insurance" => Ok(Self::Insurance),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown reminder type: {}", s)),
        }
    }
}

impl std::fmt::Display for ReminderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How urgently a reminder should surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl ReminderPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for ReminderPriority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown reminder priority: {}", s)),
        }
    }
}

impl std::fmt::Display for ReminderPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a reminder stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[default]
    Pending,
    Completed,
    Dismissed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Dismissed => "dismissed",
        }
    }
}

impl std::str::FromStr for ReminderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "dismissed" => Ok(Self::Dismissed),
            _ => Err(format!("Unknown reminder status: {}", s)),
        }
    }
}

impl std::fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// All-time totals for a single owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Totals {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_balance: f64,
    pub document_count: i64,
}

/// Income/expense sums for a single calendar month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyPerformance {
    /// Month key in YYYY-MM form
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub profit: f64,
}

/// Total expense amount for one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpending {
    pub category: String,
    pub amount: f64,
}

/// Narrow transaction totals, optionally bounded to a date window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    pub transaction_count: i64,
    /// Expense totals per category, largest first
    pub by_category: Vec<CategorySpending>,
}

/// On-demand analytics bundle for an owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub totals: Totals,
    /// Trailing six months, oldest first, zero-filled for empty months
    pub monthly_performance: Vec<MonthlyPerformance>,
    /// Expense categories, largest first
    pub category_distribution: Vec<CategorySpending>,
    /// Ten most recent transactions by date
    pub recent_transactions: Vec<Transaction>,
}

/// A category's share of total volume, for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    /// Rounded percentage of total transaction volume
    pub percent: f64,
}

/// Cross-owner operational stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDashboard {
    /// Distinct owners with at least one document or transaction
    pub total_owners: i64,
    pub total_documents: i64,
    pub total_transactions: i64,
    pub new_anomalies: i64,
    /// Sum of all transaction amounts regardless of direction
    pub total_volume: f64,
    /// Trailing six months across all owners, oldest first
    pub monthly_series: Vec<MonthlyPerformance>,
    /// Top five categories by share of total volume
    pub top_categories: Vec<CategoryShare>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_document_status_forward_only() {
        use DocumentStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Processed));
        assert!(Processing.can_transition_to(Failed));

        // No backward moves
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Processed.can_transition_to(Processing));

        // Terminal states are frozen
        assert!(!Processed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Processed));

        // Pending cannot skip straight to processed
        assert!(!Pending.can_transition_to(Processed));
    }

    #[test]
    fn test_severity_banding_boundaries() {
        // Boundaries fall into the lower band
        assert_eq!(AnomalySeverity::from_risk_score(0.7), AnomalySeverity::Medium);
        assert_eq!(AnomalySeverity::from_risk_score(0.71), AnomalySeverity::High);
        assert_eq!(AnomalySeverity::from_risk_score(0.4), AnomalySeverity::Low);
        assert_eq!(AnomalySeverity::from_risk_score(0.41), AnomalySeverity::Medium);
        assert_eq!(AnomalySeverity::from_risk_score(0.0), AnomalySeverity::Low);
        assert_eq!(AnomalySeverity::from_risk_score(1.0), AnomalySeverity::High);
    }

    #[test]
    fn test_anomaly_status_one_way() {
        use AnomalyStatus::*;

        assert!(New.can_transition_to(Reviewed));
        assert!(New.can_transition_to(Resolved));
        assert!(New.can_transition_to(Ignored));
        assert!(!New.can_transition_to(New));

        assert!(!Reviewed.can_transition_to(Resolved));
        assert!(!Resolved.can_transition_to(New));
        assert!(!Ignored.can_transition_to(Reviewed));
    }

    #[test]
    fn test_status_round_trips() {
        for s in ["pending", "processing", "processed", "failed"] {
            assert_eq!(DocumentStatus::from_str(s).unwrap().as_str(), s);
        }
        for s in ["new", "reviewed", "resolved", "ignored"] {
            assert_eq!(AnomalyStatus::from_str(s).unwrap().as_str(), s);
        }
        for s in [
            "unusual_amount",
            "duplicate",
            "suspicious_merchant",
            "unusual_category",
            "other",
        ] {
            assert_eq!(AnomalyCategory::from_str(s).unwrap().as_str(), s);
        }
        assert!(DocumentStatus::from_str("archived").is_err());
        assert!(AnomalyStatus::from_str("open").is_err());
    }

    #[test]
    fn test_reminder_enum_round_trips() {
        for s in ["payment", "tax", "subscription", "insurance", "other"] {
            assert_eq!(ReminderType::from_str(s).unwrap().as_str(), s);
        }
        for s in ["low", "medium", "high"] {
            assert_eq!(ReminderPriority::from_str(s).unwrap().as_str(), s);
        }
        for s in ["pending", "completed", "dismissed"] {
            assert_eq!(ReminderStatus::from_str(s).unwrap().as_str(), s);
        }

        assert_eq!(ReminderType::default(), ReminderType::Other);
        assert_eq!(ReminderPriority::default(), ReminderPriority::Medium);
        assert_eq!(ReminderStatus::default(), ReminderStatus::Pending);

        assert!(ReminderType::from_str("loan").is_err());
        assert!(ReminderStatus::from_str("done").is_err());
    }
}
