//! AI-generated financial insights
//!
//! Summarizes the last three months into a digest, asks the provider
//! for plain-language advice, and degrades to an empty list when the
//! model cannot deliver. Insights never block or fail a request.

use chrono::{Months, Utc};
use tracing::warn;

use crate::ai::{retry_on_overload, AiClient, AiProvider, RetryPolicy, SpendingSnapshot};
use crate::db::Database;
use crate::models::TransactionType;

/// How far back the digest looks
const LOOKBACK_MONTHS: u32 = 3;

/// Below this many transactions the model has nothing useful to say
const MIN_TRANSACTIONS: usize = 5;

/// How many expense categories the digest includes
const TOP_CATEGORIES: usize = 5;

/// Message returned instead of calling the model when history is thin
pub const NOT_ENOUGH_DATA: &str =
    "Not enough transaction history yet. Upload more receipts to unlock insights.";

/// Generate insights for an owner. Returns a canned message when there
/// is too little history, and an empty list when the model fails.
pub async fn generate_insights(
    db: &Database,
    ai: &AiClient,
    policy: &RetryPolicy,
    owner: &str,
) -> Vec<String> {
    let since = Utc::now()
        .date_naive()
        .checked_sub_months(Months::new(LOOKBACK_MONTHS))
        .unwrap_or_else(|| Utc::now().date_naive());

    let transactions = match db.transactions_since(owner, since) {
        Ok(txs) => txs,
        Err(e) => {
            warn!(owner, "Could not load transactions for insights: {}", e);
            return Vec::new();
        }
    };

    if transactions.len() < MIN_TRANSACTIONS {
        return vec![NOT_ENOUGH_DATA.to_string()];
    }

    let snapshot = build_snapshot(&transactions);

    match retry_on_overload(policy, || ai.generate_insights(&snapshot)).await {
        Ok(insights) => insights,
        Err(e) => {
            warn!(owner, "Insights generation failed: {}", e);
            Vec::new()
        }
    }
}

fn build_snapshot(transactions: &[crate::models::Transaction]) -> SpendingSnapshot {
    let total_income: f64 = transactions
        .iter()
        .filter(|t| t.tx_type == TransactionType::Income)
        .map(|t| t.amount)
        .sum();
    let total_expenses: f64 = transactions
        .iter()
        .filter(|t| t.tx_type == TransactionType::Expense)
        .map(|t| t.amount)
        .sum();

    let mut by_category: std::collections::HashMap<String, f64> = std::collections::HashMap::new();
    for tx in transactions
        .iter()
        .filter(|t| t.tx_type == TransactionType::Expense)
    {
        *by_category.entry(tx.category.clone()).or_insert(0.0) += tx.amount;
    }
    let mut top_categories: Vec<(String, f64)> = by_category.into_iter().collect();
    top_categories.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    top_categories.truncate(TOP_CATEGORIES);

    SpendingSnapshot {
        total_income,
        total_expenses,
        net: total_income - total_expenses,
        top_categories,
        transaction_count: transactions.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockProvider};
    use crate::models::{NewTransaction, Transaction};
    use chrono::NaiveDate;

    fn seed(db: &Database, owner: &str, amount: f64, tx_type: TransactionType, category: &str) {
        db.create_transaction(&NewTransaction {
            owner: owner.to_string(),
            document_id: None,
            merchant: "M".to_string(),
            category: category.to_string(),
            tx_type,
            amount,
            currency: "USD".to_string(),
            date: Utc::now().date_naive(),
            description: None,
            ai_confidence: None,
        })
        .unwrap();
    }

    #[tokio::test]
    async fn test_thin_history_gets_canned_message() {
        let db = Database::in_memory().unwrap();
        seed(&db, "alice", 10.0, TransactionType::Expense, "Food");

        let insights = generate_insights(
            &db,
            &AiClient::mock(),
            &RetryPolicy::immediate(3),
            "alice",
        )
        .await;
        assert_eq!(insights, vec![NOT_ENOUGH_DATA.to_string()]);
    }

    #[tokio::test]
    async fn test_enough_history_returns_model_insights() {
        let db = Database::in_memory().unwrap();
        for _ in 0..6 {
            seed(&db, "alice", 25.0, TransactionType::Expense, "Groceries");
        }

        let mock = MockProvider::new()
            .with_insights(vec!["You spend a lot on groceries".to_string()]);
        let insights = generate_insights(
            &db,
            &AiClient::mock_with(mock),
            &RetryPolicy::immediate(3),
            "alice",
        )
        .await;
        assert_eq!(insights, vec!["You spend a lot on groceries".to_string()]);
    }

    #[test]
    fn test_snapshot_totals_and_top_categories() {
        let mk = |amount: f64, tx_type: TransactionType, category: &str| Transaction {
            id: 0,
            owner: "alice".to_string(),
            document_id: None,
            merchant: "m".to_string(),
            category: category.to_string(),
            tx_type,
            amount,
            currency: "USD".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            description: None,
            ai_confidence: None,
            created_at: Utc::now(),
        };

        let txs = vec![
            mk(1000.0, TransactionType::Income, "Salary"),
            mk(200.0, TransactionType::Expense, "Groceries"),
            mk(50.0, TransactionType::Expense, "Gas"),
            mk(300.0, TransactionType::Expense, "Rent"),
        ];

        let snapshot = build_snapshot(&txs);
        assert_eq!(snapshot.total_income, 1000.0);
        assert_eq!(snapshot.total_expenses, 550.0);
        assert_eq!(snapshot.net, 450.0);
        assert_eq!(snapshot.transaction_count, 4);
        // Largest expense category first
        assert_eq!(snapshot.top_categories[0].0, "Rent");
        assert_eq!(snapshot.top_categories[1].0, "Groceries");
    }
}
