//! Spending summary and insights

use std::path::Path;

use anyhow::Result;

use ledgerlens_core::ai::{AiClient, RetryPolicy};
use ledgerlens_core::insights;

use super::open_db;

pub fn cmd_summary(db: Option<&Path>, owner: &str) -> Result<()> {
    let database = open_db(db)?;
    let summary = database.analytics_summary(owner)?;

    println!("💰 Spending Summary ({})", owner);
    println!("   ─────────────────────────────");
    println!("   Income:   ${:>12.2}", summary.totals.total_income);
    println!("   Expenses: ${:>12.2}", summary.totals.total_expenses);
    println!("   Net:      ${:>12.2}", summary.totals.net_balance);
    println!("   Documents: {}", summary.totals.document_count);

    println!();
    println!("📅 Last 6 months");
    for month in &summary.monthly_performance {
        println!(
            "   {}  income ${:>10.2}  expenses ${:>10.2}  profit ${:>10.2}",
            month.month, month.income, month.expenses, month.profit
        );
    }

    if !summary.category_distribution.is_empty() {
        println!();
        println!("🏷️  Spending by category");
        for cat in &summary.category_distribution {
            println!("   {:<16} ${:>10.2}", cat.category, cat.amount);
        }
    }

    if !summary.recent_transactions.is_empty() {
        println!();
        println!("🧾 Recent transactions");
        for tx in &summary.recent_transactions {
            println!(
                "   {}  {:<20} {:<12} {:>8.2} {}",
                tx.date, tx.merchant, tx.category, tx.amount, tx.currency
            );
        }
    }

    Ok(())
}

pub async fn cmd_insights(db: Option<&Path>, owner: &str) -> Result<()> {
    let Some(ai) = AiClient::from_env() else {
        anyhow::bail!("No AI provider configured. Set GEMINI_API_KEY or OPENAI_API_KEY.");
    };

    let database = open_db(db)?;

    println!("🤖 Generating insights for {}...", owner);
    let items = insights::generate_insights(&database, &ai, &RetryPolicy::default(), owner).await;

    if items.is_empty() {
        println!("   The model had nothing to say. Try again later.");
        return Ok(());
    }

    println!();
    for (i, insight) in items.iter().enumerate() {
        println!("   {}. {}", i + 1, insight);
    }

    Ok(())
}
