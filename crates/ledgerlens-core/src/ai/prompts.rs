//! Fixed prompt templates for every AI operation
//!
//! Prompts are compile-time templates. Each one pins the exact JSON shape
//! the parser expects, so prompt and parser must change together.

use super::types::{AnomalyContext, SpendingSnapshot};

/// Instruction sent alongside a receipt image for vision OCR
pub const OCR_INSTRUCTION: &str = "Extract all text from this receipt or invoice image. \
Return only the raw text content, preserving the layout as closely as possible. \
Do not add commentary or explanations.";

/// Categories the extraction prompt allows. Anything else the model
/// invents is kept verbatim, but steering it to this list keeps the
/// category distribution useful.
pub const CATEGORIES: [&str; 9] = [
    "Groceries",
    "Shopping",
    "Food",
    "Gas",
    "Utilities",
    "Transport",
    "Entertainment",
    "Healthcare",
    "Other",
];

/// Build the structured-extraction prompt for receipt/invoice text
pub fn extraction_prompt(text: &str) -> String {
    format!(
        r#"Analyze this receipt or invoice text and extract transaction details.

Text:
{text}

Respond with ONLY a JSON object in this exact format, no other text:
{{
  "merchant": "store or company name",
  "amount": 0.00,
  "currency": "USD",
  "category": "one of: {categories}",
  "date": "YYYY-MM-DD",
  "description": "brief description of the purchase"
}}

Use the total amount including tax. If a field cannot be determined, use null."#,
        text = text,
        categories = CATEGORIES.join(", "),
    )
}

/// Build the anomaly-assessment prompt for one transaction against its
/// spending baseline
pub fn anomaly_prompt(ctx: &AnomalyContext) -> String {
    format!(
        r#"You are a financial fraud and anomaly detection system. Assess this transaction against the user's spending history.

Transaction:
- Merchant: {merchant}
- Amount: {amount:.2}
- Category: {category}
- Date: {date}

Spending history ({history_len} recent transactions):
- Average transaction amount: {avg_amount:.2}
- Average amount in {category}: {avg_category_amount:.2}

Respond with ONLY a JSON object in this exact format, no other text:
{{
  "isAnomaly": true or false,
  "riskScore": 0.0,
  "reason": "one sentence explaining the assessment",
  "recommendation": "one sentence of advice for the user"
}}

riskScore must be between 0.0 and 1.0."#,
        merchant = ctx.merchant,
        amount = ctx.amount,
        category = ctx.category,
        date = ctx.date,
        history_len = ctx.history_len,
        avg_amount = ctx.avg_amount,
        avg_category_amount = ctx.avg_category_amount,
    )
}

/// Build the financial-insights prompt from a three-month digest
pub fn insights_prompt(snapshot: &SpendingSnapshot) -> String {
    let categories = snapshot
        .top_categories
        .iter()
        .map(|(name, total)| format!("- {}: {:.2}", name, total))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a personal finance advisor. Based on the last 3 months of activity, give the user practical insights.

Summary:
- Total income: {income:.2}
- Total expenses: {expenses:.2}
- Net: {net:.2}
- Transactions: {count}

Top expense categories:
{categories}

Respond with ONLY a JSON array of 3 to 5 short insight strings, no other text:
["insight one", "insight two", "insight three"]"#,
        income = snapshot.total_income,
        expenses = snapshot.total_expenses,
        net = snapshot.net,
        count = snapshot.transaction_count,
        categories = categories,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_extraction_prompt_embeds_text_and_categories() {
        let prompt = extraction_prompt("WALMART TOTAL $45.20");
        assert!(prompt.contains("WALMART TOTAL $45.20"));
        assert!(prompt.contains("Groceries"));
        assert!(prompt.contains("\"date\": \"YYYY-MM-DD\""));
    }

    #[test]
    fn test_anomaly_prompt_includes_baselines() {
        let ctx = AnomalyContext {
            merchant: "Luxury Watches Inc".to_string(),
            amount: 2500.0,
            category: "Shopping".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            avg_amount: 62.10,
            avg_category_amount: 84.50,
            history_len: 48,
        };
        let prompt = anomaly_prompt(&ctx);
        assert!(prompt.contains("2500.00"));
        assert!(prompt.contains("62.10"));
        assert!(prompt.contains("84.50"));
        assert!(prompt.contains("48 recent transactions"));
        assert!(prompt.contains("riskScore"));
    }
}
