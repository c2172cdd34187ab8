//! Parsing helpers for AI model responses
//!
//! Models wrap JSON in prose, markdown fences, or both. The span rule is
//! deliberately dumb: take everything from the first `{` to the last `}`
//! (or `[`/`]` for arrays) and hand it to serde. Anything less regular
//! than that fails closed.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::types::{AnomalyAssessment, ExtractedTransaction};
use crate::error::{Error, ExtractionError, Result};

/// Default currency assigned when the model omits one
pub const DEFAULT_CURRENCY: &str = "USD";

/// Merchant recorded when the model cannot identify one
pub const UNKNOWN_MERCHANT: &str = "Unknown Merchant";

/// How much of a malformed response to keep in error messages
const ERROR_SNIPPET_LEN: usize = 200;

fn truncate(response: &str) -> String {
    response.chars().take(ERROR_SNIPPET_LEN).collect()
}

/// Extract the first-`{`-to-last-`}` object span from a response
fn object_span(response: &str) -> Option<&str> {
    let start = response.find('{');
    let end = response.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => Some(&response[s..=e]),
        _ => None,
    }
}

/// Extract the first-`[`-to-last-`]` array span from a response
fn array_span(response: &str) -> Option<&str> {
    let start = response.find('[');
    let end = response.rfind(']');
    match (start, end) {
        (Some(s), Some(e)) if s < e => Some(&response[s..=e]),
        _ => None,
    }
}

/// Raw extraction shape the model returns. Every field optional; the
/// model is told to use null for unknowns and sometimes sends amounts
/// as strings.
#[derive(Debug, Deserialize)]
struct RawExtraction {
    merchant: Option<String>,
    amount: Option<serde_json::Value>,
    currency: Option<String>,
    category: Option<String>,
    date: Option<String>,
    description: Option<String>,
}

fn coerce_amount(value: Option<serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().trim_start_matches('$').parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parse a structured-extraction response, defaulting every missing
/// field. Fails only when no JSON object can be located or the span is
/// not valid JSON.
pub fn parse_extracted_transaction(response: &str) -> Result<ExtractedTransaction> {
    let span = object_span(response).ok_or_else(|| {
        Error::Extraction(ExtractionError::NoStructuredData(truncate(response)))
    })?;

    let raw: RawExtraction = serde_json::from_str(span).map_err(|e| {
        Error::Extraction(ExtractionError::NoStructuredData(format!(
            "{}: {}",
            e,
            truncate(span)
        )))
    })?;

    let amount = coerce_amount(raw.amount);

    Ok(ExtractedTransaction {
        merchant: raw
            .merchant
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_MERCHANT.to_string()),
        amount: if amount.is_finite() && amount >= 0.0 { amount } else { 0.0 },
        currency: raw
            .currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        category: raw
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "Other".to_string()),
        date: raw
            .date
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
            .unwrap_or_else(|| Utc::now().date_naive()),
        description: raw.description.unwrap_or_default(),
    })
}

/// Parse an anomaly-assessment response
pub fn parse_anomaly_assessment(response: &str) -> Result<AnomalyAssessment> {
    let span = object_span(response).ok_or_else(|| {
        Error::Extraction(ExtractionError::NoStructuredData(truncate(response)))
    })?;

    let mut assessment: AnomalyAssessment = serde_json::from_str(span).map_err(|e| {
        Error::Extraction(ExtractionError::NoStructuredData(format!(
            "{}: {}",
            e,
            truncate(span)
        )))
    })?;

    assessment.risk_score = assessment.risk_score.clamp(0.0, 1.0);
    Ok(assessment)
}

/// Parse an insights response into a list of strings
pub fn parse_insights(response: &str) -> Result<Vec<String>> {
    let span = array_span(response).ok_or_else(|| {
        Error::Extraction(ExtractionError::NoStructuredData(truncate(response)))
    })?;

    let insights: Vec<String> = serde_json::from_str(span).map_err(|e| {
        Error::Extraction(ExtractionError::NoStructuredData(format!(
            "{}: {}",
            e,
            truncate(span)
        )))
    })?;

    Ok(insights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_extraction() {
        let response = r#"{"merchant": "Walmart", "amount": 45.20, "currency": "USD",
            "category": "Groceries", "date": "2024-03-15", "description": "Weekly shop"}"#;

        let tx = parse_extracted_transaction(response).unwrap();
        assert_eq!(tx.merchant, "Walmart");
        assert_eq!(tx.amount, 45.20);
        assert_eq!(tx.category, "Groceries");
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_parse_extraction_with_prose_and_fences() {
        let response = "Here is the extracted data:\n```json\n{\"merchant\": \"Shell\", \"amount\": 30, \"category\": \"Gas\"}\n```\nLet me know if you need anything else!";

        let tx = parse_extracted_transaction(response).unwrap();
        assert_eq!(tx.merchant, "Shell");
        assert_eq!(tx.amount, 30.0);
        assert_eq!(tx.currency, "USD");
    }

    #[test]
    fn test_parse_extraction_defaults_nulls() {
        let response = r#"{"merchant": null, "amount": null, "currency": null,
            "category": null, "date": "not-a-date", "description": null}"#;

        let tx = parse_extracted_transaction(response).unwrap();
        assert_eq!(tx.merchant, UNKNOWN_MERCHANT);
        assert_eq!(tx.amount, 0.0);
        assert_eq!(tx.currency, DEFAULT_CURRENCY);
        assert_eq!(tx.category, "Other");
        assert_eq!(tx.date, Utc::now().date_naive());
        assert_eq!(tx.description, "");
    }

    #[test]
    fn test_parse_extraction_amount_as_string() {
        let response = r#"{"merchant": "Target", "amount": "$19.99"}"#;
        let tx = parse_extracted_transaction(response).unwrap();
        assert_eq!(tx.amount, 19.99);
    }

    #[test]
    fn test_parse_extraction_negative_amount_clamped() {
        let response = r#"{"merchant": "Refund Co", "amount": -12.50}"#;
        let tx = parse_extracted_transaction(response).unwrap();
        assert_eq!(tx.amount, 0.0);
    }

    #[test]
    fn test_parse_extraction_no_json_fails_closed() {
        let err = parse_extracted_transaction("I could not read this receipt, sorry.").unwrap_err();
        assert!(matches!(
            err,
            Error::Extraction(ExtractionError::NoStructuredData(_))
        ));
    }

    #[test]
    fn test_parse_extraction_malformed_json_fails_closed() {
        let err = parse_extracted_transaction("{\"merchant\": \"Walmart\",").unwrap_err();
        assert!(matches!(
            err,
            Error::Extraction(ExtractionError::NoStructuredData(_))
        ));
    }

    #[test]
    fn test_parse_assessment_camel_case_keys() {
        let response = r#"{"isAnomaly": true, "riskScore": 0.85,
            "reason": "Amount far above baseline", "recommendation": "Verify this charge"}"#;

        let a = parse_anomaly_assessment(response).unwrap();
        assert!(a.is_anomaly);
        assert_eq!(a.risk_score, 0.85);
        assert_eq!(a.reason, "Amount far above baseline");
    }

    #[test]
    fn test_parse_assessment_clamps_risk_score() {
        let response = r#"{"isAnomaly": true, "riskScore": 1.7, "reason": "x", "recommendation": "y"}"#;
        let a = parse_anomaly_assessment(response).unwrap();
        assert_eq!(a.risk_score, 1.0);
    }

    #[test]
    fn test_parse_insights_array_with_prose() {
        let response = "Here are your insights:\n[\"Spend less on takeout\", \"Income is stable\"]";
        let insights = parse_insights(response).unwrap();
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0], "Spend less on takeout");
    }

    #[test]
    fn test_parse_insights_no_array_fails_closed() {
        assert!(parse_insights("No insights available.").is_err());
    }

    #[test]
    fn test_error_snippet_is_truncated() {
        let long = "x".repeat(5000);
        let err = parse_extracted_transaction(&long).unwrap_err();
        let msg = err.to_string();
        assert!(msg.len() < 400);
    }
}
