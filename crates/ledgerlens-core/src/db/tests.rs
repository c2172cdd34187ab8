//! Database layer tests

use chrono::{Datelike, Utc};

use super::Database;
use crate::ai::ExtractedTransaction;
use crate::error::Error;
use crate::models::*;

fn test_db() -> Database {
    Database::in_memory().expect("in-memory db")
}

fn sample_document(owner: &str) -> NewDocument {
    NewDocument {
        owner: owner.to_string(),
        original_name: "receipt.pdf".to_string(),
        file_path: "/tmp/uploads/receipt.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        size_bytes: 1024,
        content_hash: "deadbeef".to_string(),
    }
}

fn sample_transaction(owner: &str, amount: f64, category: &str) -> NewTransaction {
    NewTransaction {
        owner: owner.to_string(),
        document_id: None,
        merchant: "Test Merchant".to_string(),
        category: category.to_string(),
        tx_type: TransactionType::Expense,
        amount,
        currency: "USD".to_string(),
        date: Utc::now().date_naive(),
        description: None,
        ai_confidence: None,
    }
}

fn sample_extraction() -> ExtractedTransaction {
    ExtractedTransaction {
        merchant: "Walmart".to_string(),
        amount: 45.20,
        currency: "USD".to_string(),
        category: "Groceries".to_string(),
        date: Utc::now().date_naive(),
        description: "Weekly shop".to_string(),
    }
}

#[test]
fn test_document_create_and_get() {
    let db = test_db();
    let id = db.create_document(&sample_document("alice")).unwrap();

    let doc = db.get_document(id).unwrap().unwrap();
    assert_eq!(doc.owner, "alice");
    assert_eq!(doc.status, DocumentStatus::Pending);
    assert_eq!(doc.content_hash.as_deref(), Some("deadbeef"));
    assert!(doc.merchant.is_none());

    // Owner scoping
    assert!(db.get_document_for_owner(id, "alice").unwrap().is_some());
    assert!(db.get_document_for_owner(id, "bob").unwrap().is_none());
}

#[test]
fn test_document_hash_lookup_is_per_owner() {
    let db = test_db();
    db.create_document(&sample_document("alice")).unwrap();

    assert!(db.find_document_by_hash("alice", "deadbeef").unwrap().is_some());
    assert!(db.find_document_by_hash("bob", "deadbeef").unwrap().is_none());
    assert!(db.find_document_by_hash("alice", "cafebabe").unwrap().is_none());
}

#[test]
fn test_document_status_guard() {
    let db = test_db();
    let id = db.create_document(&sample_document("alice")).unwrap();

    // pending -> processed is not allowed
    let err = db.apply_extraction(id, &sample_extraction(), "raw", "mock", None);
    assert!(matches!(err, Err(Error::InvalidData(_))));

    db.update_document_status(id, DocumentStatus::Processing).unwrap();
    db.apply_extraction(id, &sample_extraction(), "raw text", "mock", None)
        .unwrap();

    let doc = db.get_document(id).unwrap().unwrap();
    assert_eq!(doc.status, DocumentStatus::Processed);
    assert_eq!(doc.merchant.as_deref(), Some("Walmart"));
    assert_eq!(doc.amount, Some(45.20));
    assert_eq!(doc.extracted_text.as_deref(), Some("raw text"));

    // Terminal: cannot fail a processed document
    let err = db.mark_document_failed(id, "oops");
    assert!(matches!(err, Err(Error::InvalidData(_))));
}

#[test]
fn test_document_failure_records_reason() {
    let db = test_db();
    let id = db.create_document(&sample_document("alice")).unwrap();
    db.update_document_status(id, DocumentStatus::Processing).unwrap();
    db.mark_document_failed(id, "No readable text found").unwrap();

    let doc = db.get_document(id).unwrap().unwrap();
    assert_eq!(doc.status, DocumentStatus::Failed);
    assert_eq!(doc.error_message.as_deref(), Some("No readable text found"));

    // Frozen once failed
    assert!(db
        .update_document_status(id, DocumentStatus::Processing)
        .is_err());
}

#[test]
fn test_document_list_filters() {
    let db = test_db();
    let a = db.create_document(&sample_document("alice")).unwrap();
    let mut other = sample_document("alice");
    other.original_name = "invoice-march.pdf".to_string();
    other.content_hash = "feedface".to_string();
    db.create_document(&other).unwrap();
    db.create_document(&sample_document("bob")).unwrap();

    assert_eq!(db.list_documents("alice", None, None).unwrap().len(), 2);
    assert_eq!(db.list_documents("bob", None, None).unwrap().len(), 1);

    db.update_document_status(a, DocumentStatus::Processing).unwrap();
    let processing = db
        .list_documents("alice", Some(DocumentStatus::Processing), None)
        .unwrap();
    assert_eq!(processing.len(), 1);
    assert_eq!(processing[0].id, a);

    let matched = db.list_documents("alice", None, Some("march")).unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].original_name, "invoice-march.pdf");
}

#[test]
fn test_transaction_create_and_validation() {
    let db = test_db();
    let id = db
        .create_transaction(&sample_transaction("alice", 45.20, "Groceries"))
        .unwrap();

    let tx = db.get_transaction(id).unwrap().unwrap();
    assert_eq!(tx.amount, 45.20);
    assert_eq!(tx.tx_type, TransactionType::Expense);
    assert_eq!(tx.currency, "USD");

    // Negative amounts are rejected before SQL
    let err = db.create_transaction(&sample_transaction("alice", -5.0, "Groceries"));
    assert!(matches!(err, Err(Error::InvalidData(_))));

    let err = db.create_transaction(&sample_transaction("alice", f64::NAN, "Groceries"));
    assert!(matches!(err, Err(Error::InvalidData(_))));
}

#[test]
fn test_recent_transactions_excludes_subject_and_limits() {
    let db = test_db();
    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(
            db.create_transaction(&sample_transaction("alice", 10.0 + i as f64, "Food"))
                .unwrap(),
        );
    }

    let history = db.recent_transactions("alice", 100, Some(ids[4])).unwrap();
    assert_eq!(history.len(), 4);
    assert!(history.iter().all(|t| t.id != ids[4]));

    let limited = db.recent_transactions("alice", 2, None).unwrap();
    assert_eq!(limited.len(), 2);
}

#[test]
fn test_cascade_document_to_transaction_to_anomaly() {
    let db = test_db();
    let doc_id = db.create_document(&sample_document("alice")).unwrap();

    let mut tx = sample_transaction("alice", 99.0, "Shopping");
    tx.document_id = Some(doc_id);
    let tx_id = db.create_transaction(&tx).unwrap();

    db.create_anomaly(&NewAnomaly {
        owner: "alice".to_string(),
        transaction_id: tx_id,
        category: AnomalyCategory::UnusualAmount,
        severity: AnomalySeverity::Medium,
        description: "odd".to_string(),
        risk_score: Some(0.5),
        recommendation: None,
        ai_provider: Some("mock".to_string()),
    })
    .unwrap();

    assert!(db.delete_document(doc_id, "alice").unwrap());
    assert!(db.get_transaction(tx_id).unwrap().is_none());
    assert!(db.list_anomalies("alice", None, None).unwrap().is_empty());
}

#[test]
fn test_anomaly_review_workflow() {
    let db = test_db();
    let tx_id = db
        .create_transaction(&sample_transaction("alice", 500.0, "Shopping"))
        .unwrap();
    let id = db
        .create_anomaly(&NewAnomaly {
            owner: "alice".to_string(),
            transaction_id: tx_id,
            category: AnomalyCategory::UnusualAmount,
            severity: AnomalySeverity::High,
            description: "spike".to_string(),
            risk_score: Some(0.9),
            recommendation: Some("check it".to_string()),
            ai_provider: Some("mock".to_string()),
        })
        .unwrap();

    let anomaly = db.get_anomaly_for_owner(id, "alice").unwrap().unwrap();
    assert_eq!(anomaly.status, AnomalyStatus::New);

    // Wrong owner cannot touch it
    assert!(matches!(
        db.update_anomaly_status(id, "bob", AnomalyStatus::Reviewed),
        Err(Error::NotFound(_))
    ));

    let reviewed = db
        .update_anomaly_status(id, "alice", AnomalyStatus::Reviewed)
        .unwrap();
    assert_eq!(reviewed.status, AnomalyStatus::Reviewed);

    // Frozen after review
    assert!(matches!(
        db.update_anomaly_status(id, "alice", AnomalyStatus::Resolved),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn test_anomaly_list_filters() {
    let db = test_db();
    let tx_id = db
        .create_transaction(&sample_transaction("alice", 500.0, "Shopping"))
        .unwrap();
    for severity in [AnomalySeverity::Low, AnomalySeverity::High] {
        db.create_anomaly(&NewAnomaly {
            owner: "alice".to_string(),
            transaction_id: tx_id,
            category: AnomalyCategory::UnusualAmount,
            severity,
            description: "x".to_string(),
            risk_score: None,
            recommendation: None,
            ai_provider: None,
        })
        .unwrap();
    }

    assert_eq!(db.list_anomalies("alice", None, None).unwrap().len(), 2);
    assert_eq!(
        db.list_anomalies("alice", None, Some(AnomalySeverity::High))
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        db.list_anomalies("alice", Some(AnomalyStatus::Reviewed), None)
            .unwrap()
            .len(),
        0
    );
}

#[test]
fn test_update_transaction_merges_fields() {
    let db = test_db();
    let id = db
        .create_transaction(&sample_transaction("alice", 45.20, "Groceries"))
        .unwrap();

    let updated = db
        .update_transaction(
            id,
            "alice",
            &TransactionUpdate {
                amount: Some(60.0),
                category: Some("Household".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    // Patched fields change, the rest survive
    assert_eq!(updated.amount, 60.0);
    assert_eq!(updated.category, "Household");
    assert_eq!(updated.merchant, "Test Merchant");
    assert_eq!(updated.currency, "USD");
    assert_eq!(updated.tx_type, TransactionType::Expense);
}

#[test]
fn test_update_transaction_validation_and_scoping() {
    let db = test_db();
    let id = db
        .create_transaction(&sample_transaction("alice", 45.20, "Groceries"))
        .unwrap();

    let err = db.update_transaction(
        id,
        "alice",
        &TransactionUpdate {
            amount: Some(-1.0),
            ..Default::default()
        },
    );
    assert!(matches!(err, Err(Error::InvalidData(_))));

    let err = db.update_transaction(
        id,
        "alice",
        &TransactionUpdate {
            merchant: Some("   ".to_string()),
            ..Default::default()
        },
    );
    assert!(matches!(err, Err(Error::InvalidData(_))));

    // Wrong owner sees a missing row, not someone else's data
    let err = db.update_transaction(id, "bob", &TransactionUpdate::default());
    assert!(matches!(err, Err(Error::NotFound(_))));

    // Failed updates leave the row untouched
    let tx = db.get_transaction(id).unwrap().unwrap();
    assert_eq!(tx.amount, 45.20);
}

#[test]
fn test_transaction_summary_window() {
    let db = test_db();
    let mut income = sample_transaction("alice", 1000.0, "Salary");
    income.tx_type = TransactionType::Income;
    income.date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    db.create_transaction(&income).unwrap();

    let mut rent = sample_transaction("alice", 300.0, "Rent");
    rent.date = chrono::NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    db.create_transaction(&rent).unwrap();

    let mut old = sample_transaction("alice", 999.0, "Rent");
    old.date = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    db.create_transaction(&old).unwrap();

    // Unbounded: everything counts
    let summary = db.transaction_summary("alice", None, None).unwrap();
    assert_eq!(summary.total_income, 1000.0);
    assert_eq!(summary.total_expenses, 1299.0);
    assert_eq!(summary.balance, -299.0);
    assert_eq!(summary.transaction_count, 3);

    // Bounded to May 2024: the 2023 expense falls out
    let summary = db
        .transaction_summary(
            "alice",
            chrono::NaiveDate::from_ymd_opt(2024, 5, 1),
            chrono::NaiveDate::from_ymd_opt(2024, 5, 31),
        )
        .unwrap();
    assert_eq!(summary.total_income, 1000.0);
    assert_eq!(summary.total_expenses, 300.0);
    assert_eq!(summary.balance, 700.0);
    assert_eq!(summary.transaction_count, 2);
    assert_eq!(summary.by_category.len(), 1);
    assert_eq!(summary.by_category[0].category, "Rent");
    assert_eq!(summary.by_category[0].amount, 300.0);
}

fn sample_reminder(owner: &str, title: &str, due: chrono::NaiveDate) -> NewReminder {
    NewReminder {
        owner: owner.to_string(),
        title: title.to_string(),
        description: None,
        due_date: due,
        reminder_type: ReminderType::Payment,
        priority: ReminderPriority::Medium,
        amount: Some(120.0),
    }
}

#[test]
fn test_reminder_create_list_sorted_by_due_date() {
    let db = test_db();
    let later = chrono::NaiveDate::from_ymd_opt(2024, 9, 15).unwrap();
    let sooner = chrono::NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();

    db.create_reminder(&sample_reminder("alice", "Car insurance", later))
        .unwrap();
    db.create_reminder(&sample_reminder("alice", "Rent", sooner))
        .unwrap();
    db.create_reminder(&sample_reminder("bob", "Taxes", sooner))
        .unwrap();

    let reminders = db.list_reminders("alice", None, None).unwrap();
    assert_eq!(reminders.len(), 2);
    // Earliest due date first
    assert_eq!(reminders[0].title, "Rent");
    assert_eq!(reminders[1].title, "Car insurance");
    assert_eq!(reminders[0].status, ReminderStatus::Pending);
}

#[test]
fn test_reminder_filters() {
    let db = test_db();
    let due = chrono::NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();

    let id = db
        .create_reminder(&sample_reminder("alice", "Rent", due))
        .unwrap();
    let mut tax = sample_reminder("alice", "Quarterly taxes", due);
    tax.reminder_type = ReminderType::Tax;
    db.create_reminder(&tax).unwrap();

    db.update_reminder(
        id,
        "alice",
        &ReminderUpdate {
            status: Some(ReminderStatus::Completed),
            ..Default::default()
        },
    )
    .unwrap();

    let pending = db
        .list_reminders("alice", Some(ReminderStatus::Pending), None)
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].title, "Quarterly taxes");

    let taxes = db
        .list_reminders("alice", None, Some(ReminderType::Tax))
        .unwrap();
    assert_eq!(taxes.len(), 1);

    let completed_taxes = db
        .list_reminders("alice", Some(ReminderStatus::Completed), Some(ReminderType::Tax))
        .unwrap();
    assert!(completed_taxes.is_empty());
}

#[test]
fn test_reminder_update_and_validation() {
    let db = test_db();
    let due = chrono::NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
    let id = db
        .create_reminder(&sample_reminder("alice", "Rent", due))
        .unwrap();

    let moved = chrono::NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
    let updated = db
        .update_reminder(
            id,
            "alice",
            &ReminderUpdate {
                due_date: Some(moved),
                priority: Some(ReminderPriority::High),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.due_date, moved);
    assert_eq!(updated.priority, ReminderPriority::High);
    assert_eq!(updated.title, "Rent");
    assert_eq!(updated.amount, Some(120.0));

    // Blank titles and negative amounts are rejected
    let mut blank = sample_reminder("alice", "  ", due);
    blank.amount = None;
    assert!(matches!(
        db.create_reminder(&blank),
        Err(Error::InvalidData(_))
    ));
    assert!(matches!(
        db.update_reminder(
            id,
            "alice",
            &ReminderUpdate {
                amount: Some(-5.0),
                ..Default::default()
            }
        ),
        Err(Error::InvalidData(_))
    ));

    // Wrong owner cannot touch it
    assert!(matches!(
        db.update_reminder(id, "bob", &ReminderUpdate::default()),
        Err(Error::NotFound(_))
    ));

    assert!(db.delete_reminder(id, "alice").unwrap());
    assert!(db.get_reminder_for_owner(id, "alice").unwrap().is_none());
}

#[test]
fn test_totals_and_net_balance() {
    let db = test_db();
    let mut income = sample_transaction("alice", 1000.0, "Salary");
    income.tx_type = TransactionType::Income;
    db.create_transaction(&income).unwrap();
    db.create_transaction(&sample_transaction("alice", 300.0, "Rent"))
        .unwrap();
    db.create_document(&sample_document("alice")).unwrap();

    // Other owners don't leak in
    db.create_transaction(&sample_transaction("bob", 9999.0, "Rent"))
        .unwrap();

    let totals = db.totals("alice").unwrap();
    assert_eq!(totals.total_income, 1000.0);
    assert_eq!(totals.total_expenses, 300.0);
    assert_eq!(totals.net_balance, 700.0);
    assert_eq!(totals.document_count, 1);
}

#[test]
fn test_monthly_performance_is_complete_and_ordered() {
    let db = test_db();
    db.create_transaction(&sample_transaction("alice", 120.0, "Food"))
        .unwrap();

    let months = db.monthly_performance(Some("alice")).unwrap();
    assert_eq!(months.len(), 6);

    // Strictly increasing month keys, current month last
    for pair in months.windows(2) {
        assert!(pair[0].month < pair[1].month);
    }
    let now = Utc::now().date_naive();
    let current_key = format!("{:04}-{:02}", now.year(), now.month());
    assert_eq!(months[5].month, current_key);

    // Only the current month has activity; the rest are zero-filled
    assert_eq!(months[5].expenses, 120.0);
    assert_eq!(months[5].profit, -120.0);
    for m in &months[..5] {
        assert_eq!(m.income, 0.0);
        assert_eq!(m.expenses, 0.0);
        assert_eq!(m.profit, 0.0);
    }
}

#[test]
fn test_category_distribution_sorted_descending() {
    let db = test_db();
    db.create_transaction(&sample_transaction("alice", 50.0, "Food"))
        .unwrap();
    db.create_transaction(&sample_transaction("alice", 200.0, "Rent"))
        .unwrap();
    db.create_transaction(&sample_transaction("alice", 10.0, "Gas"))
        .unwrap();

    // Income must not appear in the expense breakdown
    let mut income = sample_transaction("alice", 5000.0, "Salary");
    income.tx_type = TransactionType::Income;
    db.create_transaction(&income).unwrap();

    let dist = db.category_distribution("alice").unwrap();
    let amounts: Vec<f64> = dist.iter().map(|c| c.amount).collect();
    assert_eq!(amounts, vec![200.0, 50.0, 10.0]);
    assert_eq!(dist[0].category, "Rent");
    assert!(dist.iter().all(|c| c.category != "Salary"));
}

#[test]
fn test_analytics_summary_recent_limit() {
    let db = test_db();
    for i in 0..15 {
        db.create_transaction(&sample_transaction("alice", 1.0 + i as f64, "Food"))
            .unwrap();
    }

    let summary = db.analytics_summary("alice").unwrap();
    assert_eq!(summary.recent_transactions.len(), 10);
    assert_eq!(summary.totals.total_expenses, (1..=15).map(|i| i as f64).sum::<f64>());
}

#[test]
fn test_admin_dashboard_counts_and_shares() {
    let db = test_db();
    db.create_document(&sample_document("alice")).unwrap();
    db.create_transaction(&sample_transaction("alice", 75.0, "Food"))
        .unwrap();
    db.create_transaction(&sample_transaction("bob", 25.0, "Gas"))
        .unwrap();

    let tx_id = db
        .create_transaction(&sample_transaction("alice", 500.0, "Shopping"))
        .unwrap();
    db.create_anomaly(&NewAnomaly {
        owner: "alice".to_string(),
        transaction_id: tx_id,
        category: AnomalyCategory::UnusualAmount,
        severity: AnomalySeverity::High,
        description: "x".to_string(),
        risk_score: None,
        recommendation: None,
        ai_provider: None,
    })
    .unwrap();

    let dash = db.admin_dashboard().unwrap();
    assert_eq!(dash.total_owners, 2);
    assert_eq!(dash.total_documents, 1);
    assert_eq!(dash.total_transactions, 3);
    assert_eq!(dash.new_anomalies, 1);
    assert_eq!(dash.total_volume, 600.0);
    assert_eq!(dash.monthly_series.len(), 6);

    // Shares are rounded percentages of total volume, largest first
    assert_eq!(dash.top_categories[0].category, "Shopping");
    assert_eq!(dash.top_categories[0].percent, 83.0);
    assert_eq!(dash.top_categories[1].percent, 13.0);
    assert_eq!(dash.top_categories[2].percent, 4.0);
}

#[test]
fn test_admin_dashboard_empty_db() {
    let db = test_db();
    let dash = db.admin_dashboard().unwrap();
    assert_eq!(dash.total_owners, 0);
    assert_eq!(dash.total_volume, 0.0);
    assert!(dash.top_categories.is_empty());
    assert_eq!(dash.monthly_series.len(), 6);
}
