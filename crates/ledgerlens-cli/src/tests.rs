//! CLI command tests

use std::path::{Path, PathBuf};

use chrono::Utc;
use ledgerlens_core::models::{NewDocument, NewTransaction, TransactionType};

use crate::commands::{self, documents::display_name, process::guess_mime};

fn temp_db_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("ledgerlens.db")
}

fn seed_transaction(db_path: &Path, merchant: &str, amount: f64) {
    let db = commands::open_db(Some(db_path)).unwrap();
    db.create_transaction(&NewTransaction {
        owner: "local-dev".to_string(),
        document_id: None,
        merchant: merchant.to_string(),
        category: "Groceries".to_string(),
        tx_type: TransactionType::Expense,
        amount,
        currency: "USD".to_string(),
        date: Utc::now().date_naive(),
        description: None,
        ai_confidence: None,
    })
    .unwrap();
}

#[test]
fn test_resolve_db_path_explicit_wins() {
    let explicit = Path::new("/tmp/custom.db");
    assert_eq!(
        commands::resolve_db_path(Some(explicit)),
        PathBuf::from("/tmp/custom.db")
    );

    // Default lands under a ledgerlens data directory
    let default = commands::resolve_db_path(None);
    assert!(default.ends_with("ledgerlens/ledgerlens.db"));
}

#[test]
fn test_open_db_creates_parent_directories() {
    let dir = tempfile::TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b").join("ledgerlens.db");
    let db = commands::open_db(Some(&nested)).unwrap();
    assert!(db.conn().is_ok());
    assert!(nested.exists());
}

#[test]
fn test_guess_mime() {
    assert_eq!(guess_mime(Path::new("receipt.pdf")), Some("application/pdf"));
    assert_eq!(guess_mime(Path::new("scan.PNG")), Some("image/png"));
    assert_eq!(guess_mime(Path::new("photo.jpeg")), Some("image/jpeg"));
    assert_eq!(guess_mime(Path::new("photo.jpg")), Some("image/jpeg"));
    assert_eq!(guess_mime(Path::new("notes.txt")), None);
    assert_eq!(guess_mime(Path::new("noextension")), None);
}

#[test]
fn test_cmd_init_and_status() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = temp_db_path(&dir);

    assert!(commands::cmd_init(Some(&path)).is_ok());
    assert!(commands::cmd_status(Some(&path)).is_ok());
}

#[test]
fn test_cmd_documents_list_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = temp_db_path(&dir);

    assert!(commands::cmd_documents_list(Some(&path), None, "local-dev").is_ok());
}

#[test]
fn test_display_name_keeps_short_names() {
    assert_eq!(display_name("receipt.png"), "receipt.png");
    assert_eq!(display_name(&"x".repeat(27)), "x".repeat(27));
}

#[test]
fn test_display_name_truncates_on_character_boundaries() {
    // Byte-indexed truncation would land inside a multibyte character
    // here and panic; character-indexed truncation must not
    let name = format!("abc{}.pdf", "é".repeat(30));
    let shown = display_name(&name);
    assert_eq!(shown.chars().count(), 27);
    assert!(shown.ends_with("..."));

    let accents = "é".repeat(40);
    assert_eq!(display_name(&accents).chars().count(), 27);
}

#[test]
fn test_cmd_documents_list_with_multibyte_name() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = temp_db_path(&dir);

    let db = commands::open_db(Some(&path)).unwrap();
    db.create_document(&NewDocument {
        owner: "local-dev".to_string(),
        original_name: format!("reçu-{}.pdf", "é".repeat(30)),
        file_path: "/tmp/uploads/recu.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        size_bytes: 512,
        content_hash: "deadbeef".to_string(),
    })
    .unwrap();

    assert!(commands::cmd_documents_list(Some(&path), None, "local-dev").is_ok());
}

#[test]
fn test_cmd_documents_list_rejects_bad_status() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = temp_db_path(&dir);

    let result = commands::cmd_documents_list(Some(&path), Some("archived"), "local-dev");
    assert!(result.is_err());
}

#[test]
fn test_cmd_summary_with_data() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = temp_db_path(&dir);

    seed_transaction(&path, "Walmart", 45.20);
    seed_transaction(&path, "Shell", 30.00);

    assert!(commands::cmd_summary(Some(&path), "local-dev").is_ok());
}
