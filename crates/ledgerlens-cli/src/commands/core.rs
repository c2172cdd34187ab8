//! Shared command utilities plus `init` and `status`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ledgerlens_core::db::Database;

/// Resolve the database path: an explicit --db wins, otherwise the
/// platform data directory (~/.local/share/ledgerlens on Linux).
pub fn resolve_db_path(db: Option<&Path>) -> PathBuf {
    match db {
        Some(path) => path.to_path_buf(),
        None => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ledgerlens")
            .join("ledgerlens.db"),
    }
}

/// Open the database, creating parent directories as needed
pub fn open_db(db: Option<&Path>) -> Result<Database> {
    let path = resolve_db_path(db);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let path_str = path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db: Option<&Path>) -> Result<()> {
    let path = resolve_db_path(db);
    println!("🔧 Initializing database at {}...", path.display());

    open_db(db)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Process a receipt: ledgerlens process --file receipt.pdf");
    println!("  2. Start the API: ledgerlens serve");

    Ok(())
}

pub fn cmd_status(db: Option<&Path>) -> Result<()> {
    let path = resolve_db_path(db);
    let database = open_db(db)?;

    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    let dashboard = database.admin_dashboard()?;

    println!("📦 LedgerLens Status");
    println!("   ─────────────────────────────");
    println!("   Database: {}", path.display());
    println!("   Size: {:.1} KB", size as f64 / 1024.0);
    println!("   Owners: {}", dashboard.total_owners);
    println!("   Documents: {}", dashboard.total_documents);
    println!("   Transactions: {}", dashboard.total_transactions);
    println!("   New anomalies: {}", dashboard.new_anomalies);
    println!("   Total volume: ${:.2}", dashboard.total_volume);

    Ok(())
}
