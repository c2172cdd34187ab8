//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `documents` - Uploaded document lifecycle and extraction results
//! - `transactions` - Transaction CRUD and history windows
//! - `anomalies` - Anomaly records and the review workflow
//! - `reminders` - Upcoming payment reminders
//! - `analytics` - On-demand aggregates (totals, monthly series, dashboard)

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::Result;

mod analytics;
mod anomalies;
mod documents;
mod reminders;
mod transactions;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a SQLite date string into a NaiveDate, falling back to today
pub(crate) fn parse_date(s: &str) -> chrono::NaiveDate {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool
    pub fn new(path: &str) -> Result<Self> {
        // Foreign keys are per-connection in SQLite, so set the pragma on
        // every connection the pool hands out. The document -> transaction
        // -> anomaly cascade depends on it.
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });

        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because each
    /// pooled connection would otherwise see its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!("/tmp/ledgerlens_test_{}_{}.db", std::process::id(), id);

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Uploaded receipts and invoices
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY,
                owner TEXT NOT NULL,
                original_name TEXT NOT NULL,
                file_path TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'pending',    -- pending, processing, processed, failed
                merchant TEXT,
                category TEXT,
                amount REAL,
                currency TEXT,
                transaction_date DATE,
                extracted_text TEXT,
                ai_provider TEXT,
                confidence REAL,
                error_message TEXT,
                content_hash TEXT,                         -- SHA-256 of upload bytes
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner, created_at);
            CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);
            CREATE INDEX IF NOT EXISTS idx_documents_hash ON documents(owner, content_hash);

            -- Transactions (materialized from documents or entered manually)
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                owner TEXT NOT NULL,
                document_id INTEGER REFERENCES documents(id) ON DELETE CASCADE,
                merchant TEXT NOT NULL,
                category TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                amount REAL NOT NULL CHECK (amount >= 0),
                currency TEXT NOT NULL DEFAULT 'USD',
                date DATE NOT NULL,
                description TEXT,
                ai_confidence REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_owner_date ON transactions(owner, date);
            CREATE INDEX IF NOT EXISTS idx_transactions_owner_category ON transactions(owner, category);
            CREATE INDEX IF NOT EXISTS idx_transactions_document ON transactions(document_id);

            -- Anomalies (AI-flagged irregularities)
            CREATE TABLE IF NOT EXISTS anomalies (
                id INTEGER PRIMARY KEY,
                owner TEXT NOT NULL,
                transaction_id INTEGER NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
                category TEXT NOT NULL,                    -- unusual_amount, duplicate, ...
                severity TEXT NOT NULL,                    -- low, medium, high
                description TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'new',        -- new, reviewed, resolved, ignored
                risk_score REAL,
                recommendation TEXT,
                ai_provider TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_anomalies_owner_status ON anomalies(owner, status);
            CREATE INDEX IF NOT EXISTS idx_anomalies_transaction ON anomalies(transaction_id);

            -- Payment reminders (manually created, surfaced by due date)
            CREATE TABLE IF NOT EXISTS reminders (
                id INTEGER PRIMARY KEY,
                owner TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                due_date DATE NOT NULL,
                reminder_type TEXT NOT NULL DEFAULT 'other',   -- payment, tax, subscription, insurance, other
                priority TEXT NOT NULL DEFAULT 'medium',       -- low, medium, high
                status TEXT NOT NULL DEFAULT 'pending',        -- pending, completed, dismissed
                amount REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_reminders_owner_due ON reminders(owner, due_date);
            CREATE INDEX IF NOT EXISTS idx_reminders_owner_status ON reminders(owner, status);
            "#,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
