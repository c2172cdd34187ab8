//! Transaction operations

use rusqlite::{params, OptionalExtension};

use super::{parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::*;

const TRANSACTION_COLUMNS: &str = "id, owner, document_id, merchant, category, type,
        amount, currency, date, description, ai_confidence, created_at";

impl Database {
    /// Create a transaction
    pub fn create_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        if !tx.amount.is_finite() || tx.amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "Transaction amount must be non-negative, got {}",
                tx.amount
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transactions (owner, document_id, merchant, category, type,
             amount, currency, date, description, ai_confidence)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                tx.owner,
                tx.document_id,
                tx.merchant,
                tx.category,
                tx.tx_type.as_str(),
                tx.amount,
                tx.currency,
                tx.date.to_string(),
                tx.description,
                tx.ai_confidence,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        ))?;

        let tx = stmt
            .query_row(params![id], |row| Self::row_to_transaction(row))
            .optional()?;

        Ok(tx)
    }

    /// Get a transaction only if it belongs to the given owner
    pub fn get_transaction_for_owner(&self, id: i64, owner: &str) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE id = ? AND owner = ?",
            TRANSACTION_COLUMNS
        ))?;

        let tx = stmt
            .query_row(params![id, owner], |row| Self::row_to_transaction(row))
            .optional()?;

        Ok(tx)
    }

    /// Get the transaction materialized from a document, if any
    pub fn get_transaction_for_document(&self, document_id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE document_id = ?",
            TRANSACTION_COLUMNS
        ))?;

        let tx = stmt
            .query_row(params![document_id], |row| Self::row_to_transaction(row))
            .optional()?;

        Ok(tx)
    }

    /// List an owner's transactions, most recent first
    pub fn list_transactions(&self, owner: &str, limit: Option<u32>) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE owner = ?
             ORDER BY date DESC, id DESC LIMIT ?",
            TRANSACTION_COLUMNS
        ))?;

        let txs = stmt
            .query_map(params![owner, limit.unwrap_or(u32::MAX)], |row| {
                Self::row_to_transaction(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(txs)
    }

    /// Recent transaction history for anomaly context, most recent first.
    /// Excludes the transaction under evaluation so it cannot skew its
    /// own baseline.
    pub fn recent_transactions(
        &self,
        owner: &str,
        limit: u32,
        exclude: Option<i64>,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions
             WHERE owner = ? AND id != ?
             ORDER BY date DESC, id DESC LIMIT ?",
            TRANSACTION_COLUMNS
        ))?;

        let txs = stmt
            .query_map(params![owner, exclude.unwrap_or(-1), limit], |row| {
                Self::row_to_transaction(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(txs)
    }

    /// All of an owner's transactions on or after a date
    pub fn transactions_since(&self, owner: &str, since: chrono::NaiveDate) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions
             WHERE owner = ? AND date >= ?
             ORDER BY date DESC, id DESC",
            TRANSACTION_COLUMNS
        ))?;

        let txs = stmt
            .query_map(params![owner, since.to_string()], |row| {
                Self::row_to_transaction(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(txs)
    }

    /// Apply a partial update to a transaction. Missing fields keep
    /// their current value; the amount rule from creation still holds.
    pub fn update_transaction(
        &self,
        id: i64,
        owner: &str,
        update: &TransactionUpdate,
    ) -> Result<Transaction> {
        let current = self
            .get_transaction_for_owner(id, owner)?
            .ok_or_else(|| Error::NotFound(format!("Transaction {} not found", id)))?;

        let merchant = update.merchant.clone().unwrap_or(current.merchant);
        if merchant.trim().is_empty() {
            return Err(Error::InvalidData("Merchant is required".to_string()));
        }
        let category = update.category.clone().unwrap_or(current.category);
        if category.trim().is_empty() {
            return Err(Error::InvalidData("Category is required".to_string()));
        }
        let amount = update.amount.unwrap_or(current.amount);
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "Transaction amount must be non-negative, got {}",
                amount
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            "UPDATE transactions SET merchant = ?, category = ?, type = ?,
             amount = ?, currency = ?, date = ?, description = ?
             WHERE id = ? AND owner = ?",
            params![
                merchant.trim(),
                category.trim(),
                update.tx_type.unwrap_or(current.tx_type).as_str(),
                amount,
                update.currency.clone().unwrap_or(current.currency),
                update.date.unwrap_or(current.date).to_string(),
                update.description.clone().or(current.description),
                id,
                owner,
            ],
        )?;

        self.get_transaction_for_owner(id, owner)?
            .ok_or_else(|| Error::NotFound(format!("Transaction {} not found", id)))
    }

    /// Income/expense totals with an expense category breakdown,
    /// optionally bounded to a date window (inclusive on both ends)
    pub fn transaction_summary(
        &self,
        owner: &str,
        start: Option<chrono::NaiveDate>,
        end: Option<chrono::NaiveDate>,
    ) -> Result<TransactionSummary> {
        let conn = self.conn()?;

        let mut bounds = String::new();
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];
        if let Some(start) = start {
            bounds.push_str(" AND date >= ?");
            args.push(Box::new(start.to_string()));
        }
        if let Some(end) = end {
            bounds.push_str(" AND date <= ?");
            args.push(Box::new(end.to_string()));
        }

        let (total_income, total_expenses, transaction_count): (f64, f64, i64) = conn.query_row(
            &format!(
                "SELECT
                    COALESCE(SUM(CASE WHEN type = 'income' THEN amount ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0),
                    COUNT(*)
                 FROM transactions WHERE owner = ?{}",
                bounds
            ),
            rusqlite::params_from_iter(args.iter()),
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT category, COALESCE(SUM(amount), 0) AS total
             FROM transactions WHERE owner = ? AND type = 'expense'{}
             GROUP BY category ORDER BY total DESC",
            bounds
        ))?;
        let by_category = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                Ok(CategorySpending {
                    category: row.get(0)?,
                    amount: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(TransactionSummary {
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
            transaction_count,
            by_category,
        })
    }

    /// Delete a transaction. Its anomalies cascade.
    pub fn delete_transaction(&self, id: i64, owner: &str) -> Result<bool> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "DELETE FROM transactions WHERE id = ? AND owner = ?",
            params![id, owner],
        )?;
        Ok(affected > 0)
    }

    /// Helper to convert a row to Transaction
    fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let type_str: String = row.get(5)?;
        let date_str: String = row.get(8)?;
        let created_at_str: String = row.get(11)?;

        Ok(Transaction {
            id: row.get(0)?,
            owner: row.get(1)?,
            document_id: row.get(2)?,
            merchant: row.get(3)?,
            category: row.get(4)?,
            tx_type: type_str.parse().unwrap_or_default(),
            amount: row.get(6)?,
            currency: row.get(7)?,
            date: parse_date(&date_str),
            description: row.get(9)?,
            ai_confidence: row.get(10)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
