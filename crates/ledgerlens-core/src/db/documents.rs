//! Document operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::ai::ExtractedTransaction;
use crate::error::{Error, Result};
use crate::models::*;

const DOCUMENT_COLUMNS: &str = "id, owner, original_name, file_path, mime_type, size_bytes,
        status, merchant, category, amount, currency, transaction_date,
        extracted_text, ai_provider, confidence, error_message, content_hash, created_at";

impl Database {
    /// Create a document record in `pending` status
    pub fn create_document(&self, doc: &NewDocument) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO documents (owner, original_name, file_path, mime_type, size_bytes, content_hash)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                doc.owner,
                doc.original_name,
                doc.file_path,
                doc.mime_type,
                doc.size_bytes,
                doc.content_hash,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get document by ID
    pub fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents WHERE id = ?",
            DOCUMENT_COLUMNS
        ))?;

        let doc = stmt
            .query_row(params![id], |row| Self::row_to_document(row))
            .optional()?;

        Ok(doc)
    }

    /// Get a document only if it belongs to the given owner
    pub fn get_document_for_owner(&self, id: i64, owner: &str) -> Result<Option<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents WHERE id = ? AND owner = ?",
            DOCUMENT_COLUMNS
        ))?;

        let doc = stmt
            .query_row(params![id, owner], |row| Self::row_to_document(row))
            .optional()?;

        Ok(doc)
    }

    /// Find an earlier upload with the same content hash (for duplicate
    /// detection, scoped per owner)
    pub fn find_document_by_hash(&self, owner: &str, content_hash: &str) -> Result<Option<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents WHERE owner = ? AND content_hash = ?",
            DOCUMENT_COLUMNS
        ))?;

        let doc = stmt
            .query_row(params![owner, content_hash], |row| Self::row_to_document(row))
            .optional()?;

        Ok(doc)
    }

    /// List an owner's documents, newest first, optionally filtered by
    /// status and a name/merchant substring
    pub fn list_documents(
        &self,
        owner: &str,
        status: Option<DocumentStatus>,
        search: Option<&str>,
    ) -> Result<Vec<Document>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM documents WHERE owner = ?", DOCUMENT_COLUMNS);
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];

        if let Some(status) = status {
            sql.push_str(" AND status = ?");
            args.push(Box::new(status.as_str().to_string()));
        }
        if let Some(search) = search {
            sql.push_str(" AND (original_name LIKE ? OR merchant LIKE ?)");
            let pattern = format!("%{}%", search);
            args.push(Box::new(pattern.clone()));
            args.push(Box::new(pattern));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let docs = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                Self::row_to_document(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(docs)
    }

    /// Move a document to a new status, enforcing forward-only transitions
    pub fn update_document_status(&self, id: i64, next: DocumentStatus) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current: String = tx
            .query_row("SELECT status FROM documents WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Document {} not found", id)))?;

        let current: DocumentStatus = current
            .parse()
            .map_err(Error::InvalidData)?;
        if !current.can_transition_to(next) {
            return Err(Error::InvalidData(format!(
                "Document {} cannot move from {} to {}",
                id, current, next
            )));
        }

        tx.execute(
            "UPDATE documents SET status = ? WHERE id = ?",
            params![next.as_str(), id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Record a successful extraction: merge the structured fields, keep
    /// the raw text, and move the document to `processed`
    pub fn apply_extraction(
        &self,
        id: i64,
        extracted: &ExtractedTransaction,
        raw_text: &str,
        provider: &str,
        confidence: Option<f64>,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current: String = tx
            .query_row("SELECT status FROM documents WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Document {} not found", id)))?;

        let current: DocumentStatus = current.parse().map_err(Error::InvalidData)?;
        if !current.can_transition_to(DocumentStatus::Processed) {
            return Err(Error::InvalidData(format!(
                "Document {} cannot move from {} to processed",
                id, current
            )));
        }

        tx.execute(
            "UPDATE documents SET
                status = 'processed',
                merchant = ?, category = ?, amount = ?, currency = ?,
                transaction_date = ?, extracted_text = ?, ai_provider = ?,
                confidence = ?, error_message = NULL
             WHERE id = ?",
            params![
                extracted.merchant,
                extracted.category,
                extracted.amount,
                extracted.currency,
                extracted.date.to_string(),
                raw_text,
                provider,
                confidence,
                id,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Record a terminal failure with its reason
    pub fn mark_document_failed(&self, id: i64, message: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current: String = tx
            .query_row("SELECT status FROM documents WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Document {} not found", id)))?;

        let current: DocumentStatus = current.parse().map_err(Error::InvalidData)?;
        if !current.can_transition_to(DocumentStatus::Failed) {
            return Err(Error::InvalidData(format!(
                "Document {} cannot move from {} to failed",
                id, current
            )));
        }

        tx.execute(
            "UPDATE documents SET status = 'failed', error_message = ? WHERE id = ?",
            params![message, id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a document. Materialized transactions and their anomalies
    /// go with it via ON DELETE CASCADE.
    pub fn delete_document(&self, id: i64, owner: &str) -> Result<bool> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "DELETE FROM documents WHERE id = ? AND owner = ?",
            params![id, owner],
        )?;
        Ok(affected > 0)
    }

    /// Helper to convert a row to Document
    fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
        let status_str: String = row.get(6)?;
        let tx_date_str: Option<String> = row.get(11)?;
        let created_at_str: String = row.get(17)?;

        Ok(Document {
            id: row.get(0)?,
            owner: row.get(1)?,
            original_name: row.get(2)?,
            file_path: row.get(3)?,
            mime_type: row.get(4)?,
            size_bytes: row.get(5)?,
            status: status_str.parse().unwrap_or_default(),
            merchant: row.get(7)?,
            category: row.get(8)?,
            amount: row.get(9)?,
            currency: row.get(10)?,
            transaction_date: tx_date_str
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            extracted_text: row.get(12)?,
            ai_provider: row.get(13)?,
            confidence: row.get(14)?,
            error_message: row.get(15)?,
            content_hash: row.get(16)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
