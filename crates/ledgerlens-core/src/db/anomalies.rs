//! Anomaly operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::*;

const ANOMALY_COLUMNS: &str = "id, owner, transaction_id, category, severity, description,
        status, risk_score, recommendation, ai_provider, created_at";

impl Database {
    /// Create an anomaly in `new` status
    pub fn create_anomaly(&self, anomaly: &NewAnomaly) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO anomalies (owner, transaction_id, category, severity, description,
             risk_score, recommendation, ai_provider)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                anomaly.owner,
                anomaly.transaction_id,
                anomaly.category.as_str(),
                anomaly.severity.as_str(),
                anomaly.description,
                anomaly.risk_score,
                anomaly.recommendation,
                anomaly.ai_provider,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get an anomaly only if it belongs to the given owner
    pub fn get_anomaly_for_owner(&self, id: i64, owner: &str) -> Result<Option<Anomaly>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM anomalies WHERE id = ? AND owner = ?",
            ANOMALY_COLUMNS
        ))?;

        let anomaly = stmt
            .query_row(params![id, owner], |row| Self::row_to_anomaly(row))
            .optional()?;

        Ok(anomaly)
    }

    /// List an owner's anomalies, newest first, with optional filters
    pub fn list_anomalies(
        &self,
        owner: &str,
        status: Option<AnomalyStatus>,
        severity: Option<AnomalySeverity>,
    ) -> Result<Vec<Anomaly>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM anomalies WHERE owner = ?", ANOMALY_COLUMNS);
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];

        if let Some(status) = status {
            sql.push_str(" AND status = ?");
            args.push(Box::new(status.as_str().to_string()));
        }
        if let Some(severity) = severity {
            sql.push_str(" AND severity = ?");
            args.push(Box::new(severity.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let anomalies = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                Self::row_to_anomaly(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(anomalies)
    }

    /// Move an anomaly through the review workflow. Only `new` anomalies
    /// can move; reviewed states are frozen.
    pub fn update_anomaly_status(&self, id: i64, owner: &str, next: AnomalyStatus) -> Result<Anomaly> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current: String = tx
            .query_row(
                "SELECT status FROM anomalies WHERE id = ? AND owner = ?",
                params![id, owner],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Anomaly {} not found", id)))?;

        let current: AnomalyStatus = current.parse().map_err(Error::InvalidData)?;
        if !current.can_transition_to(next) {
            return Err(Error::InvalidData(format!(
                "Anomaly {} cannot move from {} to {}",
                id, current, next
            )));
        }

        tx.execute(
            "UPDATE anomalies SET status = ? WHERE id = ?",
            params![next.as_str(), id],
        )?;
        tx.commit()?;

        self.get_anomaly_for_owner(id, owner)?
            .ok_or_else(|| Error::NotFound(format!("Anomaly {} not found", id)))
    }

    /// Delete an anomaly
    pub fn delete_anomaly(&self, id: i64, owner: &str) -> Result<bool> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "DELETE FROM anomalies WHERE id = ? AND owner = ?",
            params![id, owner],
        )?;
        Ok(affected > 0)
    }

    /// Helper to convert a row to Anomaly
    fn row_to_anomaly(row: &rusqlite::Row) -> rusqlite::Result<Anomaly> {
        let category_str: String = row.get(3)?;
        let severity_str: String = row.get(4)?;
        let status_str: String = row.get(6)?;
        let created_at_str: String = row.get(10)?;

        Ok(Anomaly {
            id: row.get(0)?,
            owner: row.get(1)?,
            transaction_id: row.get(2)?,
            category: category_str.parse().unwrap_or(AnomalyCategory::Other),
            severity: severity_str.parse().unwrap_or(AnomalySeverity::Low),
            description: row.get(5)?,
            status: status_str.parse().unwrap_or_default(),
            risk_score: row.get(7)?,
            recommendation: row.get(8)?,
            ai_provider: row.get(9)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
