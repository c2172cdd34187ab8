//! Reminder operations

use rusqlite::{params, OptionalExtension};

use super::{parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::*;

const REMINDER_COLUMNS: &str = "id, owner, title, description, due_date, reminder_type,
        priority, status, amount, created_at";

impl Database {
    /// Create a reminder in `pending` status
    pub fn create_reminder(&self, reminder: &NewReminder) -> Result<i64> {
        if reminder.title.trim().is_empty() {
            return Err(Error::InvalidData("Reminder title is required".to_string()));
        }
        if let Some(amount) = reminder.amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(Error::InvalidData(format!(
                    "Reminder amount must be non-negative, got {}",
                    amount
                )));
            }
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO reminders (owner, title, description, due_date, reminder_type,
             priority, amount)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                reminder.owner,
                reminder.title.trim(),
                reminder.description,
                reminder.due_date.to_string(),
                reminder.reminder_type.as_str(),
                reminder.priority.as_str(),
                reminder.amount,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a reminder only if it belongs to the given owner
    pub fn get_reminder_for_owner(&self, id: i64, owner: &str) -> Result<Option<Reminder>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM reminders WHERE id = ? AND owner = ?",
            REMINDER_COLUMNS
        ))?;

        let reminder = stmt
            .query_row(params![id, owner], |row| Self::row_to_reminder(row))
            .optional()?;

        Ok(reminder)
    }

    /// List an owner's reminders, earliest due date first, with optional
    /// filters
    pub fn list_reminders(
        &self,
        owner: &str,
        status: Option<ReminderStatus>,
        reminder_type: Option<ReminderType>,
    ) -> Result<Vec<Reminder>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM reminders WHERE owner = ?", REMINDER_COLUMNS);
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];

        if let Some(status) = status {
            sql.push_str(" AND status = ?");
            args.push(Box::new(status.as_str().to_string()));
        }
        if let Some(reminder_type) = reminder_type {
            sql.push_str(" AND reminder_type = ?");
            args.push(Box::new(reminder_type.as_str().to_string()));
        }
        sql.push_str(" ORDER BY due_date ASC, id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let reminders = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                Self::row_to_reminder(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(reminders)
    }

    /// Apply a partial update to a reminder. Missing patch fields keep
    /// their current value.
    pub fn update_reminder(
        &self,
        id: i64,
        owner: &str,
        update: &ReminderUpdate,
    ) -> Result<Reminder> {
        let current = self
            .get_reminder_for_owner(id, owner)?
            .ok_or_else(|| Error::NotFound(format!("Reminder {} not found", id)))?;

        let title = update.title.clone().unwrap_or(current.title);
        if title.trim().is_empty() {
            return Err(Error::InvalidData("Reminder title is required".to_string()));
        }
        let amount = update.amount.or(current.amount);
        if let Some(amount) = amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(Error::InvalidData(format!(
                    "Reminder amount must be non-negative, got {}",
                    amount
                )));
            }
        }

        let conn = self.conn()?;
        conn.execute(
            "UPDATE reminders SET title = ?, description = ?, due_date = ?,
             reminder_type = ?, priority = ?, status = ?, amount = ?
             WHERE id = ? AND owner = ?",
            params![
                title.trim(),
                update.description.clone().or(current.description),
                update.due_date.unwrap_or(current.due_date).to_string(),
                update
                    .reminder_type
                    .unwrap_or(current.reminder_type)
                    .as_str(),
                update.priority.unwrap_or(current.priority).as_str(),
                update.status.unwrap_or(current.status).as_str(),
                amount,
                id,
                owner,
            ],
        )?;

        self.get_reminder_for_owner(id, owner)?
            .ok_or_else(|| Error::NotFound(format!("Reminder {} not found", id)))
    }

    /// Delete a reminder
    pub fn delete_reminder(&self, id: i64, owner: &str) -> Result<bool> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "DELETE FROM reminders WHERE id = ? AND owner = ?",
            params![id, owner],
        )?;
        Ok(affected > 0)
    }

    /// Helper to convert a row to Reminder
    fn row_to_reminder(row: &rusqlite::Row) -> rusqlite::Result<Reminder> {
        let due_date_str: String = row.get(4)?;
        let type_str: String = row.get(5)?;
        let priority_str: String = row.get(6)?;
        let status_str: String = row.get(7)?;
        let created_at_str: String = row.get(9)?;

        Ok(Reminder {
            id: row.get(0)?,
            owner: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            due_date: parse_date(&due_date_str),
            reminder_type: type_str.parse().unwrap_or_default(),
            priority: priority_str.parse().unwrap_or_default(),
            status: status_str.parse().unwrap_or_default(),
            amount: row.get(8)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
