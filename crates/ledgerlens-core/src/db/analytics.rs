//! On-demand analytics aggregates
//!
//! Nothing here is cached or precomputed. Every call runs fresh SQL so
//! the numbers always reflect the current ledger.

use chrono::{Datelike, Months, NaiveDate, Utc};
use rusqlite::params;

use super::Database;
use crate::error::Result;
use crate::models::*;

/// How many trailing months the monthly series covers (current month
/// included)
const MONTHLY_WINDOW: u32 = 6;

/// How many transactions the summary's recent list carries
const RECENT_LIMIT: u32 = 10;

/// How many categories the admin dashboard surfaces
const TOP_CATEGORY_LIMIT: usize = 5;

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Month keys for the trailing window, oldest first, current month last
fn trailing_month_keys() -> Vec<String> {
    let first_of_month = Utc::now()
        .date_naive()
        .with_day(1)
        .unwrap_or_else(|| Utc::now().date_naive());

    (0..MONTHLY_WINDOW)
        .rev()
        .map(|i| {
            first_of_month
                .checked_sub_months(Months::new(i))
                .unwrap_or(first_of_month)
        })
        .map(month_key)
        .collect()
}

/// First day of the oldest month in the trailing window
fn window_start() -> NaiveDate {
    let first_of_month = Utc::now()
        .date_naive()
        .with_day(1)
        .unwrap_or_else(|| Utc::now().date_naive());

    first_of_month
        .checked_sub_months(Months::new(MONTHLY_WINDOW - 1))
        .unwrap_or(first_of_month)
}

impl Database {
    /// Full analytics bundle for one owner
    pub fn analytics_summary(&self, owner: &str) -> Result<AnalyticsSummary> {
        Ok(AnalyticsSummary {
            totals: self.totals(owner)?,
            monthly_performance: self.monthly_performance(Some(owner))?,
            category_distribution: self.category_distribution(owner)?,
            recent_transactions: self.list_transactions(owner, Some(RECENT_LIMIT))?,
        })
    }

    /// All-time income/expense totals and document count for one owner
    pub fn totals(&self, owner: &str) -> Result<Totals> {
        let conn = self.conn()?;

        let (total_income, total_expenses): (f64, f64) = conn.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN type = 'income' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0)
             FROM transactions WHERE owner = ?",
            params![owner],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let document_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE owner = ?",
            params![owner],
            |row| row.get(0),
        )?;

        Ok(Totals {
            total_income,
            total_expenses,
            net_balance: total_income - total_expenses,
            document_count,
        })
    }

    /// Trailing six-month income/expense series, oldest first.
    ///
    /// Every month in the window appears, zero-filled when there is no
    /// activity, so charts never have gaps. Pass `None` for a
    /// cross-owner series.
    pub fn monthly_performance(&self, owner: Option<&str>) -> Result<Vec<MonthlyPerformance>> {
        let conn = self.conn()?;
        let since = window_start();

        let mut months: Vec<MonthlyPerformance> = trailing_month_keys()
            .into_iter()
            .map(|month| MonthlyPerformance {
                month,
                income: 0.0,
                expenses: 0.0,
                profit: 0.0,
            })
            .collect();

        let mut fill = |month: String, tx_type: String, total: f64| {
            if let Some(entry) = months.iter_mut().find(|m| m.month == month) {
                match tx_type.as_str() {
                    "income" => entry.income = total,
                    _ => entry.expenses = total,
                }
            }
        };

        if let Some(owner) = owner {
            let mut stmt = conn.prepare(
                "SELECT strftime('%Y-%m', date), type, COALESCE(SUM(amount), 0)
                 FROM transactions WHERE owner = ? AND date >= ?
                 GROUP BY 1, 2",
            )?;
            let rows = stmt.query_map(params![owner, since.to_string()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, f64>(2)?))
            })?;
            for row in rows {
                let (month, tx_type, total) = row?;
                fill(month, tx_type, total);
            }
        } else {
            let mut stmt = conn.prepare(
                "SELECT strftime('%Y-%m', date), type, COALESCE(SUM(amount), 0)
                 FROM transactions WHERE date >= ?
                 GROUP BY 1, 2",
            )?;
            let rows = stmt.query_map(params![since.to_string()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, f64>(2)?))
            })?;
            for row in rows {
                let (month, tx_type, total) = row?;
                fill(month, tx_type, total);
            }
        }

        for entry in &mut months {
            entry.profit = entry.income - entry.expenses;
        }

        Ok(months)
    }

    /// Expense totals per category, largest first
    pub fn category_distribution(&self, owner: &str) -> Result<Vec<CategorySpending>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT category, COALESCE(SUM(amount), 0) AS total
             FROM transactions WHERE owner = ? AND type = 'expense'
             GROUP BY category ORDER BY total DESC",
        )?;

        let categories = stmt
            .query_map(params![owner], |row| {
                Ok(CategorySpending {
                    category: row.get(0)?,
                    amount: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Cross-owner operational stats
    pub fn admin_dashboard(&self) -> Result<AdminDashboard> {
        let conn = self.conn()?;

        let total_owners: i64 = conn.query_row(
            "SELECT COUNT(*) FROM (
                SELECT owner FROM documents UNION SELECT owner FROM transactions
             )",
            [],
            |row| row.get(0),
        )?;
        let total_documents: i64 =
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        let total_transactions: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        let new_anomalies: i64 = conn.query_row(
            "SELECT COUNT(*) FROM anomalies WHERE status = 'new'",
            [],
            |row| row.get(0),
        )?;
        let total_volume: f64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM transactions",
            [],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT category, COALESCE(SUM(amount), 0) AS total
             FROM transactions GROUP BY category ORDER BY total DESC",
        )?;
        let totals = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let top_categories = totals
            .into_iter()
            .take(TOP_CATEGORY_LIMIT)
            .map(|(category, amount)| CategoryShare {
                category,
                percent: if total_volume > 0.0 {
                    (amount / total_volume * 100.0).round()
                } else {
                    0.0
                },
            })
            .collect();

        Ok(AdminDashboard {
            total_owners,
            total_documents,
            total_transactions,
            new_anomalies,
            total_volume,
            monthly_series: self.monthly_performance(None)?,
            top_categories,
        })
    }
}
