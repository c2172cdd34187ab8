//! Document listing

use std::path::Path;

use anyhow::Result;
use ledgerlens_core::models::DocumentStatus;

use super::open_db;

/// Column width for the file name, including the ellipsis
const NAME_WIDTH: usize = 27;

/// Shorten a filename to the column width. Counts characters, not
/// bytes, so multibyte names never split mid-character.
pub(crate) fn display_name(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH {
        return name.to_string();
    }
    let head: String = name.chars().take(NAME_WIDTH - 3).collect();
    format!("{}...", head)
}

pub fn cmd_documents_list(db: Option<&Path>, status: Option<&str>, owner: &str) -> Result<()> {
    let database = open_db(db)?;

    let status = status
        .map(|s| s.parse::<DocumentStatus>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;

    let docs = database.list_documents(owner, status, None)?;

    if docs.is_empty() {
        println!("No documents found.");
        return Ok(());
    }

    println!(
        "{:<6} {:<12} {:<28} {:>10} {:<14}",
        "ID", "STATUS", "FILE", "AMOUNT", "MERCHANT"
    );
    for doc in docs {
        let amount = doc
            .amount
            .map(|a| format!("{:.2}", a))
            .unwrap_or_else(|| "-".to_string());
        let merchant = doc.merchant.as_deref().unwrap_or("-");
        let name = display_name(&doc.original_name);
        println!(
            "{:<6} {:<12} {:<28} {:>10} {:<14}",
            doc.id,
            doc.status.as_str(),
            name,
            amount,
            merchant
        );
        if let Some(err) = &doc.error_message {
            println!("       ↳ {}", err);
        }
    }

    Ok(())
}
