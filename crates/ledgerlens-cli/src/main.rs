//! LedgerLens CLI - Receipt-to-ledger finance backend
//!
//! Usage:
//!   ledgerlens init                  Initialize database
//!   ledgerlens process --file f.pdf  Extract a receipt into a transaction
//!   ledgerlens summary               Show the spending summary
//!   ledgerlens serve --port 3000     Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(cli.db.as_deref()),
        Commands::Serve {
            port,
            host,
            no_auth,
            cors_origin,
            uploads,
        } => {
            commands::cmd_serve(cli.db.as_deref(), &host, port, no_auth, cors_origin, uploads).await
        }
        Commands::Status => commands::cmd_status(cli.db.as_deref()),
        Commands::Process { file, mime, owner } => {
            commands::cmd_process(cli.db.as_deref(), &file, mime.as_deref(), &owner).await
        }
        Commands::Documents { status, owner } => {
            commands::cmd_documents_list(cli.db.as_deref(), status.as_deref(), &owner)
        }
        Commands::Summary { owner } => commands::cmd_summary(cli.db.as_deref(), &owner),
        Commands::Insights { owner } => commands::cmd_insights(cli.db.as_deref(), &owner).await,
    }
}
