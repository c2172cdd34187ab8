//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// LedgerLens - Receipt-to-ledger finance backend
#[derive(Parser)]
#[command(name = "ledgerlens")]
#[command(about = "Self-hosted receipt extraction and spending analytics", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a
        /// network. By default the server requires an owner identity
        /// header from the access gateway.
        #[arg(long)]
        no_auth: bool,

        /// Allowed CORS origin (repeatable)
        #[arg(long)]
        cors_origin: Vec<String>,

        /// Directory for uploaded files
        #[arg(long, default_value = "uploads")]
        uploads: PathBuf,
    },

    /// Show database status (path, size, record counts)
    Status,

    /// Run a receipt or invoice through the extraction pipeline
    Process {
        /// PDF or image file to process
        #[arg(short, long)]
        file: PathBuf,

        /// MIME type (guessed from the extension if not given)
        #[arg(long)]
        mime: Option<String>,

        /// Owner identity to record the document under
        #[arg(long, default_value = "local-dev")]
        owner: String,
    },

    /// List documents
    Documents {
        /// Filter by status: pending, processing, processed, failed
        #[arg(long)]
        status: Option<String>,

        /// Owner identity to list for
        #[arg(long, default_value = "local-dev")]
        owner: String,
    },

    /// Show the spending summary
    Summary {
        /// Owner identity to summarize
        #[arg(long, default_value = "local-dev")]
        owner: String,
    },

    /// Generate AI spending insights
    Insights {
        /// Owner identity to analyze
        #[arg(long, default_value = "local-dev")]
        owner: String,
    },
}
