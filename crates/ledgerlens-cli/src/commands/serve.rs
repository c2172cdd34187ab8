//! Server command implementation

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::open_db;

pub async fn cmd_serve(
    db: Option<&Path>,
    host: &str,
    port: u16,
    no_auth: bool,
    cors_origins: Vec<String>,
    uploads: PathBuf,
) -> Result<()> {
    println!("🚀 Starting LedgerLens API server...");
    println!("   Database: {}", super::resolve_db_path(db).display());
    println!("   Uploads: {}", uploads.display());
    println!("   Listening: http://{}:{}", host, port);

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        println!("   🔒 Authentication: owner identity header required");
        println!("      (x-ledgerlens-user or cf-access-authenticated-user-email)");
    }
    if !cors_origins.is_empty() {
        println!("   🌐 CORS origins: {}", cors_origins.join(", "));
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let database = open_db(db)?;

    let config = ledgerlens_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins: cors_origins,
    };

    ledgerlens_server::serve_with_options(database, host, port, config, Some(uploads)).await?;

    Ok(())
}
