//! Command implementations
//!
//! Each command gets its own module. Shared utilities (database opening,
//! path resolution) live in `core`.

pub(crate) mod analytics;
pub(crate) mod core;
pub(crate) mod documents;
pub(crate) mod process;
pub(crate) mod serve;

pub use analytics::{cmd_insights, cmd_summary};
pub use core::{cmd_init, cmd_status, open_db, resolve_db_path};
pub use documents::cmd_documents_list;
pub use process::cmd_process;
pub use serve::cmd_serve;
