//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analytics;
pub mod anomalies;
pub mod auth;
pub mod documents;
pub mod reminders;
pub mod transactions;

// Re-export all handlers for use in router
pub use analytics::*;
pub use anomalies::*;
pub use auth::*;
pub use documents::*;
pub use reminders::*;
pub use transactions::*;
