//! LedgerLens Core Library
//!
//! Shared functionality for the LedgerLens finance backend:
//! - Database access and migrations
//! - Pluggable AI providers (Gemini, OpenAI, mock)
//! - Text extraction from PDFs and receipt images
//! - Document processing pipeline (extract, structure, materialize)
//! - AI-backed anomaly detection
//! - Financial insights generation
//! - On-demand analytics aggregates

pub mod ai;
pub mod anomaly;
pub mod db;
pub mod error;
pub mod extract;
pub mod insights;
pub mod models;
pub mod pipeline;

pub use ai::{
    AiClient, AiProvider, AnomalyAssessment, AnomalyContext, ExtractedTransaction,
    GeminiProvider, MockFailure, MockProvider, OpenAiProvider, ProviderKind, RetryPolicy,
    SpendingSnapshot,
};
pub use anomaly::AnomalyDetector;
pub use db::Database;
pub use error::{Error, ExtractionError, Result};
pub use pipeline::DocumentProcessor;
