//! Pluggable AI provider abstraction
//!
//! # Architecture
//!
//! - `AiProvider` trait: defines the interface for all AI operations
//! - `AiClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Provider implementations: `GeminiProvider`, `OpenAiProvider`, `MockProvider`
//!
//! # Configuration
//!
//! Environment variables:
//! - `LEDGERLENS_AI_PROVIDER`: Force a provider (gemini, openai, mock). Optional.
//! - `GEMINI_API_KEY` / `GEMINI_MODEL`: Gemini credentials and model override
//! - `OPENAI_API_KEY` / `OPENAI_MODEL`: OpenAI credentials and model override
//!
//! Without an override, the first provider with credentials wins: Gemini,
//! then OpenAI. `from_env` returns None when nothing is configured; the
//! rest of the system treats that as "AI features disabled".

mod gemini;
mod mock;
mod openai;
pub mod parsing;
pub mod prompts;
pub mod retry;
pub mod types;

pub use gemini::GeminiProvider;
pub use mock::{MockFailure, MockProvider};
pub use openai::OpenAiProvider;
pub use retry::{retry_on_overload, RetryPolicy};
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all AI providers
///
/// Providers must be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// OCR a receipt/invoice image into raw text
    async fn extract_text(&self, image: &[u8], mime_type: &str) -> Result<String>;

    /// Turn raw receipt text into a structured transaction
    async fn extract_structured(&self, text: &str) -> Result<ExtractedTransaction>;

    /// Assess one transaction against its spending baseline
    async fn assess_anomaly(&self, ctx: &AnomalyContext) -> Result<AnomalyAssessment>;

    /// Generate plain-language insights from a spending digest
    async fn generate_insights(&self, snapshot: &SpendingSnapshot) -> Result<Vec<String>>;

    /// Embed text into a vector (for similarity features)
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> bool;

    /// Which provider this is (recorded on documents and anomalies)
    fn name(&self) -> ProviderKind;

    /// Get the model name (for logging)
    fn model(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AiClient {
    /// Google Gemini (REST API)
    Gemini(GeminiProvider),
    /// OpenAI (chat completions + embeddings)
    OpenAi(OpenAiProvider),
    /// Mock provider for testing
    Mock(MockProvider),
}

impl AiClient {
    /// Create an AI client from environment variables
    ///
    /// `LEDGERLENS_AI_PROVIDER` forces a specific provider. Otherwise
    /// the first configured provider wins: Gemini, then OpenAI.
    /// Returns None when no provider has credentials.
    pub fn from_env() -> Option<Self> {
        if let Ok(forced) = std::env::var("LEDGERLENS_AI_PROVIDER") {
            return match forced.to_lowercase().as_str() {
                "gemini" => GeminiProvider::from_env().map(AiClient::Gemini),
                "openai" => OpenAiProvider::from_env().map(AiClient::OpenAi),
                "mock" => Some(AiClient::Mock(MockProvider::new())),
                other => {
                    tracing::warn!(provider = %other, "Unknown LEDGERLENS_AI_PROVIDER, AI disabled");
                    None
                }
            };
        }

        GeminiProvider::from_env()
            .map(AiClient::Gemini)
            .or_else(|| OpenAiProvider::from_env().map(AiClient::OpenAi))
    }

    /// Create a mock client for testing
    pub fn mock() -> Self {
        AiClient::Mock(MockProvider::new())
    }

    /// Wrap a pre-configured mock (for scripted test scenarios)
    pub fn mock_with(provider: MockProvider) -> Self {
        AiClient::Mock(provider)
    }
}

// Implement AiProvider for AiClient by delegating to the inner provider
#[async_trait]
impl AiProvider for AiClient {
    async fn extract_text(&self, image: &[u8], mime_type: &str) -> Result<String> {
        match self {
            AiClient::Gemini(p) => p.extract_text(image, mime_type).await,
            AiClient::OpenAi(p) => p.extract_text(image, mime_type).await,
            AiClient::Mock(p) => p.extract_text(image, mime_type).await,
        }
    }

    async fn extract_structured(&self, text: &str) -> Result<ExtractedTransaction> {
        match self {
            AiClient::Gemini(p) => p.extract_structured(text).await,
            AiClient::OpenAi(p) => p.extract_structured(text).await,
            AiClient::Mock(p) => p.extract_structured(text).await,
        }
    }

    async fn assess_anomaly(&self, ctx: &AnomalyContext) -> Result<AnomalyAssessment> {
        match self {
            AiClient::Gemini(p) => p.assess_anomaly(ctx).await,
            AiClient::OpenAi(p) => p.assess_anomaly(ctx).await,
            AiClient::Mock(p) => p.assess_anomaly(ctx).await,
        }
    }

    async fn generate_insights(&self, snapshot: &SpendingSnapshot) -> Result<Vec<String>> {
        match self {
            AiClient::Gemini(p) => p.generate_insights(snapshot).await,
            AiClient::OpenAi(p) => p.generate_insights(snapshot).await,
            AiClient::Mock(p) => p.generate_insights(snapshot).await,
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self {
            AiClient::Gemini(p) => p.embed(text).await,
            AiClient::OpenAi(p) => p.embed(text).await,
            AiClient::Mock(p) => p.embed(text).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AiClient::Gemini(p) => p.health_check().await,
            AiClient::OpenAi(p) => p.health_check().await,
            AiClient::Mock(p) => p.health_check().await,
        }
    }

    fn name(&self) -> ProviderKind {
        match self {
            AiClient::Gemini(p) => p.name(),
            AiClient::OpenAi(p) => p.name(),
            AiClient::Mock(p) => p.name(),
        }
    }

    fn model(&self) -> &str {
        match self {
            AiClient::Gemini(p) => p.model(),
            AiClient::OpenAi(p) => p.model(),
            AiClient::Mock(p) => p.model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_delegates_to_mock() {
        let client = AiClient::mock();
        assert_eq!(client.name(), ProviderKind::Mock);
        assert_eq!(client.model(), "mock");
        assert!(client.health_check().await);

        let tx = client.extract_structured("receipt text").await.unwrap();
        assert_eq!(tx.merchant, "Walmart");
    }

    #[tokio::test]
    async fn test_unhealthy_mock_reports_down() {
        let client = AiClient::mock_with(MockProvider::unhealthy());
        assert!(!client.health_check().await);
    }
}
