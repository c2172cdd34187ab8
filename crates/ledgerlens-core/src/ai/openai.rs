//! OpenAI provider
//!
//! Uses the chat completions API for text and vision operations (images
//! travel as base64 data URIs) and the embeddings API for vectors.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::parsing;
use super::prompts;
use super::types::*;
use super::AiProvider;
use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";

#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    embed_model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
        }
    }

    /// Create from environment. Requires `OPENAI_API_KEY`; model comes
    /// from `OPENAI_MODEL` when set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self::new(&api_key, &model))
    }

    /// Override the base URL (for tests or compatible servers)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Send one user message and return the completion text
    async fn chat(&self, content: serde_json::Value) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        debug!(model = %self.model, response_len = text.len(), "OpenAI response received");

        if text.trim().is_empty() {
            return Err(Error::InvalidData(
                "Empty response from OpenAI".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn extract_text(&self, image: &[u8], mime_type: &str) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let data_uri = format!("data:{};base64,{}", mime_type, encoded);

        self.chat(json!([
            { "type": "text", "text": prompts::OCR_INSTRUCTION },
            { "type": "image_url", "image_url": { "url": data_uri } }
        ]))
        .await
    }

    async fn extract_structured(&self, text: &str) -> Result<ExtractedTransaction> {
        let response = self.chat(json!(prompts::extraction_prompt(text))).await?;
        parsing::parse_extracted_transaction(&response)
    }

    async fn assess_anomaly(&self, ctx: &AnomalyContext) -> Result<AnomalyAssessment> {
        let response = self.chat(json!(prompts::anomaly_prompt(ctx))).await?;
        parsing::parse_anomaly_assessment(&response)
    }

    async fn generate_insights(&self, snapshot: &SpendingSnapshot) -> Result<Vec<String>> {
        let response = self.chat(json!(prompts::insights_prompt(snapshot))).await?;
        parsing::parse_insights(&response)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.embed_model.clone(),
            input: text.to_string(),
        };

        let response = self
            .http_client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::InvalidData("Empty embedding response".to_string()))
    }

    async fn health_check(&self) -> bool {
        let response = self
            .http_client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await;
        match response {
            Ok(r) => r.status().is_success(),
            Err(_) => false,
        }
    }

    fn name(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }
}
