//! Google Gemini provider
//!
//! Talks to the Generative Language REST API. Vision OCR sends the
//! image inline as base64; structured operations send a text prompt and
//! run the shared response parsers over whatever comes back.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parsing;
use super::prompts;
use super::types::*;
use super::AiProvider;
use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_EMBED_MODEL: &str = "text-embedding-004";

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    embed_model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inline_data", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Embedding,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
        }
    }

    /// Create from environment. Requires `GEMINI_API_KEY`; model comes
    /// from `GEMINI_MODEL` when set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self::new(&api_key, &model))
    }

    /// Override the base URL (for tests against a local stub)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Send parts to generateContent and return the concatenated text
    async fn generate(&self, parts: Vec<Part>) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = GenerateRequest {
            contents: vec![Content { parts }],
        };

        let response = self.http_client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect();

        debug!(model = %self.model, response_len = text.len(), "Gemini response received");

        if text.trim().is_empty() {
            return Err(Error::InvalidData(
                "Empty response from Gemini".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn extract_text(&self, image: &[u8], mime_type: &str) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        self.generate(vec![
            Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: mime_type.to_string(),
                    data: encoded,
                }),
            },
            Part {
                text: Some(prompts::OCR_INSTRUCTION.to_string()),
                inline_data: None,
            },
        ])
        .await
    }

    async fn extract_structured(&self, text: &str) -> Result<ExtractedTransaction> {
        let response = self
            .generate(vec![Part {
                text: Some(prompts::extraction_prompt(text)),
                inline_data: None,
            }])
            .await?;
        parsing::parse_extracted_transaction(&response)
    }

    async fn assess_anomaly(&self, ctx: &AnomalyContext) -> Result<AnomalyAssessment> {
        let response = self
            .generate(vec![Part {
                text: Some(prompts::anomaly_prompt(ctx)),
                inline_data: None,
            }])
            .await?;
        parsing::parse_anomaly_assessment(&response)
    }

    async fn generate_insights(&self, snapshot: &SpendingSnapshot) -> Result<Vec<String>> {
        let response = self
            .generate(vec![Part {
                text: Some(prompts::insights_prompt(snapshot)),
                inline_data: None,
            }])
            .await?;
        parsing::parse_insights(&response)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/v1beta/models/{}:embedContent?key={}",
            self.base_url, self.embed_model, self.api_key
        );
        let request = EmbedRequest {
            content: Content {
                parts: vec![Part {
                    text: Some(text.to_string()),
                    inline_data: None,
                }],
            },
        };

        let response = self.http_client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let parsed: EmbedResponse = response.json().await?;
        Ok(parsed.embedding.values)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/v1beta/models?key={}", self.base_url, self.api_key);
        match self.http_client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn name(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }
}
