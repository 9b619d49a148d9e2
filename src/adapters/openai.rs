//! OpenAI-compatible HTTP adapters.
//!
//! `OpenAiEmbeddings` calls `POST {base_url}/embeddings`; `OpenAiProposer`
//! calls `POST {base_url}/chat/completions` with a fixed editor instruction
//! and a JSON response format. Any server speaking the same wire format
//! works by pointing `base_url` at it.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EmbeddingProvider, Proposal, ProposalProvider};
use crate::domain::Intent;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

const EDITOR_INSTRUCTION: &str = "You are a professional editor, not an author.
Rewrite the provided text ONLY to improve clarity, readability, or tone.
Preserve the original meaning exactly.
Do NOT add new facts, claims, examples, or conclusions.
Do NOT remove important details.
Do NOT strengthen or weaken arguments.
Stay as close as possible to the original wording.
If uncertain, make minimal changes.

You MUST respond with valid JSON in this exact format:
{
  \"proposed_text\": \"your rewritten text here\",
  \"explanation_summary\": \"1-2 sentences describing what you changed\"
}";

fn intent_instruction(intent: Intent) -> &'static str {
    match intent {
        Intent::Rewrite => "Improve flow and structure while preserving meaning exactly.",
        Intent::Humanize => {
            "Make language sound natural and less stiff, without casualization. Maintain formality."
        }
        Intent::Clarify => {
            "Simplify phrasing and sentence structure without simplifying ideas or removing nuance."
        }
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f64>,
}

/// Embeddings over an OpenAI-compatible API
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let input = text.trim();
        if input.is_empty() {
            bail!("cannot embed empty text");
        }

        let response = self
            .client
            .post(endpoint(&self.base_url, "embeddings"))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input,
            })
            .send()
            .await
            .context("Failed to reach embedding service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Embedding service error ({}): {}", status, body);
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .context("Embedding response contained no vectors")
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: serde_json::Value,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// The JSON object the editor instruction asks for
#[derive(Debug, Deserialize)]
struct ProposalPayload {
    #[serde(default)]
    proposed_text: String,
    #[serde(default)]
    explanation_summary: String,
}

/// Rewrite proposals from an OpenAI-compatible chat API
pub struct OpenAiProposer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProposer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl ProposalProvider for OpenAiProposer {
    fn name(&self) -> &str {
        "openai"
    }

    async fn propose(&self, text: &str, intent: Intent) -> Result<Proposal> {
        let user_message = format!("{}\n\nText to edit:\n\n{}", intent_instruction(intent), text);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: EDITOR_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: &user_message,
                },
            ],
            response_format: serde_json::json!({ "type": "json_object" }),
            temperature: 0.3,
            max_tokens: 2000,
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to reach AI provider")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("AI provider error ({}): {}", status, body);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse AI provider response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .context("AI provider returned an empty response")?;

        parse_proposal(&content)
    }
}

fn parse_proposal(content: &str) -> Result<Proposal> {
    let payload: ProposalPayload =
        serde_json::from_str(content).context("AI provider returned invalid JSON")?;

    Ok(Proposal {
        proposed_text: payload.proposed_text,
        explanation: payload.explanation_summary,
    })
}
