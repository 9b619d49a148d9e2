//! Adapter interfaces for external systems.
//!
//! Two seams leave the process: the embedding provider that turns text into
//! vectors, and the AI provider that proposes rewrites. Both are traits so
//! the governor can run against local deterministic stand-ins.

pub mod embeddings;
pub mod openai;
pub mod proposal;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Intent;

pub use embeddings::HashingEmbeddings;
pub use openai::{OpenAiEmbeddings, OpenAiProposer};
pub use proposal::{check_proposal, PlaceholderProposer};

/// Trait for embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Embed one text. Both sides of a comparison go through the same provider.
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;
}

/// A rewrite suggested by an AI provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposed_text: String,

    /// One or two sentences on what changed
    pub explanation: String,
}

/// Trait for AI rewrite providers
#[async_trait]
pub trait ProposalProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Propose a replacement for the selected text
    async fn propose(&self, text: &str, intent: Intent) -> Result<Proposal>;
}
