//! Semantic similarity through an embedding provider.
//!
//! Both texts are embedded concurrently under one bounded timeout. Anything
//! short of two finite vectors of equal length is `EmbeddingUnavailable`;
//! there is no fallback score.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::adapters::EmbeddingProvider;
use crate::error::{GovernanceError, GovernanceResult};

pub const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(10);

/// Cosine similarity clamped to [0, 1]. A zero vector scores 0.0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> GovernanceResult<f64> {
    if a.len() != b.len() {
        return Err(GovernanceError::EmbeddingUnavailable(format!(
            "embedding dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Err(GovernanceError::EmbeddingUnavailable(
            "provider returned an empty embedding".to_string(),
        ));
    }
    if a.iter().chain(b).any(|x| !x.is_finite()) {
        return Err(GovernanceError::EmbeddingUnavailable(
            "embedding contains non-finite values".to_string(),
        ));
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let magnitude_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let magnitude_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    let similarity = dot / (magnitude_a * magnitude_b);
    if !similarity.is_finite() {
        return Err(GovernanceError::EmbeddingUnavailable(
            "similarity is not a finite number".to_string(),
        ));
    }

    Ok(similarity.clamp(0.0, 1.0))
}

/// Scores a pair of texts with one provider
#[derive(Clone)]
pub struct SimilarityScorer {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
}

impl SimilarityScorer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_EMBEDDING_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn score(&self, original: &str, proposed: &str) -> GovernanceResult<f64> {
        let embed_both = async {
            tokio::try_join!(self.provider.embed(original), self.provider.embed(proposed))
        };

        let (a, b) = match timeout(self.timeout, embed_both).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                warn!(provider = self.provider.name(), error = %e, "Embedding provider failed");
                return Err(GovernanceError::EmbeddingUnavailable(format!("{:#}", e)));
            }
            Err(_) => {
                warn!(
                    provider = self.provider.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Embedding provider timed out"
                );
                return Err(GovernanceError::EmbeddingUnavailable(format!(
                    "embedding timed out after {:?}",
                    self.timeout
                )));
            }
        };

        let score = cosine_similarity(&a, &b)?;
        debug!(provider = self.provider.name(), dimensions = a.len(), score, "Similarity computed");
        Ok(score)
    }
}
