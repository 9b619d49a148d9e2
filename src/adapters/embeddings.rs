//! Local feature-hashing embeddings.
//!
//! Not semantically meaningful: identical texts embed identically and texts
//! sharing words and character runs land close together. Used for
//! development and offline runs where no embedding service is configured.

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::EmbeddingProvider;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const WORD_WEIGHT: f64 = 1.0;
const TRIGRAM_WEIGHT: f64 = 0.5;
const BIGRAM_WEIGHT: f64 = 0.25;

/// Deterministic hashing embeddings
#[derive(Debug, Clone)]
pub struct HashingEmbeddings {
    dimensions: usize,
}

impl Default for HashingEmbeddings {
    fn default() -> Self {
        Self::new(128)
    }
}

impl HashingEmbeddings {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Unit-length vector of hashed word, trigram and bigram features
    pub fn vectorize(&self, text: &str) -> Result<Vec<f64>> {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            bail!("cannot embed empty text");
        }

        let mut vector = vec![0.0; self.dimensions];

        for word in normalized
            .split(|c: char| !c.is_alphanumeric() && c != '%' && c != '\'')
            .filter(|w| !w.is_empty())
        {
            vector[self.bucket("w", word)] += WORD_WEIGHT;
        }

        let chars: Vec<char> = normalized.chars().collect();
        for window in chars.windows(3) {
            let gram: String = window.iter().collect();
            vector[self.bucket("t", &gram)] += TRIGRAM_WEIGHT;
        }
        for window in chars.windows(2) {
            let gram: String = window.iter().collect();
            vector[self.bucket("b", &gram)] += BIGRAM_WEIGHT;
        }

        let magnitude = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
        if magnitude > 0.0 {
            vector.iter_mut().for_each(|x| *x /= magnitude);
        }

        Ok(vector)
    }

    fn bucket(&self, namespace: &str, feature: &str) -> usize {
        (fnv1a(namespace, feature) % self.dimensions as u64) as usize
    }
}

fn fnv1a(namespace: &str, feature: &str) -> u64 {
    namespace
        .bytes()
        .chain(std::iter::once(0u8))
        .chain(feature.bytes())
        .fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME))
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddings {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        self.vectorize(text)
    }
}
