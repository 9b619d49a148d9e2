//! Core governance logic.
//!
//! This module contains:
//! - Input: bounds checked before a request enters the pipeline
//! - Similarity: embedding-based semantic similarity
//! - Decision: reduction of signals to a verdict
//! - Audit: hash-only, append-only record of every verdict
//! - Governor: the pipeline tying them together

pub mod audit;
pub mod decision;
pub mod governor;
pub mod input;
pub mod similarity;

// Re-export commonly used types
pub use audit::{hash_text, AuditHandle, AuditRecorder, AuditSink, JsonlAuditStore, RetryPolicy};
pub use decision::{DecisionEngine, Signals, Verdict};
pub use governor::{Governed, Governor, GovernorBuilder};
pub use input::{InputLimits, InputViolation};
pub use similarity::{cosine_similarity, SimilarityScorer};
