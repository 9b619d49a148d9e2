//! rewrite-guard - Semantic governance for AI-assisted rewrites
//!
//! An AI provider proposes a replacement for a highlighted passage. Before
//! the proposal may be shown as acceptable it passes through a pipeline that
//! checks whether the rewrite keeps the original's meaning, facts and tone.
//!
//! # Architecture
//!
//! Every request flows through the same stages:
//! - Input gate: length and document-shape bounds on the selection
//! - Signals: entity, polarity, claim and tone checks (pure, rule based)
//!   computed concurrently with embedding similarity
//! - Decision: first-matching-rule reduction to allowed, allowed with
//!   warning, or blocked, with a human-readable reason
//! - Audit: a hash-only record appended after the verdict is final
//!
//! # Modules
//!
//! - `adapters`: Embedding and AI proposal providers
//! - `core`: Input gate, similarity, decision engine, audit, governor
//! - `domain`: Request, result and audit record types
//! - `validators`: Rule-based signal extractors and their marker lexicon
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Judge a proposal
//! rewrite-guard validate --original "Sales did not decline in 2022." \
//!     --proposed "Sales declined in 2022."
//!
//! # Generate and judge a proposal
//! rewrite-guard rewrite --text "We met in order to plan the budget." --intent clarify
//!
//! # Show a user's audit trail
//! rewrite-guard audit --user alice
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod validators;

// Re-export main types at crate root for convenience
pub use crate::core::{Governed, Governor, GovernorBuilder};
pub use domain::{
    AuditRecord, Decision, Intent, RiskLabel, Thresholds, ValidationFlag, ValidationRequest,
    ValidationResult,
};
pub use error::{GovernanceError, GovernanceResult};
