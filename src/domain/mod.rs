//! Domain types for the governance pipeline.
//!
//! This module contains the core data structures:
//! - Request: what the caller submits
//! - Result: the verdict and every signal behind it
//! - Audit: the hash-only record written after each verdict

pub mod audit;
pub mod request;
pub mod result;

// Re-export commonly used types
pub use audit::AuditRecord;
pub use request::{Intent, ValidationRequest};
pub use result::{Decision, RiskLabel, Thresholds, ValidationFlag, ValidationResult};
