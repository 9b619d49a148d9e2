//! Audit record shape.
//!
//! Records prove what was decided without storing what was written:
//! only SHA-256 digests of the texts are kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::request::Intent;
use super::result::{Decision, RiskLabel};

/// One immutable, append-only audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: String,
    pub action_type: Intent,

    /// SHA-256 hex digest of the original text
    pub original_text_hash: String,

    /// SHA-256 hex digest of the proposed text
    pub proposed_text_hash: String,
    pub similarity_score: Option<f64>,
    pub risk_label: RiskLabel,
    pub decision: Decision,

    /// Assigned by the recorder, never by the caller
    pub created_at: DateTime<Utc>,
}
