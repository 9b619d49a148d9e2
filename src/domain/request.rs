//! Validation request types.

use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// What the user asked the AI provider to do with the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Improve flow and structure
    Rewrite,

    /// Make the language sound natural without casualising it
    Humanize,

    /// Simplify phrasing without simplifying ideas
    Clarify,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Rewrite => "rewrite",
            Intent::Humanize => "humanize",
            Intent::Clarify => "clarify",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rewrite" => Ok(Intent::Rewrite),
            "humanize" => Ok(Intent::Humanize),
            "clarify" => Ok(Intent::Clarify),
            other => Err(GovernanceError::InvalidIntent(other.to_string())),
        }
    }
}

/// Immutable input to the governance pipeline.
///
/// `user_id` comes from the identity collaborator already verified; the
/// core never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub original_text: String,
    pub proposed_text: String,
    pub intent: Intent,
    pub user_id: String,
}

impl ValidationRequest {
    pub fn new(
        original_text: impl Into<String>,
        proposed_text: impl Into<String>,
        intent: Intent,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            original_text: original_text.into(),
            proposed_text: proposed_text.into(),
            intent,
            user_id: user_id.into(),
        }
    }
}
