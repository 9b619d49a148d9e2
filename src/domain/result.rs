//! Verdict types produced by the governance pipeline.

use serde::{Deserialize, Serialize};

use crate::validators::{ClaimReport, ClaimTag, DocumentComparison, EntityDrift, ToneAnalysis};

/// Terminal verdict for one proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    AllowedWithWarning,
    Blocked,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allowed => "allowed",
            Decision::AllowedWithWarning => "allowed_with_warning",
            Decision::Blocked => "blocked",
        }
    }

    /// Both allowed states permit showing the proposal
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed | Decision::AllowedWithWarning)
    }

    pub fn requires_warning(&self) -> bool {
        matches!(self, Decision::AllowedWithWarning)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Similarity thresholds shared by the decision engine and risk banding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// At or above: safe
    #[serde(default = "default_safe")]
    pub safe: f64,

    /// At or above (and below `safe`): risky. Below: dangerous.
    #[serde(default = "default_risky")]
    pub risky: f64,
}

fn default_safe() -> f64 {
    0.85
}
fn default_risky() -> f64 {
    0.60
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            safe: default_safe(),
            risky: default_risky(),
        }
    }
}

impl Thresholds {
    /// Both bounds inside [0, 1] and `risky < safe`
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.risky)
            && (0.0..=1.0).contains(&self.safe)
            && self.risky < self.safe
    }
}

/// Coarse similarity band stored for audit triage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    Safe,
    Risky,
    Dangerous,
}

impl RiskLabel {
    /// Band a similarity score; an unavailable score is dangerous
    pub fn from_score(score: Option<f64>, thresholds: &Thresholds) -> Self {
        match score {
            Some(s) if s >= thresholds.safe => RiskLabel::Safe,
            Some(s) if s >= thresholds.risky => RiskLabel::Risky,
            _ => RiskLabel::Dangerous,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Safe => "safe",
            RiskLabel::Risky => "risky",
            RiskLabel::Dangerous => "dangerous",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code for a sub-check that did not pass.
///
/// Declaration order is the order flags appear in a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationFlag {
    NoUsableProposal,
    EntityDrift,
    PolarityFlip,
    EmbeddingUnavailable,
    SemanticDrift,
    SimilarityMarginal,
    ToneShift,
    UncitedClaims,
}

impl ValidationFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationFlag::NoUsableProposal => "no_usable_proposal",
            ValidationFlag::EntityDrift => "entity_drift",
            ValidationFlag::PolarityFlip => "polarity_flip",
            ValidationFlag::EmbeddingUnavailable => "embedding_unavailable",
            ValidationFlag::SemanticDrift => "semantic_drift",
            ValidationFlag::SimilarityMarginal => "similarity_marginal",
            ValidationFlag::ToneShift => "tone_shift",
            ValidationFlag::UncitedClaims => "uncited_claims",
        }
    }
}

impl std::fmt::Display for ValidationFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete verdict for one proposal. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Cosine similarity in [0, 1]; `None` when embeddings were unavailable
    pub similarity_score: Option<f64>,
    pub risk_label: RiskLabel,
    pub entity_preserved: bool,
    pub entity_drift: EntityDrift,
    pub polarity_flip: bool,
    pub tone_analysis: ToneAnalysis,

    /// Claims found in the proposal
    pub claim_report: ClaimReport,

    /// Claim categories the proposal introduced
    pub introduced_claims: Vec<ClaimTag>,
    pub validation_flags: Vec<ValidationFlag>,
    pub decision: Decision,
    pub decision_reason: String,

    /// Present only when the document scan is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_quality: Option<DocumentComparison>,
}

impl ValidationResult {
    pub fn has_flag(&self, flag: ValidationFlag) -> bool {
        self.validation_flags.contains(&flag)
    }
}
