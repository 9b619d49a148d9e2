//! Reduces the pipeline's signals to a single verdict.
//!
//! Rules are checked in order and the first one that holds decides:
//!
//! 0. no usable proposal: blocked
//! 1. entities changed: blocked
//! 2. polarity reversed: blocked
//! 3. similarity unavailable or below `risky`: blocked
//! 4. similarity below `safe`, tone shifted, or uncited claims: warning
//! 5. otherwise: allowed
//!
//! Flags are collected independently of which rule won, so a blocked
//! verdict still lists every other sub-check that failed.

use tracing::debug;

use crate::domain::{Decision, RiskLabel, Thresholds, ValidationFlag};
use crate::error::{GovernanceError, GovernanceResult};
use crate::validators::ToneAnalysis;

pub const REASON_NO_PROPOSAL: &str = "no usable proposal produced.";
pub const REASON_ENTITY_DRIFT: &str = "entity/invariant drift detected.";
pub const REASON_POLARITY: &str = "meaning polarity reversed.";
pub const REASON_SEMANTIC_DRIFT: &str = "semantic drift exceeds safety bound.";
pub const REASON_ALLOWED: &str = "all semantic invariants preserved.";

/// Everything the engine looks at
#[derive(Debug, Clone, Copy)]
pub struct Signals<'a> {
    pub proposal_usable: bool,
    pub entity_preserved: bool,
    pub polarity_flip: bool,

    /// `None` when the embedding provider could not produce a score
    pub similarity: Option<f64>,
    pub tone: &'a ToneAnalysis,

    /// From the proposal's claim report
    pub needs_review: bool,
}

/// Outcome of one decision
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub decision: Decision,
    pub reason: String,
    pub flags: Vec<ValidationFlag>,
    pub risk_label: RiskLabel,
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    thresholds: Thresholds,
}

impl DecisionEngine {
    /// Rejects thresholds outside [0, 1] or with `risky >= safe`
    pub fn new(thresholds: Thresholds) -> GovernanceResult<Self> {
        if !thresholds.is_valid() {
            return Err(GovernanceError::Config(format!(
                "invalid thresholds: risky {} must be below safe {} and both within [0, 1]",
                thresholds.risky, thresholds.safe
            )));
        }
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Every failing sub-check, in flag declaration order
    pub fn flags(&self, signals: &Signals<'_>) -> Vec<ValidationFlag> {
        let mut flags = Vec::new();

        if !signals.proposal_usable {
            flags.push(ValidationFlag::NoUsableProposal);
        }
        if !signals.entity_preserved {
            flags.push(ValidationFlag::EntityDrift);
        }
        if signals.polarity_flip {
            flags.push(ValidationFlag::PolarityFlip);
        }
        match signals.similarity {
            // Nothing was embedded for an unusable proposal
            None if signals.proposal_usable => flags.push(ValidationFlag::EmbeddingUnavailable),
            None => {}
            Some(score) if score < self.thresholds.risky => flags.push(ValidationFlag::SemanticDrift),
            Some(score) if score < self.thresholds.safe => {
                flags.push(ValidationFlag::SimilarityMarginal)
            }
            Some(_) => {}
        }
        if !signals.tone.preserved {
            flags.push(ValidationFlag::ToneShift);
        }
        if signals.needs_review {
            flags.push(ValidationFlag::UncitedClaims);
        }

        flags
    }

    pub fn decide(&self, signals: &Signals<'_>) -> Verdict {
        let flags = self.flags(signals);
        let risk_label = RiskLabel::from_score(signals.similarity, &self.thresholds);
        let (decision, reason) = self.apply_rules(signals);

        debug!(
            decision = %decision,
            risk_label = %risk_label,
            flag_count = flags.len(),
            "Decision reached"
        );

        Verdict {
            decision,
            reason,
            flags,
            risk_label,
        }
    }

    fn apply_rules(&self, signals: &Signals<'_>) -> (Decision, String) {
        if !signals.proposal_usable {
            return (Decision::Blocked, REASON_NO_PROPOSAL.to_string());
        }
        if !signals.entity_preserved {
            return (Decision::Blocked, REASON_ENTITY_DRIFT.to_string());
        }
        if signals.polarity_flip {
            return (Decision::Blocked, REASON_POLARITY.to_string());
        }

        let score = match signals.similarity {
            Some(score) if score >= self.thresholds.risky => score,
            _ => return (Decision::Blocked, REASON_SEMANTIC_DRIFT.to_string()),
        };

        let mut concerns = Vec::new();
        if score < self.thresholds.safe {
            concerns.push(format!(
                "similarity {:.2} is below the safe bound {:.2}",
                score, self.thresholds.safe
            ));
        }
        if !signals.tone.preserved {
            concerns.push(format!(
                "tone shifted from {} to {}",
                signals.tone.original.label, signals.tone.proposed.label
            ));
        }
        if signals.needs_review {
            concerns.push("claims without citations need review".to_string());
        }

        if concerns.is_empty() {
            (Decision::Allowed, REASON_ALLOWED.to_string())
        } else {
            (
                Decision::AllowedWithWarning,
                format!("review recommended: {}.", concerns.join("; ")),
            )
        }
    }
}
