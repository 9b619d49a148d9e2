//! Rule-based signal extractors.
//!
//! Every validator here is pure: same text in, same signal out, no I/O.
//! Patterns are compiled once from a [`Lexicon`] when the bundle is built.

pub mod claims;
pub mod document;
pub mod entity;
pub mod lexicon;
pub mod polarity;
pub mod tone;

use serde::{Deserialize, Serialize};

pub use claims::{ClaimComparison, ClaimDetector, ClaimReport, ClaimTag};
pub use document::{DocumentComparison, DocumentIssue, DocumentScan, DocumentScanner};
pub use entity::{extract_entities, EntityDrift, EntitySet};
pub use lexicon::{Lexicon, MarkerCategory};
pub use polarity::{PolarityDetector, PolarityMatch};
pub use tone::{ToneAnalysis, ToneClassifier, ToneLabel, ToneProfile};

/// All pure signals computed over an (original, proposed) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSignals {
    pub original_entities: EntitySet,
    pub proposed_entities: EntitySet,
    pub entity_preserved: bool,
    pub entity_drift: EntityDrift,
    pub original_negated: bool,
    pub proposed_negated: bool,
    pub polarity_flip: bool,
    pub claims: ClaimComparison,
    pub tone: ToneAnalysis,
}

/// The compiled validator set shared by every request
#[derive(Debug, Clone)]
pub struct Validators {
    polarity: PolarityDetector,
    claims: ClaimDetector,
    tone: ToneClassifier,
    document: DocumentScanner,
}

impl Validators {
    pub fn new(lexicon: &Lexicon, polarity_mode: PolarityMatch) -> Result<Self, regex::Error> {
        Ok(Self {
            polarity: PolarityDetector::new(lexicon, polarity_mode)?,
            claims: ClaimDetector::new(lexicon)?,
            tone: ToneClassifier::new(lexicon)?,
            document: DocumentScanner::new(lexicon)?,
        })
    }

    pub fn polarity(&self) -> &PolarityDetector {
        &self.polarity
    }

    pub fn claims(&self) -> &ClaimDetector {
        &self.claims
    }

    pub fn tone(&self) -> &ToneClassifier {
        &self.tone
    }

    pub fn document(&self) -> &DocumentScanner {
        &self.document
    }

    /// Run entity, polarity, claim and tone checks over a pair
    pub fn analyze_pair(&self, original: &str, proposed: &str) -> PairSignals {
        let original_entities = extract_entities(original);
        let proposed_entities = extract_entities(proposed);
        let entity_preserved = entity::entities_preserved(&original_entities, &proposed_entities);
        let entity_drift = original_entities.drift(&proposed_entities);

        let original_negated = self.polarity.detect(original);
        let proposed_negated = self.polarity.detect(proposed);

        PairSignals {
            original_entities,
            proposed_entities,
            entity_preserved,
            entity_drift,
            original_negated,
            proposed_negated,
            polarity_flip: original_negated != proposed_negated,
            claims: self.claims.compare(original, proposed),
            tone: self.tone.compare(original, proposed),
        }
    }
}
