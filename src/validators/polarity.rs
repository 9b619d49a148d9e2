//! Negation detection.
//!
//! The detector only answers "does this text contain a negation marker".
//! Comparing two states into a flip is the caller's job.
//!
//! Two matching modes exist. `Substring` tests plain containment in the
//! lower-cased text: high recall, low precision, so `nor` fires inside
//! `ignore` and `not` inside `notable`. `Word` anchors word-shaped markers
//! on word boundaries and still lets `n't` match inside contractions.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::lexicon::{Lexicon, MarkerCategory};

/// How negation markers are matched against text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolarityMatch {
    /// Containment anywhere in the lower-cased text
    Substring,

    /// Word-shaped markers must stand as whole words
    #[default]
    Word,
}

/// Presence of at least one negation marker
pub type PolarityState = bool;

/// Negation detector compiled from a lexicon
#[derive(Debug, Clone)]
pub struct PolarityDetector {
    pattern: Regex,
}

impl PolarityDetector {
    pub fn new(lexicon: &Lexicon, mode: PolarityMatch) -> Result<Self, regex::Error> {
        let whole_words = matches!(mode, PolarityMatch::Word);
        Ok(Self {
            pattern: lexicon.pattern(MarkerCategory::Negation, whole_words)?,
        })
    }

    /// Whether the text contains a negation marker
    pub fn detect(&self, text: &str) -> PolarityState {
        self.pattern.is_match(&text.to_lowercase())
    }

    /// True when exactly one of the two texts is negated
    pub fn is_flip(&self, original: &str, proposed: &str) -> bool {
        self.detect(original) != self.detect(proposed)
    }
}
