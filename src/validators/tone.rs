//! Register classification from lexical markers and contraction density.
//!
//! Label assignment runs in a fixed order: start at `neutral`, move to
//! `formal` on any formal marker, then move to `casual` on any casual
//! marker or more than two contractions. Casual therefore wins when both
//! fire; that precedence is intentional and must not be reordered.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::lexicon::{Lexicon, MarkerCategory};

static CONTRACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:n['\x{2018}\x{2019}]t|['\x{2018}\x{2019}](?:ll|ve|re|d))\b")
        .expect("contraction pattern is valid")
});

/// Contractions above this count mark a text casual
const CONTRACTION_LIMIT: usize = 2;

/// Register of a text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneLabel {
    Formal,
    Casual,
    #[default]
    Neutral,
}

impl std::fmt::Display for ToneLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToneLabel::Formal => write!(f, "formal"),
            ToneLabel::Casual => write!(f, "casual"),
            ToneLabel::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneProfile {
    pub label: ToneLabel,
    pub formal_count: usize,

    /// Casual marker hits plus contraction hits
    pub casual_count: usize,
}

/// Tone of both sides of a rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneAnalysis {
    pub original: ToneProfile,
    pub proposed: ToneProfile,
    pub preserved: bool,
}

#[derive(Debug, Clone)]
pub struct ToneClassifier {
    formal: Regex,
    casual: Regex,
}

impl ToneClassifier {
    pub fn new(lexicon: &Lexicon) -> Result<Self, regex::Error> {
        Ok(Self {
            formal: lexicon.pattern(MarkerCategory::Formal, true)?,
            casual: lexicon.pattern(MarkerCategory::Casual, true)?,
        })
    }

    pub fn classify(&self, text: &str) -> ToneProfile {
        let formal_count = self.formal.find_iter(text).count();
        let casual_markers = self.casual.find_iter(text).count();
        let contractions = CONTRACTION_RE.find_iter(text).count();

        let mut label = ToneLabel::Neutral;
        if formal_count > 0 {
            label = ToneLabel::Formal;
        }
        if casual_markers > 0 || contractions > CONTRACTION_LIMIT {
            label = ToneLabel::Casual;
        }

        ToneProfile {
            label,
            formal_count,
            casual_count: casual_markers + contractions,
        }
    }

    pub fn compare(&self, original: &str, proposed: &str) -> ToneAnalysis {
        let original = self.classify(original);
        let proposed = self.classify(proposed);
        let preserved = original.label == proposed.label;

        ToneAnalysis {
            original,
            proposed,
            preserved,
        }
    }
}
