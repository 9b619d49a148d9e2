//! Claim and citation detection.
//!
//! Flags statistical, causal and authority-appeal assertions and counts
//! citation-like tokens. A report that carries claims but no citations
//! needs review; that is a signal for the decision engine, not a verdict.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::lexicon::{Lexicon, MarkerCategory};

/// Percentage-of-population, magnitude and approximation phrasing
static STATISTIC_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(
        r"\b\d+(?:\.\d+)?%\s+of\s+\w+|\b\d+(?:\.\d+)?\s*(?:million|billion|thousand)\b|\b(?:approximately|nearly|roughly)\s+\d+|\baverage[ds]?\s+(?:of\s+)?\d+",
    )
    .case_insensitive(true)
    .build()
    .expect("statistic pattern is valid")
});

/// `(Smith, 2020)`, `(Smith et al., 2020)` or `[3]`
static CITATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\([A-Z][a-z]+(?:\s+et\s+al\.?)?,?\s*\d{4}\)|\[\d+\]")
        .expect("citation pattern is valid")
});

/// Kind of factual assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimTag {
    Statistic,
    Causation,
    Authority,
}

impl ClaimTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimTag::Statistic => "statistic",
            ClaimTag::Causation => "causation",
            ClaimTag::Authority => "authority",
        }
    }
}

/// Claims and citations found in one text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReport {
    /// At most one tag per category
    pub tags: BTreeSet<ClaimTag>,

    /// Number of citation-like tokens
    pub citation_count: usize,

    /// At least one claim and zero citations
    pub needs_review: bool,
}

/// Claim reports for both sides of a rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimComparison {
    pub original: ClaimReport,
    pub proposed: ClaimReport,

    /// Tags the proposal carries that the original did not
    pub introduced: Vec<ClaimTag>,
}

/// Claim detector compiled from a lexicon
#[derive(Debug, Clone)]
pub struct ClaimDetector {
    causation: Regex,
    authority: Regex,
}

impl ClaimDetector {
    pub fn new(lexicon: &Lexicon) -> Result<Self, regex::Error> {
        Ok(Self {
            causation: lexicon.pattern(MarkerCategory::Causation, true)?,
            authority: lexicon.pattern(MarkerCategory::Authority, true)?,
        })
    }

    pub fn analyze(&self, text: &str) -> ClaimReport {
        let mut tags = BTreeSet::new();

        if STATISTIC_RE.is_match(text) {
            tags.insert(ClaimTag::Statistic);
        }
        if self.causation.is_match(text) {
            tags.insert(ClaimTag::Causation);
        }
        if self.authority.is_match(text) {
            tags.insert(ClaimTag::Authority);
        }

        let citation_count = count_citations(text);
        let needs_review = !tags.is_empty() && citation_count == 0;

        ClaimReport {
            tags,
            citation_count,
            needs_review,
        }
    }

    pub fn compare(&self, original: &str, proposed: &str) -> ClaimComparison {
        let original = self.analyze(original);
        let proposed = self.analyze(proposed);
        let introduced = proposed.tags.difference(&original.tags).copied().collect();

        ClaimComparison {
            original,
            proposed,
            introduced,
        }
    }
}

pub fn count_citations(text: &str) -> usize {
    CITATION_RE.find_iter(text).count()
}
