//! Entity extraction: the numeric invariants a faithful rewrite must keep.
//!
//! Two token classes are pulled independently: number-like literals
//! (optionally with a trailing `%`) and whole-word years in 1900-2099.
//! A year therefore shows up in both sequences.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?%?").expect("number pattern is valid"));

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("year pattern is valid"));

/// Ordered, non-deduplicated entity tokens of one text.
///
/// Equality is order-sensitive and counts duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    pub numbers: Vec<String>,
    pub years: Vec<String>,
}

/// Multiset difference between two entity sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDrift {
    /// Tokens of the original that the proposal lost
    pub missing: Vec<String>,

    /// Tokens of the proposal absent from the original
    pub added: Vec<String>,
}

impl EntityDrift {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.added.is_empty()
    }
}

impl EntitySet {
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty() && self.years.is_empty()
    }

    /// Multiset difference against a proposal's entities.
    ///
    /// Reordering alone yields an empty drift even though the sets are
    /// not equal.
    pub fn drift(&self, proposed: &EntitySet) -> EntityDrift {
        let original: Vec<&String> = self.numbers.iter().chain(&self.years).collect();
        let candidate: Vec<&String> = proposed.numbers.iter().chain(&proposed.years).collect();

        EntityDrift {
            missing: multiset_minus(&original, &candidate),
            added: multiset_minus(&candidate, &original),
        }
    }
}

fn multiset_minus(left: &[&String], right: &[&String]) -> Vec<String> {
    let mut remaining: Vec<&String> = right.to_vec();
    let mut out = Vec::new();
    for token in left {
        match remaining.iter().position(|r| r == token) {
            Some(idx) => {
                remaining.swap_remove(idx);
            }
            None => out.push((*token).clone()),
        }
    }
    out
}

/// Extract entities from a text. Pure and deterministic.
pub fn extract_entities(text: &str) -> EntitySet {
    EntitySet {
        numbers: NUMBER_RE
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
        years: YEAR_RE
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
    }
}

/// True iff both texts carry identical entity sequences
pub fn entities_preserved(original: &EntitySet, proposed: &EntitySet) -> bool {
    original == proposed
}
