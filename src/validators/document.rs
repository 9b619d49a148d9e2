//! Document-level structural scan.
//!
//! Independent of the pairwise accept/reject path: the scan only informs
//! an optional quality signal and never blocks a rewrite.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::lexicon::{Lexicon, MarkerCategory};

static SENTENCE_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence split pattern is valid"));

static PASSIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:is|are|was|were|been|being)\s+\w+ed\b").expect("passive pattern is valid")
});

const MIN_SENTENCE_CHARS: usize = 10;
const LONG_SENTENCE_WORDS: usize = 40;
const PASSIVE_LIMIT: usize = 2;
const ISSUE_PENALTY: usize = 10;
const EXCERPT_CHARS: usize = 80;

/// A proposal may lose at most this many score points and still count as
/// maintaining quality.
const QUALITY_TOLERANCE: i32 = 10;

const OPPOSING_TERMS: &[(&str, &str)] = &[
    ("increase", "decrease"),
    ("significant", "insignificant"),
    ("effective", "ineffective"),
    ("positive", "negative"),
    ("growth", "decline"),
    ("improve", "worsen"),
    ("support", "oppose"),
    ("confirm", "deny"),
    ("success", "failure"),
    ("benefit", "harm"),
];

/// A scored structural problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentIssue {
    /// Sentence longer than the word limit
    LongSentence { words: usize, excerpt: String },

    /// Passive constructions above the density limit
    PassiveVoice { count: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentScan {
    pub word_count: usize,
    pub sentence_count: usize,
    pub average_sentence_length: usize,
    pub passive_count: usize,
    pub issues: Vec<DocumentIssue>,
    pub strengths: Vec<String>,

    /// Unscored observations such as opposing-term pairs
    pub weaknesses: Vec<String>,

    /// `100 - 10 * issues`, floored at 0
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentComparison {
    pub original_score: u32,
    pub proposed_score: u32,
    pub score_change: i32,
    pub quality_maintained: bool,
}

#[derive(Debug, Clone)]
pub struct DocumentScanner {
    connectors: Regex,
}

impl DocumentScanner {
    pub fn new(lexicon: &Lexicon) -> Result<Self, regex::Error> {
        Ok(Self {
            connectors: lexicon.pattern(MarkerCategory::Connector, true)?,
        })
    }

    pub fn scan(&self, text: &str) -> DocumentScan {
        let sentences = split_sentences(text);
        let word_count = text.split_whitespace().count();

        let sentence_words: Vec<usize> = sentences
            .iter()
            .map(|s| s.split_whitespace().count())
            .collect();
        let average_sentence_length = if sentence_words.is_empty() {
            0
        } else {
            let total: usize = sentence_words.iter().sum();
            (total as f64 / sentence_words.len() as f64).round() as usize
        };

        let mut issues = Vec::new();
        for (sentence, words) in sentences.iter().zip(&sentence_words) {
            if *words > LONG_SENTENCE_WORDS {
                issues.push(DocumentIssue::LongSentence {
                    words: *words,
                    excerpt: excerpt(sentence),
                });
            }
        }

        let passive_count = PASSIVE_RE.find_iter(text).count();
        if passive_count > PASSIVE_LIMIT {
            issues.push(DocumentIssue::PassiveVoice {
                count: passive_count,
            });
        }

        let mut strengths = Vec::new();
        if self.connectors.is_match(text) {
            strengths.push("Uses logical connectors".to_string());
        }

        let weaknesses = opposing_terms(text)
            .into_iter()
            .map(|(a, b)| format!("Contains both '{}' and '{}'", a, b))
            .collect();

        let score = 100usize.saturating_sub(ISSUE_PENALTY * issues.len()) as u32;

        DocumentScan {
            word_count,
            sentence_count: sentences.len(),
            average_sentence_length,
            passive_count,
            issues,
            strengths,
            weaknesses,
            score,
        }
    }

    /// Compare structural quality of an original and its proposal
    pub fn compare(&self, original: &str, proposed: &str) -> DocumentComparison {
        let before = self.scan(original);
        let after = self.scan(proposed);
        let score_change = after.score as i32 - before.score as i32;
        let new_weaknesses = after.weaknesses.len() > before.weaknesses.len();

        DocumentComparison {
            original_score: before.score,
            proposed_score: after.score,
            score_change,
            quality_maintained: score_change >= -QUALITY_TOLERANCE && !new_weaknesses,
        }
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_SPLIT_RE
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .collect()
}

fn excerpt(sentence: &str) -> String {
    if sentence.chars().count() <= EXCERPT_CHARS {
        return sentence.to_string();
    }
    let cut: String = sentence.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut)
}

fn opposing_terms(text: &str) -> Vec<(&'static str, &'static str)> {
    let words: HashSet<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    OPPOSING_TERMS
        .iter()
        .filter(|(a, b)| words.contains(*a) && words.contains(*b))
        .copied()
        .collect()
}
