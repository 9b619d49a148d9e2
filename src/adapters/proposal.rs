//! Placeholder rewrite provider and the structural proposal check.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use super::{Proposal, ProposalProvider};
use crate::domain::Intent;
use crate::error::GovernanceError;

/// Structure a proposal may not introduce: list items, numbered items,
/// headings, bracket citations, reference headings.
static STRUCTURAL_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("bulleted list", r"(?mi)^\s*[-*•]\s"),
        ("numbered list", r"(?mi)^\s*\d+\.\s"),
        ("heading", r"(?mi)^#+\s"),
        ("bracket citation", r"\[\d+\]"),
        ("reference list", r"(?mi)^\s*(?:references|bibliography|works cited)\s*$"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("structural pattern is valid")))
    .collect()
});

fn case_insensitive(phrases: &[(&'static str, &'static str)]) -> Vec<(Regex, &'static str)> {
    phrases
        .iter()
        .map(|(old, new)| {
            let re = Regex::new(&format!("(?i){}", regex::escape(old)))
                .expect("escaped phrase is valid");
            (re, *new)
        })
        .collect()
}

static FILLERS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    case_insensitive(&[
        ("very ", ""),
        ("really ", ""),
        ("just ", ""),
        ("actually ", ""),
        ("basically ", ""),
    ])
});

static SIMPLIFICATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    case_insensitive(&[
        ("in order to", "to"),
        ("due to the fact that", "because"),
        ("at this point in time", "now"),
        ("in the event that", "if"),
        ("with regard to", "about"),
    ])
});

const SOFTENED_CONNECTORS: &[(&str, &str)] = &[
    ("Furthermore,", "Also,"),
    ("Moreover,", "Additionally,"),
    ("Therefore,", "So,"),
    ("However,", "But,"),
    ("Nevertheless,", "Still,"),
];

const MAX_FILLER_REMOVALS: usize = 2;

/// Reject a proposal that is blank or adds structure the original lacks
pub fn check_proposal(original: &str, proposed: &str) -> Result<(), GovernanceError> {
    if proposed.trim().is_empty() {
        return Err(GovernanceError::MalformedProviderOutput(
            "proposal is empty".to_string(),
        ));
    }

    for (name, pattern) in STRUCTURAL_PATTERNS.iter() {
        if pattern.is_match(proposed) && !pattern.is_match(original) {
            return Err(GovernanceError::MalformedProviderOutput(format!(
                "proposal introduces a {} absent from the original",
                name
            )));
        }
    }

    Ok(())
}

/// Deterministic, conservative stand-in for an AI provider
#[derive(Debug, Clone, Default)]
pub struct PlaceholderProposer;

impl PlaceholderProposer {
    pub fn new() -> Self {
        Self
    }

    /// Drop up to two filler words; otherwise normalize sentence spacing
    fn rewrite(text: &str) -> String {
        let mut result = text.to_string();
        let mut removed = 0;

        for (pattern, replacement) in FILLERS.iter() {
            if removed >= MAX_FILLER_REMOVALS {
                break;
            }
            if pattern.is_match(&result) {
                result = pattern.replacen(&result, 1, NoExpand(*replacement)).into_owned();
                removed += 1;
            }
        }

        if result == text {
            let sentences: Vec<&str> = text.split(". ").map(str::trim).filter(|s| !s.is_empty()).collect();
            if sentences.len() > 1 {
                result = sentences.join(". ");
                if !result.ends_with('.') {
                    result.push('.');
                }
            }
        }

        result
    }

    /// Soften the first formal connector found
    fn humanize(text: &str) -> String {
        SOFTENED_CONNECTORS
            .iter()
            .find(|(formal, _)| text.contains(formal))
            .map(|(formal, plain)| text.replacen(formal, plain, 1))
            .unwrap_or_else(|| text.to_string())
    }

    /// Simplify the first wordy phrase found
    fn clarify(text: &str) -> String {
        SIMPLIFICATIONS
            .iter()
            .find(|(pattern, _)| pattern.is_match(text))
            .map(|(pattern, plain)| pattern.replacen(text, 1, NoExpand(*plain)).into_owned())
            .unwrap_or_else(|| text.to_string())
    }
}

#[async_trait]
impl ProposalProvider for PlaceholderProposer {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn propose(&self, text: &str, intent: Intent) -> Result<Proposal> {
        let (proposed_text, explanation) = match intent {
            Intent::Rewrite => (
                Self::rewrite(text),
                "Improved clarity and flow while preserving the original meaning.",
            ),
            Intent::Humanize => (
                Self::humanize(text),
                "Made the text sound more natural while maintaining formality.",
            ),
            Intent::Clarify => (
                Self::clarify(text),
                "Simplified sentence structure without changing the ideas.",
            ),
        };

        Ok(Proposal {
            proposed_text,
            explanation: explanation.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_proposal_is_malformed() {
        assert!(matches!(
            check_proposal("Some original text here.", "  \n "),
            Err(GovernanceError::MalformedProviderOutput(_))
        ));
    }

    #[test]
    fn test_introduced_structure_is_malformed() {
        let original = "Revenue grew and costs fell over the year.";
        assert!(check_proposal(original, "- Revenue grew\n- Costs fell").is_err());
        assert!(check_proposal(original, "# Summary\nRevenue grew and costs fell.").is_err());
        assert!(check_proposal(original, "Revenue grew and costs fell [1].").is_err());
        assert!(check_proposal(original, "Revenue grew, and costs fell.").is_ok());
    }

    #[test]
    fn test_existing_structure_is_allowed() {
        let original = "1. Revenue grew\n2. Costs fell";
        assert!(check_proposal(original, "1. Revenue rose\n2. Costs dropped").is_ok());
    }

    #[tokio::test]
    async fn test_rewrite_removes_at_most_two_fillers() {
        let proposal = PlaceholderProposer::new()
            .propose(
                "It was very clear and really simple, just as expected.",
                Intent::Rewrite,
            )
            .await
            .unwrap();
        assert_eq!(proposal.proposed_text, "It was clear and simple, just as expected.");
    }

    #[tokio::test]
    async fn test_humanize_softens_first_connector() {
        let proposal = PlaceholderProposer::new()
            .propose(
                "Costs rose. Therefore, prices rose. However, demand held.",
                Intent::Humanize,
            )
            .await
            .unwrap();
        assert_eq!(
            proposal.proposed_text,
            "Costs rose. So, prices rose. However, demand held."
        );
    }

    #[tokio::test]
    async fn test_clarify_simplifies_phrase() {
        let proposal = PlaceholderProposer::new()
            .propose("We met In order to plan the budget.", Intent::Clarify)
            .await
            .unwrap();
        assert_eq!(proposal.proposed_text, "We met to plan the budget.");
    }
}
