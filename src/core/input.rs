//! Input bounds enforced before a request enters the pipeline.
//!
//! Rejects:
//! - Selections shorter or longer than the allowed range (code points,
//!   measured after trimming)
//! - Selections that look like a whole document rather than a passage

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static BIBLIOGRAPHY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)\[\d+\]|^\s*(?:references|bibliography|works cited)\s*$")
        .expect("bibliography pattern is valid")
});

/// Limits on the selected passage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputLimits {
    /// Minimum length in characters (default: 20)
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,

    /// Maximum length in characters (default: 1800)
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// More newlines than this marks a whole document (default: 50)
    #[serde(default = "default_max_newlines")]
    pub max_newlines: usize,

    /// Reference markers only reject selections longer than this (default: 500)
    #[serde(default = "default_bibliography_min_chars")]
    pub bibliography_min_chars: usize,
}

fn default_min_chars() -> usize {
    20
}
fn default_max_chars() -> usize {
    1800
}
fn default_max_newlines() -> usize {
    50
}
fn default_bibliography_min_chars() -> usize {
    500
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
            max_chars: default_max_chars(),
            max_newlines: default_max_newlines(),
            bibliography_min_chars: default_bibliography_min_chars(),
        }
    }
}

impl InputLimits {
    /// Validate the original selection
    pub fn validate_original(&self, text: &str) -> Result<(), InputViolation> {
        let trimmed = text.trim();
        let actual = trimmed.chars().count();

        if actual < self.min_chars {
            return Err(InputViolation::TooShort {
                actual,
                min: self.min_chars,
                max: self.max_chars,
            });
        }
        if actual > self.max_chars {
            return Err(InputViolation::TooLong {
                actual,
                min: self.min_chars,
                max: self.max_chars,
            });
        }

        let newlines = trimmed.matches('\n').count();
        if newlines > self.max_newlines {
            return Err(InputViolation::DocumentLike {
                reason: format!("{} line breaks (limit {})", newlines, self.max_newlines),
            });
        }

        if actual > self.bibliography_min_chars && BIBLIOGRAPHY_RE.is_match(trimmed) {
            return Err(InputViolation::DocumentLike {
                reason: "contains a reference list".to_string(),
            });
        }

        Ok(())
    }
}

/// Input rejection reasons
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputViolation {
    #[error("Selected text is too short: {actual} < {min} characters")]
    TooShort { actual: usize, min: usize, max: usize },

    #[error("Selected text is too long: {actual} > {max} characters")]
    TooLong { actual: usize, min: usize, max: usize },

    #[error("Selected text looks like a full document: {reason}")]
    DocumentLike { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = InputLimits::default();
        assert_eq!(limits.min_chars, 20);
        assert_eq!(limits.max_chars, 1800);
        assert_eq!(limits.max_newlines, 50);
    }

    #[test]
    fn test_bounds_use_trimmed_code_points() {
        let limits = InputLimits::default();

        let exact_min = format!("   {}   ", "x".repeat(20));
        assert!(limits.validate_original(&exact_min).is_ok());

        let padded_short = format!("          {}          ", "x".repeat(19));
        assert_eq!(
            limits.validate_original(&padded_short),
            Err(InputViolation::TooShort { actual: 19, min: 20, max: 1800 })
        );

        // 1800 multi-byte characters are still 1800 characters
        assert!(limits.validate_original(&"é".repeat(1800)).is_ok());
        assert!(matches!(
            limits.validate_original(&"é".repeat(1801)),
            Err(InputViolation::TooLong { actual: 1801, .. })
        ));
    }

    #[test]
    fn test_document_like_newlines() {
        let limits = InputLimits::default();
        let text = vec!["line of text"; 52].join("\n");
        assert!(matches!(
            limits.validate_original(&text),
            Err(InputViolation::DocumentLike { .. })
        ));
    }

    #[test]
    fn test_bibliography_only_rejected_when_long() {
        let limits = InputLimits::default();

        let short = "A single cited passage [1] is perfectly fine to rewrite.";
        assert!(limits.validate_original(short).is_ok());

        let long = format!("{} [1]\nReferences\n", "word ".repeat(120));
        assert!(matches!(
            limits.validate_original(&long),
            Err(InputViolation::DocumentLike { .. })
        ));
    }
}
