//! Marker word lists used by the rule-based validators.
//!
//! Every closed set the validators match against lives here, keyed by
//! category, so the lists can be audited and extended from configuration
//! without touching control flow.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Category of a marker list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerCategory {
    /// Negation markers for the polarity detector
    Negation,

    /// Formal register markers
    Formal,

    /// Casual register markers
    Casual,

    /// Causal verb phrases
    Causation,

    /// Appeals to authority
    Authority,

    /// Logical connectors counted by the document scanner
    Connector,
}

const NEGATION: &[&str] = &["not", "no", "never", "neither", "nor", "none", "n't", "cannot"];

const FORMAL: &[&str] = &[
    "therefore",
    "furthermore",
    "moreover",
    "consequently",
    "subsequently",
    "shall",
    "hereby",
    "pursuant",
    "notwithstanding",
    "whereas",
    "aforementioned",
];

const CASUAL: &[&str] = &[
    "gonna", "wanna", "gotta", "kinda", "sorta", "yeah", "yep", "nope", "okay", "lol", "omg",
    "btw", "imo", "tbh", "stuff", "guys", "awesome", "cool",
];

const CAUSATION: &[&str] = &[
    "causes",
    "caused",
    "cause",
    "leads to",
    "lead to",
    "led to",
    "results in",
    "result in",
    "resulted in",
];

const AUTHORITY: &[&str] = &[
    "studies show",
    "studies indicate",
    "studies suggest",
    "research shows",
    "research indicates",
    "research suggests",
    "experts say",
    "experts believe",
    "experts agree",
];

const CONNECTOR: &[&str] = &["therefore", "however", "furthermore", "moreover"];

/// Any apostrophe a word processor might emit
const APOSTROPHE_CLASS: &str = "['\u{2018}\u{2019}]";

/// Category → markers mapping.
///
/// Markers are matched case-insensitively. Multi-word markers tolerate any
/// run of whitespace between words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicon {
    markers: BTreeMap<MarkerCategory, Vec<String>>,
}

impl Default for Lexicon {
    fn default() -> Self {
        let table: [(MarkerCategory, &[&str]); 6] = [
            (MarkerCategory::Negation, NEGATION),
            (MarkerCategory::Formal, FORMAL),
            (MarkerCategory::Casual, CASUAL),
            (MarkerCategory::Causation, CAUSATION),
            (MarkerCategory::Authority, AUTHORITY),
            (MarkerCategory::Connector, CONNECTOR),
        ];

        let markers = table
            .into_iter()
            .map(|(category, words)| (category, words.iter().map(|w| w.to_string()).collect()))
            .collect();

        Self { markers }
    }
}

impl Lexicon {
    /// Markers for a category (empty if the category was never populated)
    pub fn markers(&self, category: MarkerCategory) -> &[String] {
        self.markers
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Return a copy with extra markers appended to the given categories.
    ///
    /// Duplicates (case-insensitive) are skipped so the base list keeps
    /// its order.
    pub fn extended(&self, extra: &BTreeMap<MarkerCategory, Vec<String>>) -> Self {
        let mut lexicon = self.clone();
        for (category, words) in extra {
            let list = lexicon.markers.entry(*category).or_default();
            for word in words {
                let word = normalize_apostrophes(word.trim()).to_lowercase();
                if word.is_empty() || list.iter().any(|w| w.eq_ignore_ascii_case(&word)) {
                    continue;
                }
                list.push(word);
            }
        }
        lexicon
    }

    /// Compile a case-insensitive alternation of a category's markers.
    ///
    /// With `whole_words` set, markers that start or end with a word
    /// character get a `\b` anchor on that side. Markers containing an
    /// apostrophe (`n't`) are never anchored, and their apostrophe also
    /// matches the typographic quote marks.
    pub fn pattern(&self, category: MarkerCategory, whole_words: bool) -> Result<Regex, regex::Error> {
        build_alternation(self.markers(category), whole_words)
    }
}

fn build_alternation(markers: &[String], whole_words: bool) -> Result<Regex, regex::Error> {
    // An empty list must never match anything.
    if markers.is_empty() {
        return Regex::new(r"\b\B");
    }

    let alternatives: Vec<String> = markers
        .iter()
        .map(|marker| {
            let body = marker
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
                .replace('\'', APOSTROPHE_CLASS);

            // Contracted forms like `n't` are bound to their host word.
            if !whole_words || marker.contains('\'') {
                return body;
            }

            let starts_word = marker.chars().next().map_or(false, is_word_char);
            let ends_word = marker.chars().last().map_or(false, is_word_char);
            format!(
                "{}{}{}",
                if starts_word { r"\b" } else { "" },
                body,
                if ends_word { r"\b" } else { "" }
            )
        })
        .collect();

    RegexBuilder::new(&format!("(?:{})", alternatives.join("|")))
        .case_insensitive(true)
        .build()
}

fn normalize_apostrophes(text: &str) -> String {
    text.replace(|c: char| c == '\u{2018}' || c == '\u{2019}', "'")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_negation_set_is_closed() {
        let lexicon = Lexicon::default();
        assert_eq!(
            lexicon.markers(MarkerCategory::Negation),
            &["not", "no", "never", "neither", "nor", "none", "n't", "cannot"]
        );
    }

    #[test]
    fn test_whole_word_pattern() {
        let lexicon = Lexicon::default();
        let re = lexicon.pattern(MarkerCategory::Negation, true).unwrap();

        assert!(re.is_match("This is NOT fine"));
        assert!(re.is_match("we didn't go"));
        assert!(!re.is_match("a notable result"));
        assert!(!re.is_match("please ignore it"));
    }

    #[test]
    fn test_contractions_match_typographic_apostrophes() {
        let lexicon = Lexicon::default();
        for whole_words in [true, false] {
            let re = lexicon.pattern(MarkerCategory::Negation, whole_words).unwrap();
            assert!(re.is_match("we didn\u{2019}t go"));
            assert!(re.is_match("we didn\u{2018}t go"));
        }
    }

    #[test]
    fn test_extended_markers_normalize_apostrophes() {
        let mut extra = BTreeMap::new();
        extra.insert(MarkerCategory::Negation, vec!["ain\u{2019}t".to_string()]);

        let lexicon = Lexicon::default().extended(&extra);
        assert_eq!(
            lexicon.markers(MarkerCategory::Negation).last().map(String::as_str),
            Some("ain't")
        );

        let re = lexicon.pattern(MarkerCategory::Negation, true).unwrap();
        assert!(re.is_match("it ain\u{2019}t so"));
    }

    #[test]
    fn test_substring_pattern() {
        let lexicon = Lexicon::default();
        let re = lexicon.pattern(MarkerCategory::Negation, false).unwrap();

        assert!(re.is_match("a notable result"));
        assert!(re.is_match("please ignore it"));
    }

    #[test]
    fn test_multi_word_markers_tolerate_spacing() {
        let lexicon = Lexicon::default();
        let re = lexicon.pattern(MarkerCategory::Authority, true).unwrap();

        assert!(re.is_match("Studies   show that"));
        assert!(re.is_match("as experts\nsay"));
        assert!(!re.is_match("the studies showcase"));
    }

    #[test]
    fn test_extended_lexicon() {
        let mut extra = BTreeMap::new();
        extra.insert(
            MarkerCategory::Casual,
            vec!["Dude".to_string(), "gonna".to_string(), " ".to_string()],
        );

        let lexicon = Lexicon::default().extended(&extra);
        let casual = lexicon.markers(MarkerCategory::Casual);

        assert_eq!(casual.last().map(String::as_str), Some("dude"));
        assert_eq!(casual.iter().filter(|w| *w == "gonna").count(), 1);
        assert_eq!(casual.len(), CASUAL.len() + 1);
    }

    #[test]
    fn test_empty_category_never_matches() {
        let lexicon = Lexicon {
            markers: BTreeMap::new(),
        };
        let re = lexicon.pattern(MarkerCategory::Formal, true).unwrap();
        assert!(!re.is_match("therefore"));
        assert!(!re.is_match(""));
    }
}
