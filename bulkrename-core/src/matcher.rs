use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Invalid search pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Finds the spans a search & replace stage rewrites.
///
/// Both the chain and the preview go through `find_matches`, so what is
/// highlighted is always exactly what gets replaced.
#[derive(Debug, Clone)]
pub enum Matcher {
    Literal(AhoCorasick),
    Pattern(Regex),
}

impl Matcher {
    pub fn literal(needle: &str, ignore_case: bool) -> Result<Self, ChainError> {
        let automaton = AhoCorasickBuilder::new()
            .ascii_case_insensitive(ignore_case)
            .match_kind(MatchKind::LeftmostFirst)
            .build([needle])
            .map_err(|e| ChainError::InvalidPattern {
                pattern: needle.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::Literal(automaton))
    }

    pub fn pattern(pattern: &str, ignore_case: bool) -> Result<Self, ChainError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| ChainError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::Pattern(regex))
    }

    pub fn build(search: &str, ignore_case: bool, use_regex: bool) -> Result<Self, ChainError> {
        if use_regex {
            Self::pattern(search, ignore_case)
        } else {
            Self::literal(search, ignore_case)
        }
    }

    /// Leftmost-first, non-overlapping byte ranges of every match in `text`.
    pub fn find_matches(&self, text: &str) -> Vec<Range<usize>> {
        match self {
            Self::Literal(automaton) => automaton
                .find_iter(text)
                .map(|m| m.start()..m.end())
                .collect(),
            Self::Pattern(regex) => regex.find_iter(text).map(|m| m.range()).collect(),
        }
    }

    /// Replace every match with `replacement` taken literally.
    pub fn replace_all(&self, text: &str, replacement: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut last_end = 0;
        for range in self.find_matches(text) {
            result.push_str(&text[last_end..range.start]);
            result.push_str(replacement);
            last_end = range.end;
        }
        result.push_str(&text[last_end..]);
        result
    }
}
