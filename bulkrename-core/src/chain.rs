use crate::matcher::{ChainError, Matcher};
use serde::{Deserialize, Serialize};

/// The ordered text transformations applied to every entry of a session.
///
/// Stages always run in this order, each only when its parameter differs
/// from the default: trim begin, trim end, add prefix, add suffix, search &
/// replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformChain {
    /// Characters to remove from the start
    #[serde(default)]
    pub trim_begin: usize,
    /// Characters to remove from the end
    #[serde(default)]
    pub trim_end: usize,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    /// Text (or pattern) to search for; empty disables the stage
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub replace: String,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub use_regex: bool,
}

/// A single change to one chain parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEdit {
    TrimBegin(usize),
    TrimEnd(usize),
    Prefix(String),
    Suffix(String),
    Search(String),
    Replace(String),
    IgnoreCase(bool),
    UseRegex(bool),
}

/// How many characters the trim stages take off a name of a given length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimPlan {
    pub begin: usize,
    pub end: usize,
    /// Both trims together cover the whole name: the result is empty
    pub removes_everything: bool,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.trim_begin == 0
            && self.trim_end == 0
            && self.prefix.is_empty()
            && self.suffix.is_empty()
            && self.search.is_empty()
    }

    pub fn edit(&mut self, edit: ChainEdit) {
        match edit {
            ChainEdit::TrimBegin(n) => self.trim_begin = n,
            ChainEdit::TrimEnd(n) => self.trim_end = n,
            ChainEdit::Prefix(s) => self.prefix = s,
            ChainEdit::Suffix(s) => self.suffix = s,
            ChainEdit::Search(s) => self.search = s,
            ChainEdit::Replace(s) => self.replace = s,
            ChainEdit::IgnoreCase(b) => self.ignore_case = b,
            ChainEdit::UseRegex(b) => self.use_regex = b,
        }
    }

    /// Trim amounts for a name that is `len` characters long.
    ///
    /// Each trim is clamped to `len - 1` so one character survives it on its
    /// own; only both trims together may remove everything.
    pub fn trim_plan(&self, len: usize) -> TrimPlan {
        let begin = self.trim_begin.min(len.saturating_sub(1));
        let end = self.trim_end.min((len - begin).saturating_sub(1));
        let removes_everything = self.trim_begin > 0
            && self.trim_end > 0
            && self.trim_begin.saturating_add(self.trim_end) >= len;
        TrimPlan {
            begin,
            end,
            removes_everything,
        }
    }

    /// The search & replace matcher, if that stage is active.
    pub fn matcher(&self) -> Result<Option<Matcher>, ChainError> {
        if self.search.is_empty() {
            return Ok(None);
        }
        Matcher::build(&self.search, self.ignore_case, self.use_regex).map(Some)
    }

    pub fn compile(&self) -> Result<CompiledChain<'_>, ChainError> {
        Ok(CompiledChain {
            chain: self,
            matcher: self.matcher()?,
        })
    }

    /// Run the chain over a single name.
    pub fn apply(&self, text: &str) -> Result<String, ChainError> {
        Ok(self.compile()?.apply(text))
    }
}

/// A chain whose search pattern has been compiled once for a whole batch.
#[derive(Debug, Clone)]
pub struct CompiledChain<'a> {
    chain: &'a TransformChain,
    matcher: Option<Matcher>,
}

impl CompiledChain<'_> {
    pub fn chain(&self) -> &TransformChain {
        self.chain
    }

    pub fn matcher(&self) -> Option<&Matcher> {
        self.matcher.as_ref()
    }

    pub fn apply(&self, text: &str) -> String {
        let chain = self.chain;
        let len = text.chars().count();
        let trim = chain.trim_plan(len);
        if trim.removes_everything {
            return String::new();
        }

        let mut name: String = text
            .chars()
            .skip(trim.begin)
            .take(len - trim.begin - trim.end)
            .collect();

        if !chain.prefix.is_empty() {
            name.insert_str(0, &chain.prefix);
        }
        if !chain.suffix.is_empty() {
            name.push_str(&chain.suffix);
        }
        if let Some(matcher) = &self.matcher {
            name = matcher.replace_all(&name, &chain.replace);
        }
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> TransformChain {
        TransformChain::new()
    }

    #[test]
    fn test_identity_chain_leaves_name_untouched() {
        let chain = chain();
        assert!(chain.is_identity());
        assert_eq!(chain.apply("Rock_01").unwrap(), "Rock_01");
    }

    #[test]
    fn test_trim_begin_and_end() {
        let mut chain = chain();
        chain.edit(ChainEdit::TrimBegin(2));
        chain.edit(ChainEdit::TrimEnd(1));
        assert_eq!(chain.apply("T_Rock1").unwrap(), "Rock");
    }

    #[test]
    fn test_single_trim_keeps_one_character() {
        let mut chain = chain();
        chain.edit(ChainEdit::TrimBegin(10));
        assert_eq!(chain.apply("abcde").unwrap(), "e");

        let mut chain = TransformChain::new();
        chain.edit(ChainEdit::TrimEnd(10));
        assert_eq!(chain.apply("abcde").unwrap(), "a");
    }

    #[test]
    fn test_both_trims_covering_name_empty_it() {
        let mut chain = chain();
        chain.edit(ChainEdit::TrimBegin(10));
        chain.edit(ChainEdit::TrimEnd(10));
        chain.edit(ChainEdit::Prefix("P_".to_string()));
        assert_eq!(chain.apply("abcde").unwrap(), "");
    }

    #[test]
    fn test_both_trims_exactly_covering_name() {
        let mut chain = chain();
        chain.edit(ChainEdit::TrimBegin(3));
        chain.edit(ChainEdit::TrimEnd(2));
        assert_eq!(chain.apply("abcde").unwrap(), "");
        assert_eq!(chain.apply("abcdef").unwrap(), "d");
    }

    #[test]
    fn test_trim_counts_characters_not_bytes() {
        let mut chain = chain();
        chain.edit(ChainEdit::TrimBegin(1));
        assert_eq!(chain.apply("éa").unwrap(), "a");
    }

    #[test]
    fn test_prefix_and_suffix() {
        let mut chain = chain();
        chain.edit(ChainEdit::Prefix("SM_".to_string()));
        chain.edit(ChainEdit::Suffix("_LOD0".to_string()));
        assert_eq!(chain.apply("Chair").unwrap(), "SM_Chair_LOD0");
    }

    #[test]
    fn test_search_replace_literal() {
        let mut chain = chain();
        chain.edit(ChainEdit::Search("foo".to_string()));
        chain.edit(ChainEdit::Replace("bar".to_string()));
        assert_eq!(chain.apply("foofoo").unwrap(), "barbar");
    }

    #[test]
    fn test_search_replace_ignore_case() {
        let mut chain = chain();
        chain.edit(ChainEdit::Search("rock".to_string()));
        chain.edit(ChainEdit::Replace("Stone".to_string()));
        assert_eq!(chain.apply("Rock_rock").unwrap(), "Rock_Stone");
        chain.edit(ChainEdit::IgnoreCase(true));
        assert_eq!(chain.apply("Rock_rock").unwrap(), "Stone_Stone");
    }

    #[test]
    fn test_search_replace_regex() {
        let mut chain = chain();
        chain.edit(ChainEdit::Search(r"_\d+$".to_string()));
        chain.edit(ChainEdit::Replace(String::new()));
        chain.edit(ChainEdit::UseRegex(true));
        assert_eq!(chain.apply("Rock_001").unwrap(), "Rock");
    }

    #[test]
    fn test_search_runs_after_prefix_and_suffix() {
        let mut chain = chain();
        chain.edit(ChainEdit::Prefix("x".to_string()));
        chain.edit(ChainEdit::Search("x".to_string()));
        chain.edit(ChainEdit::Replace("y".to_string()));
        assert_eq!(chain.apply("axb").unwrap(), "yayb");
    }

    #[test]
    fn test_invalid_regex_is_reported() {
        let mut chain = chain();
        chain.edit(ChainEdit::Search("[".to_string()));
        chain.edit(ChainEdit::UseRegex(true));
        assert!(chain.apply("name").is_err());
    }

    #[test]
    fn test_trim_plan() {
        let mut chain = chain();
        chain.trim_begin = 2;
        chain.trim_end = 2;
        assert_eq!(
            chain.trim_plan(6),
            TrimPlan {
                begin: 2,
                end: 2,
                removes_everything: false
            }
        );
        assert!(chain.trim_plan(4).removes_everything);
        assert_eq!(chain.trim_plan(0).begin, 0);
    }
}
