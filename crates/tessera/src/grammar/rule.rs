use crate::grammar::Symbol;
use compact_str::CompactString;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Per-rule options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleOptions {
    pub keep_all_tokens: bool,
    /// Collapse a node with a single child into that child
    pub expand1: bool,
    pub priority: Option<i32>,
    /// Synthesized for splicing rather than written by the grammar author
    pub template_source: bool,
    /// Positions of elided optional symbols
    pub empty_indices: Vec<bool>,
}

impl RuleOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_keep_all_tokens(mut self, keep: bool) -> Self {
        self.keep_all_tokens = keep;
        self
    }

    #[must_use]
    pub fn with_expand1(mut self, expand1: bool) -> Self {
        self.expand1 = expand1;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Option<i32>) -> Self {
        self.priority = priority;
        self
    }
}

/// A production `origin -> expansion`.
///
/// Rules are identified by `(origin, expansion)`; order, alias and options
/// are carried along but do not take part in equality or hashing.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    pub origin: Symbol,
    pub expansion: Vec<Symbol>,
    /// Position among the alternatives of `origin`
    pub order: usize,
    pub alias: Option<CompactString>,
    pub options: RuleOptions,
}

impl Rule {
    pub fn new(origin: impl Into<CompactString>, expansion: Vec<Symbol>, order: usize) -> Self {
        Self {
            origin: Symbol::non_terminal(origin),
            expansion,
            order,
            alias: None,
            options: RuleOptions::default(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: Option<CompactString>) -> Self {
        self.alias = alias;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: RuleOptions) -> Self {
        self.options = options;
        self
    }

    /// Name given to trees built by this rule.
    #[must_use]
    pub fn label(&self) -> &CompactString {
        self.alias.as_ref().unwrap_or_else(|| self.origin.name())
    }

    /// Priority used for disambiguation; rules without one rank as zero.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.options.priority.unwrap_or(0)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin && self.expansion == other.expansion
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.origin.hash(state);
        self.expansion.hash(state);
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} :", self.origin)?;
        for symbol in &self.expansion {
            write!(f, " {symbol}")?;
        }
        f.write_str(">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashSet;

    #[test]
    fn test_rules_dedupe_by_origin_and_expansion() {
        let a = Rule::new("expr", vec![Symbol::terminal("NUMBER")], 0);
        let b = Rule::new("expr", vec![Symbol::terminal("NUMBER")], 3)
            .with_alias(Some("num".into()))
            .with_options(RuleOptions::new().with_expand1(true));
        let mut set = HashSet::default();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_label_prefers_alias() {
        let rule = Rule::new("paint", vec![], 0).with_alias(Some("color".into()));
        assert_eq!(rule.label(), "color");
        assert_eq!(Rule::new("paint", vec![], 0).label(), "paint");
    }

    #[test]
    fn test_display() {
        let rule = Rule::new("sum", vec![Symbol::non_terminal("a"), Symbol::terminal("PLUS")], 0);
        assert_eq!(rule.to_string(), "<sum : a PLUS>");
    }
}
