//! # Grammar Analysis
//!
//! Nullable, FIRST and FOLLOW sets over a flat rule list. The LALR table
//! builder uses FIRST sets for lookaheads; the Earley recognizer uses the
//! nullable set for its nullable-completion step.

use crate::grammar::{Rule, Symbol};
use crate::{HashMap, HashSet};
use compact_str::CompactString;

/// End-of-input marker used in FOLLOW sets and LALR lookaheads.
pub const END: &str = "$END";

#[derive(Debug, Clone, Default)]
pub struct GrammarAnalysis {
    nullable: HashSet<CompactString>,
    first: HashMap<CompactString, HashSet<CompactString>>,
    follow: HashMap<CompactString, HashSet<CompactString>>,
}

impl GrammarAnalysis {
    /// Compute all sets by fixed-point iteration. `start` symbols get
    /// [`END`] in their FOLLOW set.
    #[must_use]
    pub fn new(rules: &[Rule], start: &[CompactString]) -> Self {
        let mut analysis = Self::default();
        for rule in rules {
            analysis.first.entry(rule.origin.name().clone()).or_default();
            analysis.follow.entry(rule.origin.name().clone()).or_default();
        }
        for name in start {
            analysis
                .follow
                .entry(name.clone())
                .or_default()
                .insert(CompactString::const_new(END));
        }

        let mut changed = true;
        while changed {
            changed = false;
            for rule in rules {
                let origin = rule.origin.name();
                if !analysis.nullable.contains(origin)
                    && rule.expansion.iter().all(|s| analysis.is_nullable(s))
                {
                    analysis.nullable.insert(origin.clone());
                    changed = true;
                }

                let (first, _) = analysis.first_of_sequence(&rule.expansion);
                let entry = analysis.first.entry(origin.clone()).or_default();
                for terminal in first {
                    changed |= entry.insert(terminal);
                }
            }
        }

        changed = true;
        while changed {
            changed = false;
            for rule in rules {
                for (i, symbol) in rule.expansion.iter().enumerate() {
                    if symbol.is_terminal() {
                        continue;
                    }
                    let (first, nullable_rest) = analysis.first_of_sequence(&rule.expansion[i + 1..]);
                    let mut additions: Vec<CompactString> = first.into_iter().collect();
                    if nullable_rest {
                        if let Some(origin_follow) = analysis.follow.get(rule.origin.name()) {
                            additions.extend(origin_follow.iter().cloned());
                        }
                    }
                    let entry = analysis.follow.entry(symbol.name().clone()).or_default();
                    for terminal in additions {
                        changed |= entry.insert(terminal);
                    }
                }
            }
        }

        analysis
    }

    #[must_use]
    pub fn is_nullable(&self, symbol: &Symbol) -> bool {
        !symbol.is_terminal() && self.nullable.contains(symbol.name())
    }

    #[must_use]
    pub fn nullable(&self) -> &HashSet<CompactString> {
        &self.nullable
    }

    /// FIRST set of a non-terminal; empty for unknown names.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&HashSet<CompactString>> {
        self.first.get(name)
    }

    #[must_use]
    pub fn follow(&self, name: &str) -> Option<&HashSet<CompactString>> {
        self.follow.get(name)
    }

    /// FIRST set of a symbol sequence and whether the whole sequence is nullable.
    #[must_use]
    pub fn first_of_sequence(&self, symbols: &[Symbol]) -> (HashSet<CompactString>, bool) {
        let mut result = HashSet::default();
        for symbol in symbols {
            if symbol.is_terminal() {
                result.insert(symbol.name().clone());
                return (result, false);
            }
            if let Some(first) = self.first.get(symbol.name()) {
                result.extend(first.iter().cloned());
            }
            if !self.nullable.contains(symbol.name()) {
                return (result, false);
            }
        }
        (result, true)
    }
}
