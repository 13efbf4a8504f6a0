//! Conversion of a grammar into Chomsky normal form.
//!
//! Three rewrites, in order:
//!
//! 1. Terminals inside expansions of two or more symbols are wrapped in
//!    `__T_<NAME>` nonterminals.
//! 2. Expansions longer than two symbols are split into a chain of binary
//!    `__SP_<rule>_<n>` rules.
//! 3. Unit rules `A -> B` are removed by copying every rule of `B` onto `A`,
//!    remembering the skipped unit rules so the original shape can be
//!    rebuilt.
//!
//! Every normal-form rule records where it came from, which is all the
//! parser needs to turn a binarized derivation back into original rules.

use crate::error::{Error, Result};
use crate::grammar::{Rule, Symbol};
use crate::{HashMap, HashSet};
use compact_str::{CompactString, format_compact};
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Prefix of the nonterminals wrapping a terminal.
pub const TERM_PREFIX: &str = "__T_";
/// Prefix of the nonterminals continuing a split expansion.
pub const SPLIT_PREFIX: &str = "__SP_";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CnfSymbol {
    Terminal(CompactString),
    NonTerminal(CompactString),
}

impl CnfSymbol {
    #[must_use]
    pub fn name(&self) -> &CompactString {
        match self {
            Self::Terminal(name) | Self::NonTerminal(name) => name,
        }
    }
}

/// Where a normal-form rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The original rule at this index, or the first piece of its split
    Rule(usize),
    /// A later piece of a split expansion
    Split,
    /// A terminal wrapper
    Term,
}

#[derive(Debug, Clone)]
pub struct CnfRule {
    pub lhs: CompactString,
    pub rhs: SmallVec<[CnfSymbol; 2]>,
    pub source: Source,
    /// Original unit rules skipped to reach this rule, outermost first
    pub skipped: Vec<usize>,
}

/// A grammar in Chomsky normal form, indexed for CYK.
#[derive(Debug, Clone)]
pub struct CnfGrammar {
    pub rules: Vec<CnfRule>,
    /// Rules `A -> T`, by terminal
    pub terminal_rules: HashMap<CompactString, Vec<usize>>,
    /// Rules `A -> B C`, by `(B, C)`
    pub binary_rules: HashMap<(CompactString, CompactString), Vec<usize>>,
}

impl CnfGrammar {
    /// Convert `rules`. Empty expansions have no normal form and are
    /// rejected.
    pub fn new(rules: &[Rule]) -> Result<Self> {
        if let Some(empty) = rules.iter().find(|rule| rule.expansion.is_empty()) {
            return Err(Error::grammar(format!(
                "CYK doesn't support empty rules (rule {empty})"
            )));
        }

        let mut converted = Vec::new();
        let mut wrapped: HashSet<CompactString> = HashSet::default();
        for (index, rule) in rules.iter().enumerate() {
            let long = rule.expansion.len() >= 2;
            let symbols: Vec<CnfSymbol> = rule
                .expansion
                .iter()
                .map(|symbol| match symbol {
                    Symbol::Terminal { name, .. } if long => {
                        if wrapped.insert(name.clone()) {
                            converted.push(CnfRule {
                                lhs: format_compact!("{TERM_PREFIX}{name}"),
                                rhs: SmallVec::from_elem(CnfSymbol::Terminal(name.clone()), 1),
                                source: Source::Term,
                                skipped: Vec::new(),
                            });
                        }
                        CnfSymbol::NonTerminal(format_compact!("{TERM_PREFIX}{name}"))
                    }
                    Symbol::Terminal { name, .. } => CnfSymbol::Terminal(name.clone()),
                    Symbol::NonTerminal { name } => CnfSymbol::NonTerminal(name.clone()),
                })
                .collect();
            split(index, rule.origin.name().clone(), symbols, &mut converted);
        }

        let converted = eliminate_units(converted);
        let mut grammar = Self {
            rules: converted,
            terminal_rules: HashMap::default(),
            binary_rules: HashMap::default(),
        };
        for (index, rule) in grammar.rules.iter().enumerate() {
            match rule.rhs.as_slice() {
                [CnfSymbol::Terminal(name)] => grammar.terminal_rules.entry(name.clone()).or_default().push(index),
                [left, right] => grammar
                    .binary_rules
                    .entry((left.name().clone(), right.name().clone()))
                    .or_default()
                    .push(index),
                _ => {}
            }
        }
        log::debug!(
            "converted {} rules into {} normal-form rules",
            rules.len(),
            grammar.rules.len()
        );
        Ok(grammar)
    }

    /// Whether `name` was introduced by the conversion.
    #[must_use]
    pub fn is_helper(name: &str) -> bool {
        name.starts_with(TERM_PREFIX) || name.starts_with(SPLIT_PREFIX)
    }
}

fn split(index: usize, lhs: CompactString, symbols: Vec<CnfSymbol>, out: &mut Vec<CnfRule>) {
    if symbols.len() <= 2 {
        out.push(CnfRule {
            lhs,
            rhs: SmallVec::from_vec(symbols),
            source: Source::Rule(index),
            skipped: Vec::new(),
        });
        return;
    }

    let count = symbols.len();
    let mut current = lhs;
    let mut source = Source::Rule(index);
    let mut rest = symbols.into_iter();
    for piece in 1..count - 1 {
        let Some(first) = rest.next() else { break };
        let next = format_compact!("{SPLIT_PREFIX}{index}_{piece}");
        out.push(CnfRule {
            lhs: current,
            rhs: SmallVec::from_iter([first, CnfSymbol::NonTerminal(next.clone())]),
            source,
            skipped: Vec::new(),
        });
        current = next;
        source = Source::Split;
    }
    out.push(CnfRule {
        lhs: current,
        rhs: rest.collect(),
        source,
        skipped: Vec::new(),
    });
}

fn is_unit(rule: &CnfRule) -> bool {
    matches!(rule.rhs.as_slice(), [CnfSymbol::NonTerminal(_)])
}

fn eliminate_units(rules: Vec<CnfRule>) -> Vec<CnfRule> {
    let mut units: HashMap<CompactString, Vec<(CompactString, usize)>> = HashMap::default();
    for rule in rules.iter().filter(|rule| is_unit(rule)) {
        if let (Source::Rule(index), [CnfSymbol::NonTerminal(target)]) = (rule.source, rule.rhs.as_slice()) {
            units.entry(rule.lhs.clone()).or_default().push((target.clone(), index));
        }
    }

    let mut by_lhs: HashMap<CompactString, Vec<usize>> = HashMap::default();
    for (index, rule) in rules.iter().enumerate().filter(|(_, rule)| !is_unit(rule)) {
        by_lhs.entry(rule.lhs.clone()).or_default().push(index);
    }

    let mut result: Vec<CnfRule> = rules.iter().filter(|rule| !is_unit(rule)).cloned().collect();
    let mut origins: Vec<&CompactString> = units.keys().collect();
    origins.sort();
    for origin in origins {
        // Shortest unit chain from `origin` to every reachable nonterminal
        let mut chains: HashMap<CompactString, Vec<usize>> = HashMap::default();
        chains.insert(origin.clone(), Vec::new());
        let mut queue = VecDeque::from([origin.clone()]);
        while let Some(current) = queue.pop_front() {
            let chain = chains.get(&current).cloned().unwrap_or_default();
            for (target, rule) in units.get(&current).into_iter().flatten() {
                if chains.contains_key(target) {
                    continue;
                }
                let mut extended = chain.clone();
                extended.push(*rule);
                chains.insert(target.clone(), extended);
                queue.push_back(target.clone());
            }
        }

        let mut reached: Vec<(CompactString, Vec<usize>)> =
            chains.into_iter().filter(|(target, _)| target != origin).collect();
        reached.sort();
        for (target, chain) in reached {
            for &index in by_lhs.get(&target).into_iter().flatten() {
                let base = &rules[index];
                let mut skipped = chain.clone();
                skipped.extend(base.skipped.iter().copied());
                result.push(CnfRule {
                    lhs: origin.clone(),
                    rhs: base.rhs.clone(),
                    source: base.source,
                    skipped,
                });
            }
        }
    }
    result
}
