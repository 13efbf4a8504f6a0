//! # Splice Augmentation
//!
//! Extends a grammar so that previously parsed trees can stand in for the
//! rules that produce them. For every label a rule origin can produce (its
//! name, or the alias of one of its alternatives) a splice terminal
//! `TREE__<LABEL>` is synthesized, together with a rule
//! `origin -> TREE__<LABEL>`. Labels that sanitize to the same name, such
//! as `a-b` and `a_b`, get numbered terminals (`TREE__A_B`, `TREE__A_B_2`).
//!
//! Augmentation never mutates its input and is idempotent: running it over
//! an augmented grammar yields the same rules, terminals and label map.

use crate::grammar::conf::Callback;
use crate::grammar::terminal::tree_terminal_name;
use crate::grammar::{Pattern, Rule, RuleOptions, Symbol, TerminalDef};
use crate::syntax::Child;
use crate::{HashMap, HashSet};
use compact_str::{CompactString, format_compact};
use std::sync::Arc;

/// A grammar snapshot extended with splice terminals and rules.
#[derive(Debug, Clone)]
pub struct AugmentedGrammar {
    pub rules: Vec<Rule>,
    pub terminals: Vec<TerminalDef>,
    /// Tree label to splice terminal name
    pub tree_terminals: HashMap<CompactString, CompactString>,
}

impl AugmentedGrammar {
    /// Pass-through callbacks for the synthesized splice rules.
    ///
    /// Each returns its single child (the splice token) unchanged; the tree
    /// carried by the token is substituted after parsing.
    pub fn splice_callbacks(&self) -> impl Iterator<Item = (Rule, Callback)> + '_ {
        self.rules
            .iter()
            .filter(|rule| rule.options.template_source)
            .map(|rule| (rule.clone(), pass_through()))
    }
}

fn pass_through() -> Callback {
    Arc::new(|mut children: Vec<Child>| match children.len() {
        1 => children.remove(0),
        _ => Child::Tree(crate::syntax::Tree::new("_splice", children)),
    })
}

/// Synthesize splice terminals and rules for every label the grammar produces.
#[must_use]
pub fn augment(rules: &[Rule], terminals: &[TerminalDef]) -> AugmentedGrammar {
    // Origins and their labels, in first-appearance order
    let mut origins: Vec<(&Symbol, Vec<&CompactString>)> = Vec::new();
    for rule in rules.iter().filter(|r| !r.options.template_source) {
        let label = rule.label();
        match origins.iter_mut().find(|(origin, _)| *origin == &rule.origin) {
            Some((_, labels)) => {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            None => origins.push((&rule.origin, vec![label])),
        }
    }

    let mut new_terminals = terminals.to_vec();
    let mut known_terminals: HashSet<CompactString> =
        terminals.iter().map(|t| t.name.clone()).collect();
    let mut tree_terminals = HashMap::default();
    // Splice terminals already present, by the label they carry
    let mut by_label: HashMap<CompactString, CompactString> = terminals
        .iter()
        .filter_map(|t| match &t.pattern {
            Pattern::Tree { label } => Some((CompactString::from(label.as_str()), t.name.clone())),
            _ => None,
        })
        .collect();
    let mut new_rules = rules.to_vec();
    let mut known_rules: HashSet<Rule> = rules.iter().cloned().collect();

    for (origin, labels) in origins {
        let mut next_order = rules
            .iter()
            .filter(|r| &r.origin == origin)
            .map(|r| r.order)
            .max()
            .map_or(0, |order| order + 1);

        for label in labels {
            let terminal = match by_label.get(label) {
                Some(existing) => existing.clone(),
                None => {
                    let base = tree_terminal_name(label);
                    let mut terminal = base.clone();
                    let mut suffix = 2;
                    while known_terminals.contains(&terminal) {
                        terminal = format_compact!("{base}_{suffix}");
                        suffix += 1;
                    }
                    known_terminals.insert(terminal.clone());
                    by_label.insert(label.clone(), terminal.clone());
                    new_terminals.push(TerminalDef::new(
                        terminal.clone(),
                        Pattern::Tree {
                            label: label.to_string(),
                        },
                    ));
                    terminal
                }
            };
            tree_terminals
                .entry(label.clone())
                .or_insert_with(|| terminal.clone());

            let rule = Rule::new(origin.name().clone(), vec![Symbol::terminal(terminal)], next_order)
                .with_options(RuleOptions {
                    expand1: true,
                    template_source: true,
                    empty_indices: vec![false],
                    ..RuleOptions::default()
                });
            if known_rules.insert(rule.clone()) {
                log::trace!("synthesized splice rule {rule}");
                new_rules.push(rule);
                next_order += 1;
            }
        }
    }

    log::debug!(
        "augmented grammar: {} splice terminals, {} rules",
        tree_terminals.len(),
        new_rules.len()
    );
    AugmentedGrammar {
        rules: new_rules,
        terminals: new_terminals,
        tree_terminals,
    }
}
