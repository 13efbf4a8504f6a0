//! Chart data structure for Earley parser

use crate::error::{Error, Result};
use crate::grammar::{Rule, Symbol};
use crate::{HashMap, HashSet};
use compact_str::CompactString;
use smallvec::SmallVec;

/// An Earley item: a rule, the dot position in its expansion, and the
/// column where the rule's match began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    pub rule: usize,
    pub dot: usize,
    pub origin: usize,
}

impl Item {
    #[must_use]
    pub const fn new(rule: usize, dot: usize, origin: usize) -> Self {
        Self { rule, dot, origin }
    }

    #[must_use]
    pub const fn advance(self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self
        }
    }
}

/// Items recognized at one input position.
#[derive(Debug, Default)]
struct Column {
    items: Vec<Item>,
    seen: HashSet<Item>,
    /// Completed rules by (origin name, origin column)
    completed: HashMap<(CompactString, usize), SmallVec<[usize; 2]>>,
}

/// Grammar tables shared by every parse.
#[derive(Debug, Clone)]
pub struct EarleyGrammar {
    pub rules: Vec<Rule>,
    by_origin: HashMap<CompactString, Vec<usize>>,
    nullable: HashSet<CompactString>,
}

impl EarleyGrammar {
    pub fn new(rules: Vec<Rule>, nullable: HashSet<CompactString>) -> Self {
        let mut by_origin: HashMap<CompactString, Vec<usize>> = HashMap::default();
        for (index, rule) in rules.iter().enumerate() {
            by_origin.entry(rule.origin.name().clone()).or_default().push(index);
        }
        Self {
            rules,
            by_origin,
            nullable,
        }
    }

    #[must_use]
    pub fn rules_for(&self, name: &str) -> &[usize] {
        self.by_origin.get(name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn next_symbol(&self, item: Item) -> Option<&Symbol> {
        self.rules.get(item.rule)?.expansion.get(item.dot)
    }
}

/// Earley chart: one column of items per input position
pub struct Chart<'g> {
    grammar: &'g EarleyGrammar,
    columns: Vec<Column>,
}

impl<'g> Chart<'g> {
    pub fn new(grammar: &'g EarleyGrammar, columns: usize) -> Self {
        let mut chart = Self {
            grammar,
            columns: Vec::new(),
        };
        for _ in 0..columns.max(1) {
            chart.push_column();
        }
        chart
    }

    pub fn push_column(&mut self) {
        self.columns.push(Column::default());
    }

    #[must_use]
    pub fn is_empty(&self, pos: usize) -> bool {
        self.columns.get(pos).map_or(true, |column| column.items.is_empty())
    }

    /// Predict every rule of `start` at `pos`.
    pub fn seed(&mut self, pos: usize, start: &str) -> Result<()> {
        let rules = self.grammar.rules_for(start);
        if rules.is_empty() {
            return Err(Error::configuration(format!("Unknown start rule {start}")));
        }
        for &rule in rules {
            self.add(pos, Item::new(rule, 0, pos));
        }
        Ok(())
    }

    /// Add an item; returns whether it was new.
    pub fn add(&mut self, pos: usize, item: Item) -> bool {
        let grammar = self.grammar;
        let Some(column) = self.columns.get_mut(pos) else {
            return false;
        };
        if !column.seen.insert(item) {
            return false;
        }
        column.items.push(item);
        let rule = &grammar.rules[item.rule];
        if item.dot == rule.expansion.len() {
            column
                .completed
                .entry((rule.origin.name().clone(), item.origin))
                .or_default()
                .push(item.rule);
        }
        true
    }

    #[must_use]
    pub fn contains(&self, pos: usize, item: &Item) -> bool {
        self.columns.get(pos).is_some_and(|column| column.seen.contains(item))
    }

    /// Rules of `name` completed at `pos` that began at `origin`.
    #[must_use]
    pub fn completed(&self, pos: usize, name: &str, origin: usize) -> &[usize] {
        self.columns
            .get(pos)
            .and_then(|column| column.completed.get(&(CompactString::from(name), origin)))
            .map_or(&[], SmallVec::as_slice)
    }

    /// Run prediction and completion to a fixpoint at `pos`, returning the
    /// items that wait on a terminal.
    ///
    /// Nullable nonterminals are stepped over when predicted, so completions
    /// of empty derivations never have to revisit the column.
    pub fn process(&mut self, pos: usize) -> Vec<Item> {
        let grammar = self.grammar;
        let mut to_scan = Vec::new();
        let mut index = 0;
        while let Some(&item) = self.columns.get(pos).and_then(|column| column.items.get(index)) {
            index += 1;
            match grammar.next_symbol(item) {
                Some(Symbol::Terminal { .. }) => to_scan.push(item),
                Some(Symbol::NonTerminal { name }) => {
                    for &rule in grammar.rules_for(name) {
                        self.add(pos, Item::new(rule, 0, pos));
                    }
                    if grammar.nullable.contains(name) {
                        self.add(pos, item.advance());
                    }
                }
                None => {
                    let name = grammar.rules[item.rule].origin.name();
                    let waiting: Vec<Item> = self.columns[item.origin]
                        .items
                        .iter()
                        .filter(|w| {
                            matches!(grammar.next_symbol(**w), Some(Symbol::NonTerminal { name: n }) if n == name)
                        })
                        .copied()
                        .collect();
                    for w in waiting {
                        self.add(pos, w.advance());
                    }
                }
            }
        }
        to_scan
    }

    /// Names of the terminals the given items wait on.
    #[must_use]
    pub fn expected(&self, items: &[Item]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| self.grammar.next_symbol(*item))
            .map(|symbol| symbol.name().to_string())
            .collect()
    }

    #[must_use]
    pub const fn grammar(&self) -> &'g EarleyGrammar {
        self.grammar
    }
}
