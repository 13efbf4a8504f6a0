//! Derivation extraction from a completed Earley chart.
//!
//! A derivation of `name` over `[start, end)` exists when the chart holds a
//! completed rule of `name` at `end` that began at `start`. Its children are
//! found right to left: the last symbol must end at `end` and begin at a
//! column holding the rule's item one symbol earlier.
//!
//! Extraction runs in two passes without recursing per tree level. The first
//! pass finds a [`Derivation`] for every span the result needs, keeping a
//! stack of spans whose search is waiting on a sub-span. The second pass
//! builds the nodes in completion order, so children always exist before
//! their parent.

use crate::backend::earley::chart::{Chart, Item};
use crate::backend::earley::config::Ambiguity;
use crate::grammar::{Callback, Rule, Symbol};
use crate::lexer::Token;
use crate::syntax::{Child, Tree};
use crate::{HashMap, HashSet};
use compact_str::CompactString;
use smallvec::SmallVec;

/// Label of the node that holds the alternatives of an ambiguous span.
pub const AMBIG: &str = "_ambig";

/// Terminal matches found while scanning, keyed by `(start, end, terminal)`.
pub type Scans = HashMap<ScanKey, Token>;

type ScanKey = (usize, usize, CompactString);

/// A nonterminal over `[start, end)`.
type SpanKey = (CompactString, usize, usize);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Token(ScanKey),
    Node(SpanKey),
}

/// One way a rule covers a span, as references to its children.
#[derive(Debug, Clone)]
struct Derivation {
    rule: usize,
    parts: Vec<Part>,
}

pub(crate) struct Extractor<'a> {
    chart: &'a Chart<'a>,
    callbacks: &'a [Option<Callback>],
    scans: &'a Scans,
    /// Earlier columns joined to a column by ignored text only
    gaps: &'a HashMap<usize, Vec<usize>>,
    ambiguity: Ambiguity,
    /// Finished spans; `None` when the span has no derivation
    memo: HashMap<SpanKey, Option<Vec<Derivation>>>,
    /// Spans with a derivation, in the order they were finished
    completed: Vec<SpanKey>,
    active: HashSet<SpanKey>,
}

impl<'a> Extractor<'a> {
    pub fn new(
        chart: &'a Chart<'a>,
        callbacks: &'a [Option<Callback>],
        scans: &'a Scans,
        gaps: &'a HashMap<usize, Vec<usize>>,
        ambiguity: Ambiguity,
    ) -> Self {
        Self {
            chart,
            callbacks,
            scans,
            gaps,
            ambiguity,
            memo: HashMap::default(),
            completed: Vec::new(),
            active: HashSet::default(),
        }
    }

    fn rules(&self) -> &'a [Rule] {
        &self.chart.grammar().rules
    }

    /// Columns a symbol ending at `end` may really end at.
    fn ends(&self, end: usize) -> SmallVec<[usize; 4]> {
        let mut ends = SmallVec::new();
        ends.push(end);
        if let Some(earlier) = self.gaps.get(&end) {
            ends.extend(earlier.iter().copied());
        }
        ends
    }

    fn joins(&self, origin: usize, end: usize) -> bool {
        origin == end || self.gaps.get(&end).is_some_and(|earlier| earlier.contains(&origin))
    }

    /// Build the tree for `name` over `[start, end)`.
    pub fn derive(&mut self, name: &str, start: usize, end: usize) -> Option<Child> {
        let root: SpanKey = (CompactString::from(name), start, end);
        let mut pending = vec![root.clone()];
        while let Some(key) = pending.last().cloned() {
            if self.memo.contains_key(&key) {
                pending.pop();
                continue;
            }
            self.active.insert(key.clone());
            match self.attempt(&key) {
                Ok(found) => {
                    pending.pop();
                    self.active.remove(&key);
                    if found.is_some() {
                        self.completed.push(key.clone());
                    }
                    self.memo.insert(key, found);
                }
                // Finish the sub-span first, then search this span again
                Err(needed) => pending.push(needed),
            }
        }
        self.assemble(&root)
    }

    /// Search `key` using finished spans only. `Err` names an unfinished
    /// sub-span the search depends on.
    fn attempt(&self, key: &SpanKey) -> Result<Option<Vec<Derivation>>, SpanKey> {
        let (name, start, end) = (key.0.as_str(), key.1, key.2);
        let rules = self.rules();
        let mut candidates: SmallVec<[usize; 4]> = SmallVec::from_slice(self.chart.completed(end, name, start));
        candidates.sort_by_key(|&rule| (std::cmp::Reverse(rules[rule].priority()), rules[rule].order, rule));

        let mut found = Vec::new();
        for rule in candidates {
            let len = rules[rule].expansion.len();
            match self.ambiguity {
                Ambiguity::Explicit => {
                    for parts in self.all_sequences(rule, len, start, end)? {
                        found.push(Derivation { rule, parts });
                    }
                }
                Ambiguity::Resolve | Ambiguity::Forest => {
                    let mut parts = Vec::new();
                    if self.first_sequence(rule, len, start, end, &mut parts)? {
                        parts.reverse();
                        found.push(Derivation { rule, parts });
                        break;
                    }
                }
            }
        }
        Ok((!found.is_empty()).then_some(found))
    }

    fn part(&self, symbol: &Symbol, start: usize, end: usize) -> Result<Option<Part>, SpanKey> {
        match symbol {
            Symbol::Terminal { name, .. } => {
                let key = (start, end, name.clone());
                Ok(self.scans.contains_key(&key).then_some(Part::Token(key)))
            }
            Symbol::NonTerminal { name } => {
                if self.chart.completed(end, name, start).is_empty() {
                    return Ok(None);
                }
                let key = (name.clone(), start, end);
                match self.memo.get(&key) {
                    Some(Some(_)) => Ok(Some(Part::Node(key))),
                    Some(None) => Ok(None),
                    // A cyclic derivation never yields a tree of its own
                    None if self.active.contains(&key) => Ok(None),
                    None => Err(key),
                }
            }
        }
    }

    /// First derivation of `rule`'s first `dot` symbols over `[origin, end)`,
    /// parts pushed right to left. Later symbols take the shortest span.
    fn first_sequence(
        &self,
        rule: usize,
        dot: usize,
        origin: usize,
        end: usize,
        acc: &mut Vec<Part>,
    ) -> Result<bool, SpanKey> {
        if dot == 0 {
            return Ok(self.joins(origin, end));
        }
        let symbol = &self.rules()[rule].expansion[dot - 1];
        let previous = Item::new(rule, dot - 1, origin);
        for e in self.ends(end) {
            for m in (origin..=e).rev() {
                if !self.chart.contains(m, &previous) {
                    continue;
                }
                let Some(part) = self.part(symbol, m, e)? else {
                    continue;
                };
                acc.push(part);
                if self.first_sequence(rule, dot - 1, origin, m, acc)? {
                    return Ok(true);
                }
                acc.pop();
            }
        }
        Ok(false)
    }

    /// Every derivation of `rule`'s first `dot` symbols over `[origin, end)`.
    fn all_sequences(&self, rule: usize, dot: usize, origin: usize, end: usize) -> Result<Vec<Vec<Part>>, SpanKey> {
        if dot == 0 {
            return Ok(if self.joins(origin, end) { vec![Vec::new()] } else { Vec::new() });
        }
        let symbol = &self.rules()[rule].expansion[dot - 1];
        let previous = Item::new(rule, dot - 1, origin);
        let mut sequences = Vec::new();
        for e in self.ends(end) {
            for m in (origin..=e).rev() {
                if !self.chart.contains(m, &previous) {
                    continue;
                }
                let Some(part) = self.part(symbol, m, e)? else {
                    continue;
                };
                for mut prefix in self.all_sequences(rule, dot - 1, origin, m)? {
                    prefix.push(part.clone());
                    sequences.push(prefix);
                }
            }
        }
        Ok(sequences)
    }

    /// Build the nodes reachable from `root`, children before parents.
    fn assemble(&mut self, root: &SpanKey) -> Option<Child> {
        if !matches!(self.memo.get(root), Some(Some(_))) {
            return None;
        }

        // How many parent derivations refer to each reachable span
        let mut uses: HashMap<SpanKey, usize> = HashMap::default();
        let mut reachable: HashSet<SpanKey> = HashSet::default();
        reachable.insert(root.clone());
        let mut stack = vec![root.clone()];
        while let Some(key) = stack.pop() {
            for derivation in self.memo.get(&key).and_then(Option::as_ref).into_iter().flatten() {
                for part in &derivation.parts {
                    if let Part::Node(child) = part {
                        *uses.entry(child.clone()).or_insert(0) += 1;
                        if reachable.insert(child.clone()) {
                            stack.push(child.clone());
                        }
                    }
                }
            }
        }

        let mut built: HashMap<SpanKey, Child> = HashMap::default();
        for key in std::mem::take(&mut self.completed) {
            if !reachable.contains(&key) {
                continue;
            }
            let Some(Some(derivations)) = self.memo.get(&key) else {
                continue;
            };
            let mut alternatives: Vec<Child> = Vec::with_capacity(derivations.len());
            for derivation in derivations {
                let children = derivation
                    .parts
                    .iter()
                    .filter_map(|part| self.take(part, &mut built, &mut uses))
                    .collect();
                let child = self.build(derivation.rule, children);
                if !alternatives.contains(&child) {
                    alternatives.push(child);
                }
            }
            let node = if alternatives.len() == 1 {
                alternatives.swap_remove(0)
            } else {
                Child::Tree(Tree::new(AMBIG, alternatives))
            };
            built.insert(key, node);
        }
        built.remove(root)
    }

    /// The built child for `part`; shared spans are cloned until their last use.
    fn take(&self, part: &Part, built: &mut HashMap<SpanKey, Child>, uses: &mut HashMap<SpanKey, usize>) -> Option<Child> {
        match part {
            Part::Token(scan) => self.scans.get(scan).cloned().map(Child::Token),
            Part::Node(key) => {
                let remaining = uses.get_mut(key)?;
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    built.remove(key)
                } else {
                    built.get(key).cloned()
                }
            }
        }
    }

    fn build(&self, rule: usize, children: Vec<Child>) -> Child {
        match self.callbacks.get(rule).and_then(Option::as_ref) {
            Some(callback) => callback(children),
            None => Child::Tree(Tree::new(self.rules()[rule].label().clone(), children)),
        }
    }
}
