//! LALR(1) table construction.
//!
//! The LR(0) automaton is built first; lookaheads are then attached to its
//! kernel items by spontaneous generation and propagation, which yields the
//! same tables as merging canonical LR(1) states with equal cores.

use crate::error::{Error, Result};
use crate::grammar::analysis::{GrammarAnalysis, END};
use crate::grammar::{Rule, Symbol};
use crate::{HashMap, HashSet};
use compact_str::{CompactString, format_compact};
use std::collections::{BTreeMap, BTreeSet};

/// Lookahead marker used while discovering propagation edges.
const PROPAGATE: &str = "$#";

/// LR parsing action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Shift to state
    Shift(usize),
    /// Reduce using the rule at this index
    Reduce(usize),
    /// Accept (successful parse)
    Accept,
}

/// An LR(0) item: rule index and dot position.
type Item = (usize, usize);

/// LALR(1) parsing table with action and goto tables
#[derive(Debug, Clone)]
pub struct ParseTable {
    /// Rules of the grammar followed by one `$root_<start>` rule per start symbol
    pub(crate) rules: Vec<Rule>,
    pub(crate) actions: Vec<HashMap<CompactString, Action>>,
    pub(crate) gotos: Vec<HashMap<CompactString, usize>>,
    pub(crate) start_states: HashMap<CompactString, usize>,
}

impl ParseTable {
    /// Build the table. Shift/reduce conflicts resolve as shift unless
    /// `strict`; reduce/reduce conflicts resolve by rule priority.
    pub fn build(rules: &[Rule], start: &[CompactString], strict: bool, debug: bool) -> Result<Self> {
        let mut all = rules.to_vec();
        let mut roots = Vec::with_capacity(start.len());
        for name in start {
            roots.push((name.clone(), all.len()));
            all.push(Rule::new(
                format_compact!("$root_{name}"),
                vec![Symbol::non_terminal(name.clone())],
                0,
            ));
        }

        let builder = TableBuilder::new(&all);
        let (kernels, transitions, start_states) = builder.lr0_automaton(&roots);
        let lookaheads = builder.lookaheads(&kernels, &transitions, &start_states, &roots);

        let root_rules: HashSet<usize> = roots.iter().map(|(_, idx)| *idx).collect();
        let mut actions = Vec::with_capacity(kernels.len());
        let mut gotos = Vec::with_capacity(kernels.len());
        for (state, kernel) in kernels.iter().enumerate() {
            let mut state_actions: HashMap<CompactString, Action> = HashMap::default();
            let mut state_gotos: HashMap<CompactString, usize> = HashMap::default();
            for (symbol, &target) in &transitions[state] {
                if symbol.is_terminal() {
                    state_actions.insert(symbol.name().clone(), Action::Shift(target));
                } else {
                    state_gotos.insert(symbol.name().clone(), target);
                }
            }

            let seeds: Vec<(usize, usize, CompactString)> = kernel
                .iter()
                .flat_map(|item| {
                    lookaheads[state]
                        .get(item)
                        .into_iter()
                        .flatten()
                        .map(move |la| (item.0, item.1, la.clone()))
                })
                .collect();
            let mut reductions: BTreeMap<CompactString, BTreeSet<usize>> = BTreeMap::new();
            for (rule, dot, la) in builder.closure1(seeds) {
                if dot == all[rule].expansion.len() {
                    reductions.entry(la).or_default().insert(rule);
                }
            }

            for (la, candidates) in reductions {
                if candidates.iter().any(|r| root_rules.contains(r)) {
                    state_actions.insert(la, Action::Accept);
                    continue;
                }
                let rule = resolve_reduce_reduce(&all, state, &la, &candidates)?;
                match state_actions.get(&la) {
                    Some(Action::Shift(_)) => {
                        if strict {
                            return Err(Error::grammar(format!(
                                "Shift/Reduce conflict for terminal {la} (state {state}, rule {})",
                                all[rule]
                            )));
                        }
                        if debug {
                            log::warn!(
                                "Shift/Reduce conflict for terminal {la}: (resolving as shift) against {}",
                                all[rule]
                            );
                        } else {
                            log::debug!("Shift/Reduce conflict for terminal {la}: (resolving as shift)");
                        }
                    }
                    _ => {
                        state_actions.insert(la, Action::Reduce(rule));
                    }
                }
            }
            actions.push(state_actions);
            gotos.push(state_gotos);
        }

        log::debug!("built LALR(1) table with {} states", actions.len());
        Ok(Self {
            rules: all,
            actions,
            gotos,
            start_states,
        })
    }

    #[must_use]
    pub fn num_states(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn action(&self, state: usize, terminal: &str) -> Option<Action> {
        self.actions.get(state)?.get(terminal).copied()
    }

    #[must_use]
    pub fn goto(&self, state: usize, non_terminal: &str) -> Option<usize> {
        self.gotos.get(state)?.get(non_terminal).copied()
    }

    #[must_use]
    pub fn start_state(&self, start: &str) -> Option<usize> {
        self.start_states.get(start).copied()
    }

    /// Terminals with an action in `state`, sorted.
    #[must_use]
    pub fn expected(&self, state: usize) -> Vec<String> {
        let mut names: Vec<String> = self
            .actions
            .get(state)
            .map(|actions| actions.keys().map(ToString::to_string).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// The terminals each state accepts, for contextual lexing.
    #[must_use]
    pub fn accepted_terminals(&self) -> HashMap<usize, HashSet<CompactString>> {
        self.actions
            .iter()
            .enumerate()
            .map(|(state, actions)| {
                (
                    state,
                    actions.keys().filter(|name| name.as_str() != END).cloned().collect(),
                )
            })
            .collect()
    }
}

fn resolve_reduce_reduce(all: &[Rule], state: usize, la: &str, candidates: &BTreeSet<usize>) -> Result<usize> {
    let best = candidates
        .iter()
        .map(|&r| all[r].priority())
        .max()
        .unwrap_or_default();
    let winners: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&r| all[r].priority() == best)
        .collect();
    match winners.as_slice() {
        [rule] => Ok(*rule),
        _ => {
            let listed: Vec<String> = winners.iter().map(|&r| all[r].to_string()).collect();
            Err(Error::grammar(format!(
                "Reduce/Reduce collision in state {state} on terminal {la} between the following rules: {}",
                listed.join(", ")
            )))
        }
    }
}

struct TableBuilder<'r> {
    rules: &'r [Rule],
    by_origin: HashMap<CompactString, Vec<usize>>,
    analysis: GrammarAnalysis,
}

type Transitions = Vec<BTreeMap<Symbol, usize>>;

impl<'r> TableBuilder<'r> {
    fn new(rules: &'r [Rule]) -> Self {
        let mut by_origin: HashMap<CompactString, Vec<usize>> = HashMap::default();
        for (i, rule) in rules.iter().enumerate() {
            by_origin.entry(rule.origin.name().clone()).or_default().push(i);
        }
        Self {
            rules,
            by_origin,
            analysis: GrammarAnalysis::new(rules, &[]),
        }
    }

    fn symbol_after_dot(&self, (rule, dot): Item) -> Option<&'r Symbol> {
        self.rules[rule].expansion.get(dot)
    }

    fn closure0(&self, kernel: &[Item]) -> BTreeSet<Item> {
        let mut closure: BTreeSet<Item> = kernel.iter().copied().collect();
        let mut stack: Vec<Item> = kernel.to_vec();
        while let Some(item) = stack.pop() {
            let Some(symbol) = self.symbol_after_dot(item) else {
                continue;
            };
            if symbol.is_terminal() {
                continue;
            }
            for &rule in self.by_origin.get(symbol.name()).into_iter().flatten() {
                if closure.insert((rule, 0)) {
                    stack.push((rule, 0));
                }
            }
        }
        closure
    }

    /// LR(1) closure of items with explicit lookaheads.
    fn closure1(&self, seeds: Vec<(usize, usize, CompactString)>) -> HashSet<(usize, usize, CompactString)> {
        let mut closure = HashSet::default();
        let mut stack = seeds;
        while let Some(entry) = stack.pop() {
            if closure.contains(&entry) {
                continue;
            }
            let (rule, dot, ref la) = entry;
            if let Some(symbol) = self.symbol_after_dot((rule, dot)) {
                if !symbol.is_terminal() {
                    let rest = &self.rules[rule].expansion[dot + 1..];
                    let (mut first, nullable) = self.analysis.first_of_sequence(rest);
                    if nullable {
                        first.insert(la.clone());
                    }
                    for &production in self.by_origin.get(symbol.name()).into_iter().flatten() {
                        for terminal in &first {
                            stack.push((production, 0, terminal.clone()));
                        }
                    }
                }
            }
            closure.insert(entry);
        }
        closure
    }

    fn lr0_automaton(
        &self,
        roots: &[(CompactString, usize)],
    ) -> (Vec<Vec<Item>>, Transitions, HashMap<CompactString, usize>) {
        let mut kernels: Vec<Vec<Item>> = Vec::new();
        let mut index: HashMap<Vec<Item>, usize> = HashMap::default();
        let mut transitions: Transitions = Vec::new();
        let mut start_states = HashMap::default();

        for (name, root) in roots {
            let kernel = vec![(*root, 0)];
            let id = kernels.len();
            index.insert(kernel.clone(), id);
            kernels.push(kernel);
            transitions.push(BTreeMap::new());
            start_states.insert(name.clone(), id);
        }

        let mut state = 0;
        while state < kernels.len() {
            let mut moves: BTreeMap<Symbol, BTreeSet<Item>> = BTreeMap::new();
            for item in self.closure0(&kernels[state]) {
                if let Some(symbol) = self.symbol_after_dot(item) {
                    moves.entry(symbol.clone()).or_default().insert((item.0, item.1 + 1));
                }
            }
            for (symbol, items) in moves {
                let kernel: Vec<Item> = items.into_iter().collect();
                let target = match index.get(&kernel) {
                    Some(&id) => id,
                    None => {
                        let id = kernels.len();
                        index.insert(kernel.clone(), id);
                        kernels.push(kernel);
                        transitions.push(BTreeMap::new());
                        id
                    }
                };
                transitions[state].insert(symbol, target);
            }
            state += 1;
        }
        (kernels, transitions, start_states)
    }

    fn lookaheads(
        &self,
        kernels: &[Vec<Item>],
        transitions: &Transitions,
        start_states: &HashMap<CompactString, usize>,
        roots: &[(CompactString, usize)],
    ) -> Vec<HashMap<Item, HashSet<CompactString>>> {
        let mut lookaheads: Vec<HashMap<Item, HashSet<CompactString>>> =
            vec![HashMap::default(); kernels.len()];
        let mut propagation: Vec<((usize, Item), (usize, Item))> = Vec::new();

        for (name, root) in roots {
            if let Some(&state) = start_states.get(name) {
                lookaheads[state]
                    .entry((*root, 0))
                    .or_default()
                    .insert(CompactString::const_new(END));
            }
        }

        for (state, kernel) in kernels.iter().enumerate() {
            for &item in kernel {
                let seeded = self.closure1(vec![(item.0, item.1, CompactString::const_new(PROPAGATE))]);
                for (rule, dot, la) in seeded {
                    let Some(symbol) = self.symbol_after_dot((rule, dot)) else {
                        continue;
                    };
                    let Some(&target) = transitions[state].get(symbol) else {
                        continue;
                    };
                    let moved = (rule, dot + 1);
                    if la == PROPAGATE {
                        propagation.push(((state, item), (target, moved)));
                    } else {
                        lookaheads[target].entry(moved).or_default().insert(la);
                    }
                }
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for &((from_state, from_item), (to_state, to_item)) in &propagation {
                let Some(source) = lookaheads[from_state].get(&from_item) else {
                    continue;
                };
                let pending: Vec<CompactString> = source
                    .iter()
                    .filter(|la| {
                        !lookaheads[to_state]
                            .get(&to_item)
                            .is_some_and(|existing| existing.contains(*la))
                    })
                    .cloned()
                    .collect();
                if !pending.is_empty() {
                    lookaheads[to_state].entry(to_item).or_default().extend(pending);
                    changed = true;
                }
            }
        }
        lookaheads
    }
}
