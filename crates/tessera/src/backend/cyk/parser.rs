use crate::backend::cyk::cnf::{CnfGrammar, CnfSymbol, Source};
use crate::backend::cyk::RawTree;
use crate::backend::earley::chart::{Chart, EarleyGrammar};
use crate::error::{Error, ParseError, Result};
use crate::grammar::Rule;
use crate::lexer::Token;
use crate::{HashMap, HashSet};
use compact_str::CompactString;
use std::cmp::Reverse;

/// Best derivation found for a nonterminal over one span.
#[derive(Debug, Clone, Copy)]
struct Cell {
    rule: usize,
    /// Boundary between the two halves of a binary rule
    split: usize,
    rank: (Reverse<i32>, usize),
}

type Table = Vec<HashMap<CompactString, Cell>>;

/// CYK parser over the normal form of a grammar.
#[derive(Debug, Clone)]
pub struct CykParser {
    rules: Vec<Rule>,
    cnf: CnfGrammar,
    /// Recognizer used to locate failures
    recognizer: EarleyGrammar,
}

impl CykParser {
    pub fn new(rules: &[Rule]) -> Result<Self> {
        Ok(Self {
            rules: rules.to_vec(),
            cnf: CnfGrammar::new(rules)?,
            recognizer: EarleyGrammar::new(rules.to_vec(), HashSet::default()),
        })
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rank of a normal-form rule among the alternatives of its left-hand
    /// side: the outermost original rule's priority, then its order.
    fn rank(&self, cnf_rule: usize) -> (Reverse<i32>, usize) {
        let rule = &self.cnf.rules[cnf_rule];
        let outer = match (rule.skipped.first(), rule.source) {
            (Some(&unit), _) | (None, Source::Rule(unit)) => Some(&self.rules[unit]),
            _ => None,
        };
        outer.map_or((Reverse(0), 0), |r| (Reverse(r.priority()), r.order))
    }

    fn offer(&self, cell: &mut HashMap<CompactString, Cell>, cnf_rule: usize, split: usize) {
        let candidate = Cell {
            rule: cnf_rule,
            split,
            rank: self.rank(cnf_rule),
        };
        let lhs = self.cnf.rules[cnf_rule].lhs.clone();
        match cell.get(&lhs) {
            Some(existing) if existing.rank <= candidate.rank => {}
            _ => {
                cell.insert(lhs, candidate);
            }
        }
    }

    /// Parse the whole token list as `start`.
    pub fn parse(&self, tokens: &[Token], start: &str) -> Result<RawTree> {
        if self.rules.iter().all(|rule| rule.origin.name() != start) {
            return Err(Error::configuration(format!("Unknown start rule {start}")));
        }
        let n = tokens.len();
        if n == 0 {
            return Err(self.failure(tokens, start));
        }

        let index = |i: usize, j: usize| i * (n + 1) + j;
        let mut table: Table = vec![HashMap::default(); n * (n + 1)];

        for (i, token) in tokens.iter().enumerate() {
            let mut cell = HashMap::default();
            for &rule in self.cnf.terminal_rules.get(&token.kind).into_iter().flatten() {
                self.offer(&mut cell, rule, i + 1);
            }
            table[index(i, i + 1)] = cell;
        }

        for len in 2..=n {
            for i in 0..=n - len {
                let j = i + len;
                let mut cell = HashMap::default();
                for k in i + 1..j {
                    for left in table[index(i, k)].keys() {
                        for right in table[index(k, j)].keys() {
                            let Some(rules) = self.cnf.binary_rules.get(&(left.clone(), right.clone())) else {
                                continue;
                            };
                            for &rule in rules {
                                self.offer(&mut cell, rule, k);
                            }
                        }
                    }
                }
                table[index(i, j)] = cell;
            }
        }

        if !table[index(0, n)].contains_key(start) {
            return Err(self.failure(tokens, start));
        }
        let builder = Builder {
            parser: self,
            table: &table,
            tokens,
            index: &index,
        };
        builder
            .node(start, 0, n)
            .ok_or_else(|| Error::grammar(format!("No derivation of {start} over the input")))
    }

    /// Replay the tokens through a recognizer to find the first one that
    /// cannot continue any derivation of `start`.
    fn failure(&self, tokens: &[Token], start: &str) -> Error {
        let mut chart = Chart::new(&self.recognizer, 1);
        if let Err(err) = chart.seed(0, start) {
            return err;
        }
        let mut to_scan = chart.process(0);
        for (pos, token) in tokens.iter().enumerate() {
            chart.push_column();
            for &item in &to_scan {
                if self.recognizer.next_symbol(item).is_some_and(|s| *s.name() == token.kind) {
                    chart.add(pos + 1, item.advance());
                }
            }
            if chart.is_empty(pos + 1) {
                return ParseError::unexpected_token(token.clone(), chart.expected(&to_scan)).into();
            }
            to_scan = chart.process(pos + 1);
        }
        ParseError::unexpected_eof(chart.expected(&to_scan)).into()
    }
}

/// Rebuilds original-rule trees from the table.
struct Builder<'a, F> {
    parser: &'a CykParser,
    table: &'a Table,
    tokens: &'a [Token],
    index: &'a F,
}

impl<F: Fn(usize, usize) -> usize> Builder<'_, F> {
    fn cell(&self, name: &str, i: usize, j: usize) -> Option<Cell> {
        self.table[(self.index)(i, j)].get(name).copied()
    }

    /// The node for `name` over `[i, j)`, with skipped unit rules restored.
    fn node(&self, name: &str, i: usize, j: usize) -> Option<RawTree> {
        let cell = self.cell(name, i, j)?;
        let rule = &self.parser.cnf.rules[cell.rule];
        let Source::Rule(index) = rule.source else {
            return None;
        };
        let mut children = Vec::new();
        self.expand(cell, i, j, &mut children);
        let mut tree = RawTree::Node { rule: index, children };
        for &unit in rule.skipped.iter().rev() {
            tree = RawTree::Node {
                rule: unit,
                children: vec![tree],
            };
        }
        Some(tree)
    }

    /// Push the children the cell's rule contributes to its original rule.
    fn expand(&self, cell: Cell, i: usize, j: usize, out: &mut Vec<RawTree>) {
        let rule = &self.parser.cnf.rules[cell.rule];
        match rule.rhs.as_slice() {
            [CnfSymbol::Terminal(_)] => out.push(RawTree::Token(self.tokens[i].clone())),
            [left, right] => {
                self.piece(left.name(), i, cell.split, out);
                self.piece(right.name(), cell.split, j, out);
            }
            _ => {}
        }
    }

    /// Split pieces and terminal wrappers dissolve into their parent.
    fn piece(&self, name: &str, i: usize, j: usize, out: &mut Vec<RawTree>) {
        let Some(cell) = self.cell(name, i, j) else {
            return;
        };
        match self.parser.cnf.rules[cell.rule].source {
            Source::Rule(_) => out.extend(self.node(name, i, j)),
            Source::Split | Source::Term => self.expand(cell, i, j, out),
        }
    }
}
