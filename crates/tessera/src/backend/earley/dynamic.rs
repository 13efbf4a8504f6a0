//! Scannerless Earley parsing.
//!
//! Terminals are matched by regex directly against the text at every column
//! the chart reaches, so the parser decides which terminal a stretch of text
//! is. Ignored terminals carry the waiting items across the ignored text.

use crate::backend::earley::chart::{Chart, EarleyGrammar, Item};
use crate::backend::earley::config::{Ambiguity, EarleyConfig};
use crate::backend::earley::forest::{Extractor, Scans};
use crate::error::{Error, ParseError, Result};
use crate::grammar::{Callback, GrammarAnalysis, LexerConf, ParserConf, Symbol};
use crate::lexer::pattern::CompiledPattern;
use crate::lexer::{Span, Token};
use crate::syntax::Child;
use crate::{HashMap, HashSet};
use compact_str::CompactString;
use memchr::memchr_iter;
use smallvec::SmallVec;

/// Line starts of a text, for computing spans at arbitrary offsets.
struct LineIndex<'t> {
    text: &'t str,
    starts: Vec<usize>,
}

impl<'t> LineIndex<'t> {
    fn new(text: &'t str) -> Self {
        let mut starts = vec![0];
        starts.extend(memchr_iter(b'\n', text.as_bytes()).map(|nl| nl + 1));
        Self { text, starts }
    }

    fn line_col(&self, pos: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= pos);
        let line_start = self.starts[line - 1];
        (line, self.text[line_start..pos].chars().count() + 1)
    }

    fn span(&self, start: usize, end: usize) -> Span {
        let (line, column) = self.line_col(start);
        let (end_line, end_column) = self.line_col(end);
        Span {
            start_pos: start,
            line,
            column,
            end_pos: end,
            end_line,
            end_column,
        }
    }
}

/// Earley parser that lexes as it parses.
pub struct DynamicEarleyParser {
    grammar: EarleyGrammar,
    callbacks: Vec<Option<Callback>>,
    terminals: HashMap<CompactString, CompiledPattern>,
    ignore: Vec<(CompactString, CompiledPattern)>,
    config: EarleyConfig,
}

impl DynamicEarleyParser {
    pub fn new(lexer_conf: &LexerConf, parser_conf: &ParserConf, config: EarleyConfig) -> Result<Self> {
        if config.ambiguity == Ambiguity::Forest {
            return Err(Error::configuration(
                "The Earley backend builds trees; ambiguity='forest' is not supported",
            ));
        }
        if !lexer_conf.callbacks.is_empty() {
            return Err(Error::grammar(
                "Dynamic Earley doesn't support lexer callbacks, which the grammar declares",
            ));
        }

        let used: HashSet<&CompactString> = parser_conf
            .rules
            .iter()
            .flat_map(|rule| rule.expansion.iter())
            .filter(|symbol| symbol.is_terminal())
            .map(Symbol::name)
            .chain(lexer_conf.ignore.iter())
            .collect();

        let mut terminals = HashMap::default();
        for terminal in &lexer_conf.terminals {
            if !used.contains(&terminal.name) {
                continue;
            }
            let compiled = CompiledPattern::new(terminal, &lexer_conf.global_flags)?;
            if compiled.min_width == 0 {
                return Err(Error::grammar(format!(
                    "Dynamic Earley doesn't allow zero-width terminals (terminal {} matches the empty string)",
                    terminal.name
                )));
            }
            terminals.insert(terminal.name.clone(), compiled);
        }
        if let Some(missing) = used.iter().find(|name| !terminals.contains_key(name.as_str())) {
            return Err(Error::grammar(format!("Terminal {missing} is used but not defined")));
        }

        let ignore = lexer_conf
            .ignore
            .iter()
            .filter_map(|name| terminals.get(name).map(|pattern| (name.clone(), pattern.clone())))
            .collect();

        let analysis = GrammarAnalysis::new(&parser_conf.rules, &parser_conf.start);
        let callbacks = parser_conf
            .rules
            .iter()
            .map(|rule| parser_conf.callbacks.get(rule).cloned())
            .collect();
        log::debug!(
            "built dynamic Earley parser for {} terminals (complete_lex: {})",
            terminals.len(),
            config.complete_lex
        );
        Ok(Self {
            grammar: EarleyGrammar::new(parser_conf.rules.clone(), analysis.nullable().clone()),
            callbacks,
            terminals,
            ignore,
            config,
        })
    }

    /// Lengths of the matches of `terminal` at the start of `rest`.
    fn match_lengths(&self, terminal: &str, rest: &str) -> SmallVec<[usize; 2]> {
        let mut lengths = SmallVec::new();
        let Some(pattern) = self.terminals.get(terminal) else {
            return lengths;
        };
        let Some(longest) = pattern.match_prefix(rest).filter(|&len| len > 0) else {
            return lengths;
        };
        lengths.push(longest);
        if self.config.complete_lex {
            for cut in (1..longest).rev().filter(|&cut| rest.is_char_boundary(cut)) {
                if let Some(len) = pattern.match_prefix(&rest[..cut]).filter(|&len| len > 0) {
                    if !lengths.contains(&len) {
                        lengths.push(len);
                    }
                }
            }
        }
        lengths
    }

    /// Parse the whole of `text` as `start`.
    pub fn parse(&self, text: &str, start: &str) -> Result<Child> {
        let end = text.len();
        let lines = LineIndex::new(text);
        let mut chart = Chart::new(&self.grammar, end + 1);
        chart.seed(0, start)?;

        let mut scans = Scans::default();
        let mut gaps: HashMap<usize, Vec<usize>> = HashMap::default();
        let mut furthest = 0;
        let mut to_scan = Vec::new();

        for pos in 0..=end {
            if chart.is_empty(pos) {
                continue;
            }
            to_scan = chart.process(pos);
            if pos == end {
                break;
            }

            let rest = &text[pos..];
            let mut lengths: HashMap<CompactString, SmallVec<[usize; 2]>> = HashMap::default();
            for &item in &to_scan {
                let Some(terminal) = self.grammar.next_symbol(item).map(|s| s.name().clone()) else {
                    continue;
                };
                let matches = lengths
                    .entry(terminal.clone())
                    .or_insert_with(|| self.match_lengths(&terminal, rest))
                    .clone();
                for len in matches {
                    chart.add(pos + len, item.advance());
                    scans.entry((pos, pos + len, terminal.clone())).or_insert_with(|| {
                        Token::new(terminal.clone(), &rest[..len]).with_span(Some(lines.span(pos, pos + len)))
                    });
                    furthest = furthest.max(pos + len);
                }
            }

            for (name, pattern) in &self.ignore {
                let Some(len) = pattern.match_prefix(rest).filter(|&len| len > 0) else {
                    continue;
                };
                let target = pos + len;
                log::trace!("ignoring {name} at {pos}..{target}");
                for &item in &to_scan {
                    chart.add(target, item);
                }
                let finished: Vec<Item> = chart
                    .completed(pos, start, 0)
                    .iter()
                    .map(|&rule| Item::new(rule, self.grammar.rules[rule].expansion.len(), 0))
                    .collect();
                for item in finished {
                    chart.add(target, item);
                }
                let mut joined = gaps.get(&pos).cloned().unwrap_or_default();
                joined.push(pos);
                let entry = gaps.entry(target).or_default();
                for from in joined {
                    if !entry.contains(&from) {
                        entry.push(from);
                    }
                }
                furthest = furthest.max(target);
            }

            if furthest <= pos {
                let (line, column) = lines.line_col(pos);
                return Err(ParseError::UnexpectedCharacters {
                    character: rest.chars().next().unwrap_or('\0'),
                    pos,
                    line,
                    column,
                    allowed: sorted(chart.expected(&to_scan)),
                }
                .into());
            }
        }

        if chart.completed(end, start, 0).is_empty() {
            return Err(ParseError::unexpected_eof(chart.expected(&to_scan)).into());
        }

        let mut extractor = Extractor::new(&chart, &self.callbacks, &scans, &gaps, self.config.ambiguity);
        extractor
            .derive(start, 0, end)
            .ok_or_else(|| Error::grammar(format!("No finite derivation of {start}")))
    }
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names.dedup();
    names
}

impl std::fmt::Debug for DynamicEarleyParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicEarleyParser")
            .field("rules", &self.grammar.rules.len())
            .field("terminals", &self.terminals.len())
            .field("config", &self.config)
            .finish()
    }
}
