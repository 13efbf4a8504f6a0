//! Earley parser over a token stream

use crate::backend::earley::chart::{Chart, EarleyGrammar};
use crate::backend::earley::config::{Ambiguity, EarleyConfig};
use crate::backend::earley::forest::{Extractor, Scans};
use crate::backend::TermMatch;
use crate::error::{Error, ParseError, Result};
use crate::grammar::{Callback, GrammarAnalysis, ParserConf};
use crate::lexer::TokenSource;
use crate::syntax::Child;
use crate::HashMap;
use compact_str::CompactString;
use std::sync::Arc;

/// Earley parser fed by a lexer.
///
/// Whether a token can stand for a terminal is decided by a [`TermMatch`]
/// predicate, so tokens that carry trees or host values can be matched by
/// their payload instead of their name.
pub struct EarleyParser {
    grammar: EarleyGrammar,
    callbacks: Vec<Option<Callback>>,
    term_matcher: Arc<dyn TermMatch>,
    config: EarleyConfig,
}

impl EarleyParser {
    pub fn new(conf: &ParserConf, term_matcher: Arc<dyn TermMatch>, config: EarleyConfig) -> Result<Self> {
        if config.ambiguity == Ambiguity::Forest {
            return Err(Error::configuration(
                "The Earley backend builds trees; ambiguity='forest' is not supported",
            ));
        }
        let analysis = GrammarAnalysis::new(&conf.rules, &conf.start);
        let callbacks = conf.rules.iter().map(|rule| conf.callbacks.get(rule).cloned()).collect();
        let grammar = EarleyGrammar::new(conf.rules.clone(), analysis.nullable().clone());
        log::debug!("built Earley parser for {} rules ({})", conf.rules.len(), config.ambiguity);
        Ok(Self {
            grammar,
            callbacks,
            term_matcher,
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &EarleyConfig {
        &self.config
    }

    /// Parse every token of `source` as `start`.
    pub fn parse(&self, source: &mut dyn TokenSource, start: &str) -> Result<Child> {
        let mut chart = Chart::new(&self.grammar, 1);
        chart.seed(0, start)?;

        let mut scans = Scans::default();
        let mut pos = 0;
        let mut to_scan = chart.process(pos);
        while let Some(token) = source.next_token(None)? {
            chart.push_column();
            let mut verdicts: HashMap<CompactString, bool> = HashMap::default();
            for &item in &to_scan {
                let Some(terminal) = self.grammar.next_symbol(item).map(|s| s.name().clone()) else {
                    continue;
                };
                let matched = match verdicts.get(&terminal) {
                    Some(&verdict) => verdict,
                    None => {
                        let verdict = self.term_matcher.matches(&terminal, &token)?;
                        verdicts.insert(terminal.clone(), verdict);
                        verdict
                    }
                };
                if matched {
                    chart.add(pos + 1, item.advance());
                    scans.entry((pos, pos + 1, terminal)).or_insert_with(|| token.clone());
                }
            }
            if chart.is_empty(pos + 1) {
                return Err(ParseError::unexpected_token(token, chart.expected(&to_scan)).into());
            }
            pos += 1;
            to_scan = chart.process(pos);
        }

        if chart.completed(pos, start, 0).is_empty() {
            return Err(ParseError::unexpected_eof(chart.expected(&to_scan)).into());
        }

        let gaps = HashMap::default();
        let mut extractor = Extractor::new(&chart, &self.callbacks, &scans, &gaps, self.config.ambiguity);
        extractor
            .derive(start, 0, pos)
            .ok_or_else(|| Error::grammar(format!("No finite derivation of {start}")))
    }
}

impl std::fmt::Debug for EarleyParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EarleyParser")
            .field("rules", &self.grammar.rules.len())
            .field("config", &self.config)
            .finish()
    }
}
