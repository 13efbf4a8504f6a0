//! # LALR(1) Backend
//!
//! Table-driven shift-reduce parsing.
//!
//! ## Overview
//!
//! [`ParseTable::build`] computes the action and goto tables once per
//! grammar. [`LalrParser`] then drives any [`TokenSource`], asking it for
//! the next token with the current state so that a contextual lexer can
//! narrow its terminal set. [`InteractiveParser`] exposes the same driver
//! one token at a time.

mod interactive;
mod parser;
mod table;

pub use interactive::InteractiveParser;
pub use parser::{ErrorHandler, ParserState};
pub use table::{Action, ParseTable};

use crate::error::{Error, Result};
use crate::grammar::{Callback, ParserConf};
use crate::lexer::{LexerThread, TokenSource};
use crate::syntax::{Child, Tree};
use crate::HashMap;
use compact_str::CompactString;

/// LALR(1) parser over a fixed set of rules.
pub struct LalrParser {
    table: ParseTable,
    /// One entry per table rule; `None` builds a plain tree
    callbacks: Vec<Option<Callback>>,
}

impl LalrParser {
    pub fn new(conf: &ParserConf, strict: bool, debug: bool) -> Result<Self> {
        let table = ParseTable::build(&conf.rules, &conf.start, strict, debug)?;
        let callbacks = table.rules.iter().map(|rule| conf.callbacks.get(rule).cloned()).collect();
        log::debug!(
            "built LALR table: {} states for {} rules",
            table.num_states(),
            conf.rules.len()
        );
        Ok(Self { table, callbacks })
    }

    #[must_use]
    pub const fn table(&self) -> &ParseTable {
        &self.table
    }

    /// Terminals accepted by each state, keyed by state id.
    #[must_use]
    pub fn accepted_terminals(&self) -> HashMap<usize, crate::HashSet<CompactString>> {
        self.table.accepted_terminals()
    }

    pub(crate) fn reduce(&self, rule: usize, children: Vec<Child>) -> Child {
        match self.callbacks.get(rule).and_then(Option::as_ref) {
            Some(callback) => callback(children),
            None => {
                let label = self.table.rules.get(rule).map_or_else(CompactString::default, |r| r.label().clone());
                Child::Tree(Tree::new(label, children))
            }
        }
    }

    fn start_state(&self, start: &str) -> Result<usize> {
        self.table
            .start_state(start)
            .ok_or_else(|| Error::configuration(format!("Unknown start rule {start}")))
    }

    /// Parse every token of `source`, starting from `start`.
    pub fn parse(
        &self,
        source: &mut dyn TokenSource,
        start: &str,
        on_error: Option<&mut ErrorHandler<'_>>,
    ) -> Result<Child> {
        let state = ParserState::new(self, self.start_state(start)?);
        parser::parse(state, source, on_error)
    }

    /// Begin a stepwise parse. Without a lexer, tokens must be fed by hand.
    pub fn parse_interactive<'p>(
        &'p self,
        lexer: Option<LexerThread<'p>>,
        start: &str,
    ) -> Result<InteractiveParser<'p>> {
        let state = ParserState::new(self, self.start_state(start)?);
        Ok(InteractiveParser::new(state, lexer))
    }
}

impl std::fmt::Debug for LalrParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LalrParser")
            .field("states", &self.table.num_states())
            .field("rules", &self.table.rules.len())
            .finish()
    }
}
