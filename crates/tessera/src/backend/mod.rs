//! # Parser Backends
//!
//! The parsing algorithms a frontend can drive.
//!
//! ## Available Backends
//!
//! - **LALR(1)** ([`lalr`]): table-driven shift-reduce parsing
//!   - Pull-based lexing with the current parser state, for contextual lexers
//!   - Stepwise interactive parsing
//!   - Error recovery through an `on_error` handler
//! - **Earley** ([`earley`]): chart parsing of any context-free grammar
//!   - Pluggable terminal-match predicate
//!   - Dynamic (scannerless) lexing
//!   - Ambiguity resolution by priority, or explicit `_ambig` nodes
//! - **CYK** ([`cyk`]): bottom-up dynamic programming over a grammar in
//!   Chomsky normal form
//!
//! Every backend builds its result by calling the rule callbacks of its
//! [`ParserConf`](crate::grammar::ParserConf), children first.

pub mod cyk;
pub mod earley;
pub mod lalr;

use crate::error::Result;
use crate::lexer::Token;
use std::fmt;

/// Parsing algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Lalr,
    Earley,
    Cyk,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lalr => "lalr",
            Self::Earley => "earley",
            Self::Cyk => "cyk",
        })
    }
}

/// Decides whether a token can stand for a terminal.
///
/// Errors propagate out of the parse instead of counting as a non-match.
pub trait TermMatch: Send + Sync {
    fn matches(&self, terminal: &str, token: &Token) -> Result<bool>;
}

/// Matches tokens by terminal name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatch;

impl TermMatch for NameMatch {
    fn matches(&self, terminal: &str, token: &Token) -> Result<bool> {
        Ok(token.kind == terminal)
    }
}
