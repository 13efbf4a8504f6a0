//! # CYK Backend
//!
//! Dynamic-programming parsing over the Chomsky normal form of a grammar.
//!
//! ## Overview
//!
//! The grammar is converted once ([`CnfGrammar`]); each parse fills a
//! triangular table of the best derivation per nonterminal and span. The
//! winning derivation is reverted to the original rules as a [`RawTree`],
//! which the frontend turns into a [`Tree`](crate::Tree) by running the
//! rule callbacks.
//!
//! Among competing derivations of a span the rule with the highest
//! priority wins, then the one declared first.

mod cnf;
mod parser;

pub use cnf::{CnfGrammar, CnfRule, CnfSymbol, Source};
pub use parser::CykParser;

use crate::lexer::Token;

/// A derivation in terms of the original rules, before callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTree {
    Node { rule: usize, children: Vec<RawTree> },
    Token(Token),
}

impl RawTree {
    /// Index of the rule that built this node.
    #[must_use]
    pub const fn rule(&self) -> Option<usize> {
        match self {
            Self::Node { rule, .. } => Some(*rule),
            Self::Token(_) => None,
        }
    }
}
