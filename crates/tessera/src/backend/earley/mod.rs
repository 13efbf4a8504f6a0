//! # Earley Backend
//!
//! Chart parsing of any context-free grammar, including ambiguous,
//! left-recursive and empty rules.
//!
//! ## Overview
//!
//! Recognition builds one column of items per input position, with the
//! Aycock-Horspool treatment of nullable nonterminals. A derivation is then
//! read back from the chart, applying the rule callbacks children first.
//!
//! - [`EarleyParser`] consumes tokens from a lexer and asks a
//!   [`TermMatch`](crate::backend::TermMatch) predicate which terminals a
//!   token can stand for.
//! - [`DynamicEarleyParser`] matches terminal regexes against the text
//!   itself, letting the grammar decide between overlapping terminals.
//!
//! When a span has several derivations, [`Ambiguity::Resolve`] keeps the one
//! whose rule has the highest priority (then the lowest order), and
//! [`Ambiguity::Explicit`] keeps them all under an `_ambig` node.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tessera::backend::earley::{EarleyConfig, EarleyParser};
//! use tessera::backend::NameMatch;
//! # fn demo(conf: &tessera::ParserConf, tokens: &mut dyn tessera::lexer::TokenSource) -> tessera::Result<()> {
//! let parser = EarleyParser::new(conf, Arc::new(NameMatch), EarleyConfig::default())?;
//! let tree = parser.parse(tokens, "start")?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod chart;
mod config;
mod dynamic;
mod forest;
mod parser;

pub use config::{Ambiguity, EarleyConfig};
pub use dynamic::DynamicEarleyParser;
pub use forest::AMBIG;
pub use parser::EarleyParser;
