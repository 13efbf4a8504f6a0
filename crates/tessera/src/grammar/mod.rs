//! # Grammar Module
//!
//! Flat context-free grammars: symbols, rules with options, and terminal
//! definitions.
//!
//! ## Overview
//!
//! - **Data model**: [`Symbol`], [`Rule`], [`RuleOptions`], [`TerminalDef`], [`Pattern`]
//! - **Construction**: [`GrammarBuilder`] produces a validated [`Grammar`]
//! - **Analysis**: nullable, FIRST and FOLLOW sets ([`GrammarAnalysis`])
//! - **Configuration**: [`LexerConf`] and [`ParserConf`] bundles handed to frontends
//! - **Splicing**: [`augment`] synthesizes the terminals and rules that let
//!   parsed trees be substituted into a new parse
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tessera::grammar::GrammarBuilder;
//! use tessera::{Algorithm, FrontendOptions, LexerKind};
//!
//! let grammar = GrammarBuilder::new()
//!     .regex("NUMBER", r"\d+")
//!     .regex("WS", " +")
//!     .ignore("WS")
//!     .rule("start", ["NUMBER", "\"+\"", "NUMBER"])
//!     .build()
//!     .expect("valid grammar");
//!
//! let frontend = grammar
//!     .frontend(Algorithm::Lalr, LexerKind::Contextual, FrontendOptions::default())
//!     .expect("valid frontend");
//! let tree = frontend.parse("1 + 2", None, None).expect("parses");
//! ```

pub mod analysis;
pub mod augment;
pub mod builder;
pub mod conf;
pub mod rule;
pub mod symbol;
pub mod terminal;

pub use analysis::GrammarAnalysis;
pub use augment::{augment, AugmentedGrammar};
pub use builder::{Grammar, GrammarBuilder};
pub use conf::{Callback, LexerConf, ParserConf, TokenCallback};
pub use rule::{Rule, RuleOptions};
pub use symbol::Symbol;
pub use terminal::{Pattern, TerminalDef, PLACEHOLDER, TREE_PREFIX};
