//! # Tessera
//!
//! Grammar-driven parsing with interchangeable algorithms, pluggable lexers,
//! and template splicing of previously parsed trees and host values.
//!
//! ## Overview
//!
//! Tessera binds a lexer to one of three parser backends behind a single
//! [`Frontend`]:
//!
//! - **LALR(1)**: deterministic, with contextual lexing, interactive parsing
//!   and error recovery
//! - **Earley**: any context-free grammar, with scannerless (dynamic) lexing
//!   and ambiguity resolution
//! - **CYK**: bottom-up parsing over the grammar's Chomsky normal form
//!
//! The template frontend parses a [`Template`]: literal text interleaved with
//! interpolated values. An interpolated [`Tree`] is spliced in wherever its
//! label is grammatical, and any other value fills a `PLACEHOLDER` terminal,
//! optionally checked against a registered host type.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tessera::{Algorithm, FrontendOptions, GrammarBuilder, LexerKind, Template};
//!
//! let grammar = GrammarBuilder::new()
//!     .regex("NAME", "[a-z]+")
//!     .regex("WS", " +")
//!     .ignore("WS")
//!     .rule("start", ["\"set\"", "NAME", "\"=\"", "value"])
//!     .rule("value", ["NAME"])
//!     .rule("value", ["PLACEHOLDER"])
//!     .build()
//!     .expect("valid grammar");
//!
//! // Plain text
//! let parser = grammar
//!     .frontend(Algorithm::Lalr, LexerKind::Contextual, FrontendOptions::default())
//!     .expect("LALR grammar");
//! let tree = parser.parse("set x = y", None, None).expect("parses");
//! println!("{tree}");
//!
//! // A template with an interpolated host value
//! let templates = grammar
//!     .frontend(Algorithm::Earley, LexerKind::Template, FrontendOptions::default())
//!     .expect("template frontend");
//! let template = Template::builder().text("set x = ").value(42_i64).build();
//! let tree = templates.parse(&template, None, None).expect("parses");
//! println!("{tree}");
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] - Symbols, rules, terminals, grammar construction and augmentation
//! - [`lexer`] - Tokens and lexers
//! - [`backend`] - LALR, Earley and CYK parsers
//! - [`frontend`] - Lexer/backend wiring and the parse entry points
//! - [`template`] - Template values, tokenization and splicing
//! - [`syntax`] - Parse trees, positions and tree building
//! - [`error`] - Error types

pub mod backend;
pub mod error;
pub mod frontend;
pub mod grammar;
pub mod lexer;
pub mod syntax;
pub mod template;

pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;
pub(crate) type HashSet<T> = hashbrown::HashSet<T, ahash::RandomState>;

// Re-export commonly used types
pub use backend::Algorithm;
pub use backend::lalr::InteractiveParser;
pub use error::{Error, ParseError, Result};
pub use frontend::{construct_frontend, Ambiguity, Frontend, FrontendOptions, LexerKind, ParseInput};
pub use grammar::{Grammar, GrammarBuilder, LexerConf, ParserConf, Rule, RuleOptions, Symbol, TerminalDef};
pub use lexer::{HostType, HostValue, Span, TextSlice, Token, TokenValue};
pub use syntax::{Child, Tree};
pub use template::{InterpolatedValue, Interpolation, SourceInfo, Template, TemplateFrontend};
