//! # Frontend Module
//!
//! Wires a lexer to a parser backend and exposes the parse entry points.
//!
//! ## Overview
//!
//! [`construct_frontend`] validates the pairing of an [`Algorithm`] with a
//! [`LexerKind`] and builds one of three frontends:
//!
//! - [`ParsingFrontend`]: a lexer feeding the LALR or Earley backend, or the
//!   Earley backend lexing dynamically on its own
//! - [`CykFrontend`]: eager tokenization followed by CYK
//! - [`TemplateFrontend`]: Earley over tokenized templates, with splicing
//!
//! | algorithm | lexers                                                   |
//! |-----------|----------------------------------------------------------|
//! | LALR      | basic, contextual, custom                                |
//! | Earley    | basic, dynamic, dynamic_complete, custom, template       |
//! | CYK       | basic, custom                                            |

mod cyk;
mod parsing;

pub use crate::backend::earley::Ambiguity;
pub use cyk::CykFrontend;
pub use parsing::ParsingFrontend;

use crate::backend::lalr::{ErrorHandler, InteractiveParser};
use crate::backend::Algorithm;
use crate::error::{Error, Result};
use crate::grammar::{Callback, LexerConf, ParserConf};
use crate::lexer::{CustomLexer, HostType, TextSlice};
use crate::syntax::Child;
use crate::template::{Template, TemplateFrontend};
use crate::HashMap;
use compact_str::CompactString;
use std::collections::BTreeMap;
use std::fmt;

/// Lexer selector.
#[derive(Debug, Clone)]
pub enum LexerKind {
    /// Every text terminal, no parser feedback
    Basic,
    /// Terminals restricted per LALR state
    Contextual,
    /// Scannerless Earley, longest match per terminal
    Dynamic,
    /// Scannerless Earley trying every match length
    DynamicComplete,
    Custom(CustomLexer),
    /// Template tokenization with splicing
    Template,
}

impl fmt::Display for LexerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Basic => "basic",
            Self::Contextual => "contextual",
            Self::Dynamic => "dynamic",
            Self::DynamicComplete => "dynamic_complete",
            Self::Custom(_) => "custom",
            Self::Template => "template",
        })
    }
}

/// Options shared by every frontend.
#[derive(Clone, Default)]
pub struct FrontendOptions {
    /// Host type registered for each typed placeholder key
    pub placeholder_types: BTreeMap<String, HostType>,
    pub ambiguity: Ambiguity,
    /// Treat LALR shift/reduce conflicts as grammar errors
    pub strict: bool,
    /// Log every resolved LALR conflict
    pub debug: bool,
    /// Record the covered span on every tree
    pub propagate_positions: bool,
    /// Keep filtered tokens in trees
    pub keep_all_tokens: bool,
    /// User callbacks by rule label, replacing default tree construction
    pub callbacks: HashMap<CompactString, Callback>,
}

impl FrontendOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the host type accepted by `PLACEHOLDER[key]`.
    #[must_use]
    pub fn with_placeholder_type(mut self, key: impl Into<String>, host_type: HostType) -> Self {
        self.placeholder_types.insert(key.into(), host_type);
        self
    }

    #[must_use]
    pub fn with_ambiguity(mut self, ambiguity: Ambiguity) -> Self {
        self.ambiguity = ambiguity;
        self
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_propagate_positions(mut self, enabled: bool) -> Self {
        self.propagate_positions = enabled;
        self
    }

    #[must_use]
    pub fn with_keep_all_tokens(mut self, enabled: bool) -> Self {
        self.keep_all_tokens = enabled;
        self
    }

    #[must_use]
    pub fn with_callback(mut self, label: impl Into<CompactString>, callback: Callback) -> Self {
        self.callbacks.insert(label.into(), callback);
        self
    }
}

impl fmt::Debug for FrontendOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontendOptions")
            .field("placeholder_types", &self.placeholder_types)
            .field("ambiguity", &self.ambiguity)
            .field("strict", &self.strict)
            .field("debug", &self.debug)
            .field("propagate_positions", &self.propagate_positions)
            .field("keep_all_tokens", &self.keep_all_tokens)
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// What a frontend can parse.
#[derive(Debug, Clone, Copy)]
pub enum ParseInput<'a> {
    Text(TextSlice<'a>),
    Template(&'a Template),
}

impl<'a> From<&'a str> for ParseInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(TextSlice::whole(text))
    }
}

impl<'a> From<&'a String> for ParseInput<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(TextSlice::whole(text))
    }
}

impl<'a> From<TextSlice<'a>> for ParseInput<'a> {
    fn from(slice: TextSlice<'a>) -> Self {
        Self::Text(slice)
    }
}

impl<'a> From<&'a Template> for ParseInput<'a> {
    fn from(template: &'a Template) -> Self {
        Self::Template(template)
    }
}

/// A constructed frontend.
#[derive(Debug)]
pub enum Frontend {
    Parsing(ParsingFrontend),
    Cyk(CykFrontend),
    Template(TemplateFrontend),
}

impl Frontend {
    /// Parse `input` from `start`, or from the only declared start symbol.
    ///
    /// `on_error` is consulted on every parse failure when the LALR backend
    /// is in use; returning `true` skips the offending input and resumes.
    pub fn parse<'a>(
        &self,
        input: impl Into<ParseInput<'a>>,
        start: Option<&str>,
        on_error: Option<&mut ErrorHandler<'_>>,
    ) -> Result<Child> {
        match (self, input.into()) {
            (Self::Template(frontend), input) => {
                if on_error.is_some() {
                    return Err(Error::configuration(
                        "on_error is only supported by the LALR backend",
                    ));
                }
                frontend.parse(input, start)
            }
            (Self::Parsing(frontend), ParseInput::Text(slice)) => frontend.parse(slice, start, on_error),
            (Self::Cyk(frontend), ParseInput::Text(slice)) => {
                if on_error.is_some() {
                    return Err(Error::configuration(
                        "on_error is only supported by the LALR backend",
                    ));
                }
                frontend.parse(slice, start)
            }
            (_, ParseInput::Template(_)) => Err(Error::configuration(
                "Templates can only be parsed by a frontend built with the template lexer",
            )),
        }
    }

    /// Begin a stepwise parse of `text`; LALR only.
    pub fn parse_interactive<'a>(
        &'a self,
        text: Option<&'a str>,
        start: Option<&str>,
    ) -> Result<InteractiveParser<'a>> {
        match self {
            Self::Parsing(frontend) => frontend.parse_interactive(text, start),
            Self::Cyk(_) | Self::Template(_) => Err(Error::configuration(
                "parse_interactive is only supported by the LALR backend",
            )),
        }
    }

    /// Declared start symbols.
    #[must_use]
    pub fn start_symbols(&self) -> &[CompactString] {
        match self {
            Self::Parsing(frontend) => frontend.start_symbols(),
            Self::Cyk(frontend) => frontend.start_symbols(),
            Self::Template(frontend) => frontend.start_symbols(),
        }
    }
}

/// Build the frontend for `algorithm` driven by `lexer`.
pub fn construct_frontend(
    algorithm: Algorithm,
    lexer: LexerKind,
    lexer_conf: LexerConf,
    parser_conf: ParserConf,
    options: FrontendOptions,
) -> Result<Frontend> {
    log::debug!("constructing {algorithm} frontend with the {lexer} lexer");
    match (algorithm, lexer) {
        (Algorithm::Earley, LexerKind::Template) => {
            TemplateFrontend::new(lexer_conf, parser_conf, &options).map(Frontend::Template)
        }
        (algorithm, LexerKind::Template) => Err(Error::configuration(format!(
            "Template lexing requires the earley algorithm, not {algorithm}"
        ))),
        (Algorithm::Cyk, lexer @ (LexerKind::Basic | LexerKind::Custom(_))) => {
            CykFrontend::new(lexer, lexer_conf, parser_conf).map(Frontend::Cyk)
        }
        (
            Algorithm::Lalr,
            lexer @ (LexerKind::Basic | LexerKind::Contextual | LexerKind::Custom(_)),
        )
        | (
            Algorithm::Earley,
            lexer @ (LexerKind::Basic | LexerKind::Dynamic | LexerKind::DynamicComplete | LexerKind::Custom(_)),
        ) => ParsingFrontend::new(algorithm, lexer, lexer_conf, parser_conf, &options).map(Frontend::Parsing),
        (algorithm, lexer) => Err(Error::configuration(format!(
            "The {lexer} lexer cannot be used with the {algorithm} algorithm"
        ))),
    }
}

/// Resolve the start symbol of a parse.
///
/// With no request the only declared start symbol is used; several declared
/// symbols make the request mandatory.
pub(crate) fn verify_start(declared: &[CompactString], requested: Option<&str>) -> Result<CompactString> {
    match requested {
        None => match declared {
            [only] => Ok(only.clone()),
            [] => Err(Error::configuration("No start symbol declared")),
            _ => Err(Error::configuration(format!(
                "Several start symbols are declared ({}); specify which one to parse",
                declared.join(", ")
            ))),
        },
        Some(name) if declared.iter().any(|s| s == name) => Ok(CompactString::from(name)),
        Some(name) => Err(Error::configuration(format!(
            "Unknown start rule {name}. Must be one of {}",
            declared.join(", ")
        ))),
    }
}
