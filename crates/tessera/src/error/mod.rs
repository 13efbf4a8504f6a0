//! # Error Types
//!
//! Every fallible operation in the crate returns [`Error`]. The variants follow
//! the failure taxonomy of the frontends:
//!
//! - [`Error::Configuration`]: invalid frontend wiring (start symbols, algorithm
//!   and lexer pairing, missing placeholder type mappings)
//! - [`Error::Grammar`]: grammar and terminal inconsistencies
//! - [`Error::Splice`]: a spliced tree carries a label the grammar never produces
//! - [`Error::TypeMismatch`]: a typed placeholder received a value of the wrong type
//! - [`Error::Usage`]: an API was driven with input it cannot accept
//! - [`Error::Parse`]: the backend could not derive a parse, see [`ParseError`]
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with [`miette`]
//! and carry stable diagnostic codes.

use crate::lexer::Token;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum Error {
    #[error("Configuration error: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tessera::configuration)))]
    Configuration(String),

    #[error("Grammar error: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tessera::grammar)))]
    Grammar(String),

    #[error("Cannot splice Tree('{label}'): grammar does not produce this label")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(tessera::splice),
            help("only trees whose label is a rule name or alias of this grammar can be spliced")
        )
    )]
    Splice { label: String },

    #[error("Expected {expected} for placeholder[{key}], got {found}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tessera::type_mismatch)))]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    #[error("Usage error: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tessera::usage)))]
    Usage(String),

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Parse(#[from] ParseError),
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn grammar(message: impl Into<String>) -> Self {
        Self::Grammar(message.into())
    }

    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// The parse failure carried by this error, if any.
    #[must_use]
    pub const fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// The backend could not derive a parse from its input.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    #[error("{}", unexpected_token_message(token, expected, note.as_deref()))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::unexpected_token)))]
    UnexpectedToken {
        token: Box<Token>,
        expected: Vec<String>,
        /// Domain-level explanation prepended to the message.
        note: Option<String>,
    },

    #[error(
        "No terminal matches '{character}' in the current parser context, at line {line} col {column}{}",
        allowed_suffix(allowed)
    )]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(lexer::unexpected_characters)))]
    UnexpectedCharacters {
        character: char,
        pos: usize,
        line: usize,
        column: usize,
        allowed: Vec<String>,
    },

    #[error("Unexpected end of input. Expected {}", ParseError::format_expected_list(expected))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::unexpected_eof)))]
    UnexpectedEof { expected: Vec<String> },
}

impl ParseError {
    #[must_use]
    pub fn unexpected_token(token: Token, mut expected: Vec<String>) -> Self {
        expected.sort();
        expected.dedup();
        Self::UnexpectedToken {
            token: Box::new(token),
            expected,
            note: None,
        }
    }

    #[must_use]
    pub fn unexpected_eof(mut expected: Vec<String>) -> Self {
        expected.sort();
        expected.dedup();
        Self::UnexpectedEof { expected }
    }

    /// The offending token, for token-level failures.
    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::UnexpectedToken { token, .. } => Some(token),
            _ => None,
        }
    }

    /// 1-based line of the failure, when known.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::UnexpectedToken { token, .. } => token.line(),
            Self::UnexpectedCharacters { line, .. } => Some(*line),
            Self::UnexpectedEof { .. } => None,
        }
    }

    /// 1-based column of the failure, when known.
    #[must_use]
    pub fn column(&self) -> Option<usize> {
        match self {
            Self::UnexpectedToken { token, .. } => token.column(),
            Self::UnexpectedCharacters { column, .. } => Some(*column),
            Self::UnexpectedEof { .. } => None,
        }
    }

    /// Terminal names that would have been accepted at the failure point.
    #[must_use]
    pub fn expected(&self) -> &[String] {
        match self {
            Self::UnexpectedToken { expected, .. } | Self::UnexpectedEof { expected } => expected,
            Self::UnexpectedCharacters { allowed, .. } => allowed,
        }
    }

    /// Attach a domain-level note to an unexpected-token failure.
    pub(crate) fn set_note(&mut self, message: String) {
        if let Self::UnexpectedToken { note, .. } = self {
            *note = Some(message);
        }
    }

    /// Format a list of expected terminals as a human-readable string
    #[must_use]
    pub fn format_expected_list(expected: &[String]) -> String {
        match expected.len() {
            0 => "nothing".to_string(),
            1 => expected[0].clone(),
            2 => format!("{} or {}", expected[0], expected[1]),
            _ => {
                let mut result = expected[..expected.len() - 1].join(", ");
                result.push_str(", or ");
                result.push_str(&expected[expected.len() - 1]);
                result
            }
        }
    }
}

fn unexpected_token_message(token: &Token, expected: &[String], note: Option<&str>) -> String {
    let position = match (token.line(), token.column()) {
        (Some(line), Some(column)) => format!(" at line {line}, column {column}"),
        _ => String::new(),
    };
    let base = format!(
        "Unexpected token {}{position}. Expected {}",
        token.describe(),
        ParseError::format_expected_list(expected)
    );
    match note {
        Some(note) => format!("{note}. {base}"),
        None => base,
    }
}

fn allowed_suffix(allowed: &[String]) -> String {
    if allowed.is_empty() {
        String::new()
    } else {
        format!(". Expected {}", ParseError::format_expected_list(allowed))
    }
}
