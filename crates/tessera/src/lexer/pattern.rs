//! Compilation of text patterns into anchored regular expressions.

use crate::error::{Error, Result};
use crate::grammar::{Pattern, TerminalDef};
use regex::Regex;

/// A text terminal compiled for matching at a position.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Matches a prefix of the haystack
    prefix: Regex,
    /// Matches the whole haystack
    whole: Regex,
    pub min_width: usize,
    /// `usize::MAX` when unbounded
    pub max_width: usize,
}

impl CompiledPattern {
    /// Compile a terminal's pattern. Placeholder and tree patterns cannot be
    /// matched against text and are rejected.
    pub fn new(terminal: &TerminalDef, global_flags: &str) -> Result<Self> {
        let source = regexp_source(&terminal.pattern, global_flags).ok_or_else(|| {
            Error::grammar(format!(
                "Terminal '{}' ({}) cannot be matched against text",
                terminal.name, terminal.pattern
            ))
        })?;
        let compile = |src: String| {
            Regex::new(&src).map_err(|err| {
                Error::grammar(format!("Cannot compile terminal '{}': {err}", terminal.name))
            })
        };
        let prefix = compile(format!("^(?:{source})"))?;
        let whole = compile(format!("^(?:{source})$"))?;
        let (min_width, max_width) = widths(&source).map_err(|err| {
            Error::grammar(format!("Cannot analyze terminal '{}': {err}", terminal.name))
        })?;
        Ok(Self {
            prefix,
            whole,
            min_width,
            max_width,
        })
    }

    /// Length of the match at the start of `text`, if any.
    #[must_use]
    pub fn match_prefix(&self, text: &str) -> Option<usize> {
        self.prefix.find(text).map(|m| m.end())
    }

    #[must_use]
    pub fn matches_whole(&self, text: &str) -> bool {
        self.whole.is_match(text)
    }
}

/// Regex source of a text pattern with its own and the global flags applied.
#[must_use]
pub fn regexp_source(pattern: &Pattern, global_flags: &str) -> Option<String> {
    let source = pattern.to_regexp()?;
    if global_flags.is_empty() {
        Some(source)
    } else {
        Some(format!("(?{global_flags}:{source})"))
    }
}

/// Minimum and maximum match length in bytes of a regex source.
pub fn widths(source: &str) -> std::result::Result<(usize, usize), regex_syntax::Error> {
    let hir = regex_syntax::Parser::new().parse(source)?;
    let props = hir.properties();
    Ok((
        props.minimum_len().unwrap_or(0),
        props.maximum_len().unwrap_or(usize::MAX),
    ))
}
