//! # Lexer Module
//!
//! Tokenization of source text for the parser backends.
//!
//! ## Overview
//!
//! - [`BasicLexer`]: leftmost-first matching over every text terminal
//! - [`ContextualLexer`]: one basic lexer per LALR parser state, restricted to
//!   the terminals that state accepts
//! - [`CustomLexer`]: user lexers wrapped according to their [`Capability`]
//! - [`PostLex`]: a hook that rewrites the token stream
//!
//! Lexers are immutable and shared; per-parse progress lives in
//! [`LexerState`]. A [`LexerThread`] couples the two into a pull-based
//! [`TokenSource`] that the backends drain.

pub mod basic;
pub mod contextual;
pub mod custom;
pub mod pattern;
pub mod token;

pub use basic::BasicLexer;
pub use contextual::ContextualLexer;
pub use custom::{Capability, CustomLexer, TextLexer};
pub use token::{HostType, HostValue, Span, Token, TokenValue};

use crate::error::{Error, Result};
use crate::syntax::LineCounter;
use compact_str::CompactString;
use std::collections::VecDeque;

/// A window `[start, end)` of a larger text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSlice<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

impl<'a> TextSlice<'a> {
    /// Window over `text[start..end]`; both bounds must fall on character
    /// boundaries.
    pub fn new(text: &'a str, start: usize, end: usize) -> Result<Self> {
        if start > end || end > text.len() || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return Err(Error::usage(format!(
                "Invalid text slice {start}..{end} of a text of length {}",
                text.len()
            )));
        }
        Ok(Self { text, start, end })
    }

    #[must_use]
    pub const fn whole(text: &'a str) -> Self {
        Self {
            text,
            start: 0,
            end: text.len(),
        }
    }

    #[must_use]
    pub const fn is_complete_text(&self) -> bool {
        self.start == 0 && self.end == self.text.len()
    }

    /// The full underlying text.
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    #[must_use]
    pub fn as_str(&self) -> &'a str {
        &self.text[self.start..self.end]
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }
}

impl<'a> From<&'a str> for TextSlice<'a> {
    fn from(text: &'a str) -> Self {
        Self::whole(text)
    }
}

/// Per-parse lexing progress.
#[derive(Debug, Clone)]
pub struct LexerState<'a> {
    slice: TextSlice<'a>,
    pub line_ctr: LineCounter,
    pub last_token: Option<Token>,
    /// Tokens produced ahead of time by whole-text lexers
    pub(crate) pending: Option<VecDeque<Token>>,
}

impl<'a> LexerState<'a> {
    #[must_use]
    pub fn new(slice: TextSlice<'a>) -> Self {
        Self {
            slice,
            line_ctr: LineCounter::at(slice.text, slice.start),
            last_token: None,
            pending: None,
        }
    }

    #[must_use]
    pub const fn slice(&self) -> TextSlice<'a> {
        self.slice
    }

    /// Current byte offset into the full text.
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.line_ctr.char_pos
    }

    /// Unlexed remainder of the slice.
    #[must_use]
    pub fn remaining(&self) -> &'a str {
        let pos = self.pos().min(self.slice.end);
        &self.slice.text[pos..self.slice.end]
    }
}

/// A lexer that produces tokens one at a time.
///
/// `parser_state` is the current LALR state when the parser can supply one;
/// lexers that do not depend on parser context ignore it.
pub trait Lexer: Send + Sync {
    fn next_token(&self, state: &mut LexerState<'_>, parser_state: Option<usize>) -> Result<Option<Token>>;
}

/// A pull-based, single-use stream of tokens.
pub trait TokenSource {
    fn next_token(&mut self, parser_state: Option<usize>) -> Result<Option<Token>>;

    /// Skip the character the last failure pointed at. Sources that cannot
    /// recover return `false`.
    fn skip_char(&mut self) -> bool {
        false
    }

    /// Skip ahead to byte offset `pos`. Sources that cannot recover return
    /// `false`.
    fn skip_to(&mut self, pos: usize) -> bool {
        let _ = pos;
        false
    }
}

/// A lexer coupled with its per-parse state.
#[derive(Clone)]
pub struct LexerThread<'a> {
    lexer: &'a dyn Lexer,
    state: LexerState<'a>,
}

impl<'a> LexerThread<'a> {
    #[must_use]
    pub fn new(lexer: &'a dyn Lexer, slice: TextSlice<'a>) -> Self {
        Self {
            lexer,
            state: LexerState::new(slice),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &LexerState<'a> {
        &self.state
    }
}

impl TokenSource for LexerThread<'_> {
    fn next_token(&mut self, parser_state: Option<usize>) -> Result<Option<Token>> {
        self.lexer.next_token(&mut self.state, parser_state)
    }

    fn skip_char(&mut self) -> bool {
        match self.state.remaining().chars().next() {
            Some(c) => {
                let mut buf = [0_u8; 4];
                self.state.line_ctr.feed(c.encode_utf8(&mut buf));
                true
            }
            None => false,
        }
    }

    fn skip_to(&mut self, pos: usize) -> bool {
        let current = self.state.pos();
        let slice = self.state.slice();
        if pos <= current || pos > slice.end() || !slice.text().is_char_boundary(pos) {
            return false;
        }
        self.state.line_ctr.feed(&slice.text()[current..pos]);
        true
    }
}

/// Rewrites the token stream between the lexer and the parser.
pub trait PostLex: Send + Sync {
    /// Terminals every contextual lexer state must accept, because this hook
    /// consumes them.
    fn always_accept(&self) -> Vec<CompactString> {
        Vec::new()
    }

    fn process<'a>(&'a self, stream: Box<dyn TokenSource + 'a>) -> Box<dyn TokenSource + 'a>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_slice_bounds() {
        let slice = TextSlice::new("hello world", 6, 11).expect("valid slice");
        assert_eq!(slice.as_str(), "world");
        assert!(!slice.is_complete_text());
        assert!(TextSlice::whole("hello").is_complete_text());
        assert!(TextSlice::new("abc", 2, 1).is_err());
        assert!(TextSlice::new("é", 1, 2).is_err());
    }

    #[test]
    fn test_state_starts_at_slice_start() {
        let slice = TextSlice::new("ab\ncd", 3, 5).expect("valid slice");
        let state = LexerState::new(slice);
        assert_eq!(state.pos(), 3);
        assert_eq!(state.line_ctr.line, 2);
        assert_eq!(state.remaining(), "cd");
    }
}
