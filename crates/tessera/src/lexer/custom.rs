//! User-supplied lexers.
//!
//! A custom lexer declares how much of the lexing protocol it understands:
//!
//! | level | [`Capability`] | contract                                                  |
//! |-------|----------------|-----------------------------------------------------------|
//! | 0     | `Text`         | tokenizes a whole text at once ([`TextLexer`])            |
//! | 1     | `Stateful`     | pulls tokens from a [`LexerState`], whole texts only      |
//! | 2     | `Native`       | pulls tokens from a [`LexerState`] over any [`TextSlice`] |
//!
//! Levels 0 and 1 are wrapped so that a partial slice is rejected instead of
//! being silently lexed from the wrong offset.
//!
//! [`TextSlice`]: crate::lexer::TextSlice

use crate::error::{Error, Result};
use crate::lexer::{Lexer, LexerState, Token};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// How much of the lexing protocol a custom lexer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Text = 0,
    Stateful = 1,
    Native = 2,
}

impl TryFrom<u8> for Capability {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            0 => Ok(Self::Text),
            1 => Ok(Self::Stateful),
            2 => Ok(Self::Native),
            other => Err(Error::configuration(format!(
                "Unknown custom lexer capability level {other} (expected 0, 1 or 2)"
            ))),
        }
    }
}

/// A lexer that tokenizes a complete text in one call.
pub trait TextLexer: Send + Sync {
    fn lex(&self, text: &str) -> Result<Vec<Token>>;
}

/// A user lexer wrapped according to its capability.
#[derive(Clone)]
pub enum CustomLexer {
    Text(Arc<dyn TextLexer>),
    Stateful(Arc<dyn Lexer>),
    Native(Arc<dyn Lexer>),
}

impl CustomLexer {
    /// Wrap a pull-based lexer declared at `level` (1 or 2).
    pub fn from_level(level: u8, lexer: Arc<dyn Lexer>) -> Result<Self> {
        match Capability::try_from(level)? {
            Capability::Text => Err(Error::configuration(
                "Level 0 custom lexers tokenize whole texts; wrap them with CustomLexer::Text",
            )),
            Capability::Stateful => Ok(Self::Stateful(lexer)),
            Capability::Native => Ok(Self::Native(lexer)),
        }
    }

    #[must_use]
    pub const fn capability(&self) -> Capability {
        match self {
            Self::Text(_) => Capability::Text,
            Self::Stateful(_) => Capability::Stateful,
            Self::Native(_) => Capability::Native,
        }
    }

    fn check_complete(&self, state: &LexerState<'_>) -> Result<()> {
        if state.slice().is_complete_text() {
            Ok(())
        } else {
            Err(Error::usage(format!(
                "Custom lexers of capability level {} cannot lex a partial text slice",
                self.capability() as u8
            )))
        }
    }
}

impl Lexer for CustomLexer {
    fn next_token(&self, state: &mut LexerState<'_>, parser_state: Option<usize>) -> Result<Option<Token>> {
        match self {
            Self::Text(lexer) => {
                if state.pending.is_none() {
                    self.check_complete(state)?;
                    state.pending = Some(VecDeque::from(lexer.lex(state.slice().text())?));
                }
                let token = state.pending.as_mut().and_then(VecDeque::pop_front);
                state.last_token.clone_from(&token);
                Ok(token)
            }
            Self::Stateful(lexer) => {
                self.check_complete(state)?;
                lexer.next_token(state, parser_state)
            }
            Self::Native(lexer) => lexer.next_token(state, parser_state),
        }
    }
}

impl fmt::Debug for CustomLexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomLexer({:?})", self.capability())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TextSlice;

    struct Words;

    impl TextLexer for Words {
        fn lex(&self, text: &str) -> Result<Vec<Token>> {
            Ok(text.split_whitespace().map(|w| Token::new("WORD", w)).collect())
        }
    }

    struct Chars;

    impl Lexer for Chars {
        fn next_token(&self, state: &mut LexerState<'_>, _: Option<usize>) -> Result<Option<Token>> {
            let Some(c) = state.remaining().chars().next() else {
                return Ok(None);
            };
            let text = c.to_string();
            let span = state.line_ctr.span_of(&text);
            Ok(Some(Token::new("CHAR", text).with_span(Some(span))))
        }
    }

    #[test]
    fn test_capability_levels() {
        assert_eq!(Capability::try_from(2).ok(), Some(Capability::Native));
        assert!(matches!(Capability::try_from(3), Err(Error::Configuration(_))));
        assert!(CustomLexer::from_level(0, Arc::new(Chars)).is_err());
    }

    #[test]
    fn test_text_lexer_buffers_tokens() {
        let lexer = CustomLexer::Text(Arc::new(Words));
        let mut state = LexerState::new(TextSlice::whole("a b"));
        let first = lexer.next_token(&mut state, None).expect("lexes");
        assert_eq!(first.and_then(|t| t.text().map(str::to_string)).as_deref(), Some("a"));
        assert!(lexer.next_token(&mut state, None).expect("lexes").is_some());
        assert!(lexer.next_token(&mut state, None).expect("lexes").is_none());
    }

    #[test]
    fn test_partial_slice_rejected_below_native() {
        let slice = TextSlice::new("abc", 1, 3).expect("valid slice");
        for lexer in [
            CustomLexer::Text(Arc::new(Words)),
            CustomLexer::Stateful(Arc::new(Chars)),
        ] {
            let mut state = LexerState::new(slice);
            assert!(matches!(lexer.next_token(&mut state, None), Err(Error::Usage(_))));
        }

        let native = CustomLexer::Native(Arc::new(Chars));
        let mut state = LexerState::new(slice);
        let token = native.next_token(&mut state, None).expect("lexes").expect("token");
        assert_eq!(token.text(), Some("b"));
    }
}
