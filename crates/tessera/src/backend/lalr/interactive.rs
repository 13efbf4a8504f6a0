use crate::backend::lalr::parser::ParserState;
use crate::backend::lalr::Action;
use crate::error::{Error, ParseError, Result};
use crate::grammar::analysis::END;
use crate::lexer::{LexerThread, Token, TokenSource};
use crate::syntax::Child;
use compact_str::CompactString;
use std::collections::{BTreeMap, BTreeSet};

/// Step-by-step control over an LALR parse.
///
/// Cloning copies the parser stacks and the lexer position, so a clone can
/// be used to try a continuation without disturbing the original.
#[derive(Clone)]
pub struct InteractiveParser<'p> {
    state: ParserState<'p>,
    lexer: Option<LexerThread<'p>>,
}

impl<'p> InteractiveParser<'p> {
    pub(crate) const fn new(state: ParserState<'p>, lexer: Option<LexerThread<'p>>) -> Self {
        Self { state, lexer }
    }

    #[must_use]
    pub const fn state(&self) -> &ParserState<'p> {
        &self.state
    }

    #[must_use]
    pub const fn lexer_thread(&self) -> Option<&LexerThread<'p>> {
        self.lexer.as_ref()
    }

    /// Feed a single token. Feeding `$END` finishes the parse and returns
    /// the result.
    pub fn feed_token(&mut self, token: Token) -> Result<Option<Child>> {
        let is_end = token.kind == END;
        self.state.feed_token(token, is_end)
    }

    /// Feed every remaining token of the bound lexer, returning them.
    pub fn exhaust_lexer(&mut self) -> Result<Vec<Token>> {
        let lexer = self
            .lexer
            .as_mut()
            .ok_or_else(|| Error::usage("This interactive parser was created without input"))?;
        let mut fed = Vec::new();
        while let Some(token) = lexer.next_token(Some(self.state.current()))? {
            self.state.feed_token(token.clone(), false)?;
            fed.push(token);
        }
        Ok(fed)
    }

    /// Feed `$END`, positioned after the last token.
    pub fn feed_eof(&mut self) -> Result<Child> {
        let end = self.state.end_token();
        self.state
            .feed_token(end, true)?
            .ok_or_else(|| ParseError::unexpected_eof(Vec::new()).into())
    }

    /// Run the rest of the input through the parser.
    pub fn resume_parse(mut self) -> Result<Child> {
        self.exhaust_lexer()?;
        self.feed_eof()
    }

    /// Terminals that have an action in the current state, with that action.
    #[must_use]
    pub fn choices(&self) -> BTreeMap<CompactString, Action> {
        let table = self.state.parser().table();
        let current = self.state.current();
        table
            .actions
            .get(current)
            .map(|actions| actions.iter().map(|(name, action)| (name.clone(), *action)).collect())
            .unwrap_or_default()
    }

    /// Terminals that can be fed next without an error.
    ///
    /// A choice can still fail after reductions, so each one is tried on a
    /// copy of the parser stacks.
    #[must_use]
    pub fn accepts(&self) -> BTreeSet<CompactString> {
        self.choices()
            .into_keys()
            .filter(|name| {
                let mut trial = self.state.clone();
                let is_end = name.as_str() == END;
                trial.feed_token(Token::new(name.clone(), ""), is_end).is_ok()
            })
            .collect()
    }
}

impl std::fmt::Debug for InteractiveParser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveParser")
            .field("state", &self.state.current())
            .field("has_lexer", &self.lexer.is_some())
            .finish()
    }
}
