use crate::backend::lalr::table::Action;
use crate::backend::lalr::LalrParser;
use crate::error::{Error, ParseError, Result};
use crate::grammar::analysis::END;
use crate::lexer::{Span, Token, TokenSource};
use crate::syntax::Child;

/// Decides whether to recover from a parse failure. Returning `true` skips
/// the offending token (or character) and resumes.
pub type ErrorHandler<'h> = dyn FnMut(&ParseError) -> bool + 'h;

/// Stacks of an in-progress LALR parse.
#[derive(Clone)]
pub struct ParserState<'p> {
    parser: &'p LalrParser,
    state_stack: Vec<usize>,
    value_stack: Vec<Child>,
    last_span: Option<Span>,
}

impl<'p> ParserState<'p> {
    pub(crate) fn new(parser: &'p LalrParser, start_state: usize) -> Self {
        Self {
            parser,
            state_stack: vec![start_state],
            value_stack: Vec::new(),
            last_span: None,
        }
    }

    pub(crate) const fn parser(&self) -> &'p LalrParser {
        self.parser
    }

    /// The state on top of the stack.
    #[must_use]
    pub fn current(&self) -> usize {
        self.state_stack.last().copied().unwrap_or_default()
    }

    /// The `$END` token, positioned after the last fed token.
    #[must_use]
    pub fn end_token(&self) -> Token {
        let span = self.last_span.map(|span| Span {
            start_pos: span.end_pos,
            line: span.end_line,
            column: span.end_column,
            ..span
        });
        Token::new(END, "").with_span(span)
    }

    /// Feed one token, reducing as far as its lookahead allows. Returns the
    /// parse result once `$END` is accepted.
    pub fn feed_token(&mut self, token: Token, is_end: bool) -> Result<Option<Child>> {
        let table = self.parser.table();
        loop {
            let state = self.current();
            let Some(action) = table.action(state, &token.kind) else {
                let expected = table.expected(state);
                let err = if is_end {
                    ParseError::unexpected_eof(expected)
                } else {
                    ParseError::unexpected_token(token, expected)
                };
                return Err(err.into());
            };

            match action {
                Action::Shift(next) => {
                    if token.span.is_some() {
                        self.last_span = token.span;
                    }
                    self.state_stack.push(next);
                    self.value_stack.push(Child::Token(token));
                    return Ok(None);
                }
                Action::Accept => return Ok(self.value_stack.pop()),
                Action::Reduce(index) => {
                    let rule = &table.rules[index];
                    let size = rule.expansion.len();
                    let children = self.value_stack.split_off(self.value_stack.len().saturating_sub(size));
                    self.state_stack.truncate(self.state_stack.len().saturating_sub(size));
                    let value = self.parser.reduce(index, children);

                    let top = self.current();
                    let next = table.goto(top, rule.origin.name()).ok_or_else(|| {
                        Error::grammar(format!("No goto for {} in state {top}", rule.origin))
                    })?;
                    self.state_stack.push(next);
                    self.value_stack.push(value);
                }
            }
        }
    }
}

fn recover(handler: &mut Option<&mut ErrorHandler<'_>>, err: &ParseError) -> bool {
    handler.as_mut().is_some_and(|handler| handler(err))
}

/// Drive a full parse, pulling tokens with the current parser state so that
/// contextual lexers can narrow their terminal sets.
pub(crate) fn parse(
    mut state: ParserState<'_>,
    source: &mut dyn TokenSource,
    mut on_error: Option<&mut ErrorHandler<'_>>,
) -> Result<Child> {
    loop {
        let token = match source.next_token(Some(state.current())) {
            Ok(Some(token)) => token,
            Ok(None) => break,
            Err(Error::Parse(err)) => {
                if !recover(&mut on_error, &err) {
                    return Err(err.into());
                }
                let skipped = match &err {
                    ParseError::UnexpectedToken { token, .. } => match token.span {
                        Some(span) => source.skip_to(span.end_pos),
                        None => source.skip_char(),
                    },
                    ParseError::UnexpectedCharacters { .. } => source.skip_char(),
                    ParseError::UnexpectedEof { .. } => false,
                };
                if !skipped {
                    return Err(err.into());
                }
                log::debug!("recovered from lexing error: {err}");
                continue;
            }
            Err(err) => return Err(err),
        };

        match state.feed_token(token, false) {
            Ok(_) => {}
            Err(Error::Parse(err)) => {
                if !recover(&mut on_error, &err) {
                    return Err(err.into());
                }
                log::debug!("recovered from parse error: {err}");
            }
            Err(err) => return Err(err),
        }
    }

    let end = state.end_token();
    match state.feed_token(end, true)? {
        Some(value) => Ok(value),
        None => Err(ParseError::unexpected_eof(Vec::new()).into()),
    }
}
