//! Template tokenization.
//!
//! Literal segments are lexed with a basic lexer; interpolations become one
//! token each. With source info, segments are lexed in place inside the
//! source text so that their tokens carry absolute positions.

use crate::error::{Error, Result};
use crate::grammar::PLACEHOLDER;
use crate::lexer::{BasicLexer, HostType, Lexer, LexerState, TextSlice, Token, TokenSource};
use crate::syntax::offset_to_span;
use crate::template::{InterpolatedValue, Template};
use crate::HashMap;
use compact_str::CompactString;

/// Literal segment being lexed.
struct Segment<'a> {
    state: LexerState<'a>,
    /// Whether the segment is lexed inside the source text
    positioned: bool,
}

/// Pull-based, single-use token stream over a [`Template`].
///
/// Parts are visited in template order. Once exhausted the stream stays
/// exhausted; tokenize the template again to start over.
pub struct TemplateTokens<'a> {
    template: &'a Template,
    lexer: &'a BasicLexer,
    tree_terminals: &'a HashMap<CompactString, CompactString>,
    /// Typed placeholder terminals and their host types, in key order
    typed: &'a [(CompactString, HostType)],
    /// Next part: even for segments, odd for interpolations
    part: usize,
    segment: Option<Segment<'a>>,
}

impl<'a> TemplateTokens<'a> {
    pub(crate) fn new(
        template: &'a Template,
        lexer: &'a BasicLexer,
        tree_terminals: &'a HashMap<CompactString, CompactString>,
        typed: &'a [(CompactString, HostType)],
    ) -> Self {
        Self {
            template,
            lexer,
            tree_terminals,
            typed,
            part: 0,
            segment: None,
        }
    }

    fn open_segment(&self, index: usize) -> Result<Option<Segment<'a>>> {
        let Some(literal) = self.template.strings().get(index) else {
            return Ok(None);
        };
        if literal.is_empty() {
            return Ok(None);
        }
        let in_place = self.template.source_info().and_then(|info| {
            let (start, end) = info.segment_span(index)?;
            (info.text.get(start..end) == Some(literal.as_str())).then_some((info.text.as_str(), start, end))
        });
        let segment = match in_place {
            Some((text, start, end)) => Segment {
                state: LexerState::new(TextSlice::new(text, start, end)?),
                positioned: true,
            },
            None => Segment {
                state: LexerState::new(TextSlice::whole(literal)),
                positioned: false,
            },
        };
        Ok(Some(segment))
    }

    fn interpolation_token(&self, index: usize) -> Result<Option<Token>> {
        let Some(interpolation) = self.template.interpolations().get(index) else {
            return Ok(None);
        };
        let span = self.template.source_info().and_then(|info| {
            info.interpolation_span(index)
                .map(|(start, end)| offset_to_span(&info.text, start, end))
        });
        let token = match interpolation.value() {
            InterpolatedValue::Tree(tree) => {
                let terminal = self.tree_terminals.get(&tree.data).ok_or_else(|| Error::Splice {
                    label: tree.data.to_string(),
                })?;
                Token::tree(terminal.clone(), tree.clone()).with_span(span.or(tree.meta))
            }
            InterpolatedValue::Host(value) => {
                let kind = self
                    .typed
                    .iter()
                    .find(|(_, host_type)| host_type.matches(value))
                    .map_or_else(|| CompactString::const_new(PLACEHOLDER), |(name, _)| name.clone());
                Token::host(kind, value.clone()).with_span(span)
            }
        };
        Ok(Some(token))
    }
}

impl TokenSource for TemplateTokens<'_> {
    fn next_token(&mut self, _parser_state: Option<usize>) -> Result<Option<Token>> {
        loop {
            if let Some(segment) = &mut self.segment {
                match self.lexer.next_token(&mut segment.state, None)? {
                    Some(token) if segment.positioned => return Ok(Some(token)),
                    Some(token) => return Ok(Some(token.with_span(None))),
                    None => self.segment = None,
                }
            }

            let part = self.part;
            if part >= self.template.strings().len() * 2 - 1 {
                return Ok(None);
            }
            self.part += 1;
            if part % 2 == 0 {
                self.segment = self.open_segment(part / 2)?;
            } else if let Some(token) = self.interpolation_token(part / 2)? {
                log::trace!("interpolation {} -> {}", part / 2, token.kind);
                return Ok(Some(token));
            }
        }
    }
}

impl std::fmt::Debug for TemplateTokens<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateTokens")
            .field("part", &self.part)
            .field("in_segment", &self.segment.is_some())
            .finish_non_exhaustive()
    }
}
