//! Line and column tracking
//!
//! Lines and columns are 1-based. Columns count characters from the start of
//! the line; positions are byte offsets.

use crate::lexer::Span;
use memchr::{memchr_iter, memrchr};

/// Incremental position tracker fed with consecutive pieces of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCounter {
    pub char_pos: usize,
    pub line: usize,
    pub column: usize,
    pub line_start_pos: usize,
}

impl Default for LineCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCounter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            char_pos: 0,
            line: 1,
            column: 1,
            line_start_pos: 0,
        }
    }

    /// Counter positioned at byte offset `pos` of `text`.
    #[must_use]
    pub fn at(text: &str, pos: usize) -> Self {
        let mut counter = Self::new();
        counter.feed(&text[..pos]);
        counter
    }

    /// Advance past `chunk`, which must directly follow the current position.
    pub fn feed(&mut self, chunk: &str) {
        let bytes = chunk.as_bytes();
        let newlines = memchr_iter(b'\n', bytes).count();
        if newlines > 0 {
            self.line += newlines;
            // memrchr cannot miss here, the count above was non-zero
            let last = memrchr(b'\n', bytes).unwrap_or(0);
            self.line_start_pos = self.char_pos + last + 1;
            self.column = chunk[last + 1..].chars().count() + 1;
        } else {
            self.column += chunk.chars().count();
        }
        self.char_pos += bytes.len();
    }

    /// Span of `chunk` starting at the current position, then advance past it.
    pub fn span_of(&mut self, chunk: &str) -> Span {
        let (start_pos, line, column) = (self.char_pos, self.line, self.column);
        self.feed(chunk);
        Span {
            start_pos,
            line,
            column,
            end_pos: self.char_pos,
            end_line: self.line,
            end_column: self.column,
        }
    }
}

/// Span of `text[start..end]` computed from absolute offsets.
#[must_use]
pub fn offset_to_span(text: &str, start: usize, end: usize) -> Span {
    let mut counter = LineCounter::at(text, start);
    counter.span_of(&text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_span_single_line() {
        let span = offset_to_span("a{123}", 1, 6);
        assert_eq!((span.line, span.column), (1, 2));
        assert_eq!((span.end_line, span.end_column), (1, 7));
        assert_eq!((span.start_pos, span.end_pos), (1, 6));
    }

    #[test]
    fn test_offset_to_span_across_lines() {
        let text = "ab\ncd\nef";
        let span = offset_to_span(text, 4, 7);
        assert_eq!((span.line, span.column), (2, 2));
        assert_eq!((span.end_line, span.end_column), (3, 2));
    }

    #[test]
    fn test_feed_tracks_line_start() {
        let mut counter = LineCounter::new();
        counter.feed("x\n  ");
        assert_eq!(counter.line, 2);
        assert_eq!(counter.column, 3);
        assert_eq!(counter.line_start_pos, 2);
    }
}
