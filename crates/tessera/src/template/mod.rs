//! # Template Module
//!
//! Parsing of templates: literal text interleaved with interpolated values.
//!
//! ## Overview
//!
//! A [`Template`] holds `N` literal segments and `N - 1` interpolations,
//! read in the order `segment[0], interpolation[0], segment[1], ...`. An
//! interpolation is either a [`Tree`] from an earlier parse or an opaque
//! [`HostValue`].
//!
//! - [`TemplateTokens`] turns a template into tokens: literal segments are
//!   lexed, trees become splice tokens and host values placeholder tokens.
//! - [`TemplateFrontend`] parses those tokens with the Earley backend and
//!   splices the interpolated trees back into the result.
//!
//! With [`SourceInfo`] the tokens carry positions in the original source
//! text; without it they carry none.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tessera::{Algorithm, FrontendOptions, GrammarBuilder, LexerKind, Template};
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("start", ["\"v\"", "PLACEHOLDER"])
//!     .build()
//!     .expect("valid grammar");
//! let frontend = grammar
//!     .frontend(Algorithm::Earley, LexerKind::Template, FrontendOptions::default())
//!     .expect("template frontend");
//! let template = Template::builder().text("v").value(42_i64).build();
//! let tree = frontend.parse(&template, None, None).expect("parses");
//! ```

mod frontend;
mod tokenizer;

pub use frontend::{PatternMatch, TemplateFrontend};
pub use tokenizer::TemplateTokens;

use crate::error::{Error, Result};
use crate::lexer::HostValue;
use crate::syntax::Tree;
use std::any::Any;

/// The value carried by an interpolation.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolatedValue {
    /// A tree to splice wherever its label is grammatical
    Tree(Tree),
    /// An opaque value filling a placeholder terminal
    Host(HostValue),
}

/// One interpolation slot of a template.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    value: InterpolatedValue,
}

impl Interpolation {
    #[must_use]
    pub const fn new(value: InterpolatedValue) -> Self {
        Self { value }
    }

    #[must_use]
    pub const fn tree(tree: Tree) -> Self {
        Self::new(InterpolatedValue::Tree(tree))
    }

    pub fn host<T: Any + Send + Sync>(value: T) -> Self {
        Self::new(InterpolatedValue::Host(HostValue::new(value)))
    }

    #[must_use]
    pub const fn value(&self) -> &InterpolatedValue {
        &self.value
    }
}

/// Where the parts of a template came from.
///
/// Spans are byte ranges `(start, end)` into `text`, one per segment and one
/// per interpolation; a part without a span gets no position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo {
    pub filename: Option<String>,
    pub text: String,
    pub segment_spans: Vec<Option<(usize, usize)>>,
    pub interpolation_spans: Vec<Option<(usize, usize)>>,
}

impl SourceInfo {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn with_segment_spans(mut self, spans: Vec<Option<(usize, usize)>>) -> Self {
        self.segment_spans = spans;
        self
    }

    #[must_use]
    pub fn with_interpolation_spans(mut self, spans: Vec<Option<(usize, usize)>>) -> Self {
        self.interpolation_spans = spans;
        self
    }

    #[must_use]
    pub fn segment_span(&self, index: usize) -> Option<(usize, usize)> {
        self.segment_spans.get(index).copied().flatten()
    }

    #[must_use]
    pub fn interpolation_span(&self, index: usize) -> Option<(usize, usize)> {
        self.interpolation_spans.get(index).copied().flatten()
    }

    fn validate(&self) -> Result<()> {
        let spans = self.segment_spans.iter().chain(&self.interpolation_spans).flatten();
        for &(start, end) in spans {
            if start > end
                || end > self.text.len()
                || !self.text.is_char_boundary(start)
                || !self.text.is_char_boundary(end)
            {
                return Err(Error::usage(format!(
                    "Source span {start}..{end} does not fit a source text of length {}",
                    self.text.len()
                )));
            }
        }
        Ok(())
    }
}

/// Literal text interleaved with interpolated values.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    strings: Vec<String>,
    interpolations: Vec<Interpolation>,
    source_info: Option<SourceInfo>,
}

impl Template {
    /// A template from its parts; there must be exactly one more literal
    /// segment than interpolations.
    pub fn new(strings: Vec<String>, interpolations: Vec<Interpolation>) -> Result<Self> {
        if strings.len() != interpolations.len() + 1 {
            return Err(Error::usage(format!(
                "A template with {} interpolations needs {} literal segments, got {}",
                interpolations.len(),
                interpolations.len() + 1,
                strings.len()
            )));
        }
        Ok(Self {
            strings,
            interpolations,
            source_info: None,
        })
    }

    /// A template of literal text only.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            strings: vec![text.into()],
            interpolations: Vec::new(),
            source_info: None,
        }
    }

    #[must_use]
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    /// Attach source positions. Spans must lie on character boundaries of
    /// the source text.
    pub fn with_source_info(mut self, info: SourceInfo) -> Result<Self> {
        info.validate()?;
        self.source_info = Some(info);
        Ok(self)
    }

    #[must_use]
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    #[must_use]
    pub fn interpolations(&self) -> &[Interpolation] {
        &self.interpolations
    }

    #[must_use]
    pub const fn source_info(&self) -> Option<&SourceInfo> {
        self.source_info.as_ref()
    }

    /// Concatenate two templates. The last segment of `self` and the first of
    /// `other` merge into one; source positions do not carry over.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut strings = self.strings.clone();
        let mut rest = other.strings.iter();
        if let (Some(last), Some(first)) = (strings.last_mut(), rest.next()) {
            last.push_str(first);
        }
        strings.extend(rest.cloned());
        let mut interpolations = self.interpolations.clone();
        interpolations.extend(other.interpolations.iter().cloned());
        Self {
            strings,
            interpolations,
            source_info: None,
        }
    }
}

/// Builds a [`Template`] part by part.
#[derive(Debug, Clone, Default)]
pub struct TemplateBuilder {
    strings: Vec<String>,
    interpolations: Vec<Interpolation>,
    pending: String,
}

impl TemplateBuilder {
    /// Append literal text; adjacent text merges into one segment.
    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.pending.push_str(text);
        self
    }

    #[must_use]
    pub fn interpolate(mut self, interpolation: Interpolation) -> Self {
        self.strings.push(std::mem::take(&mut self.pending));
        self.interpolations.push(interpolation);
        self
    }

    /// Interpolate an opaque host value.
    #[must_use]
    pub fn value<T: Any + Send + Sync>(self, value: T) -> Self {
        self.interpolate(Interpolation::host(value))
    }

    #[must_use]
    pub fn host(self, value: HostValue) -> Self {
        self.interpolate(Interpolation::new(InterpolatedValue::Host(value)))
    }

    /// Interpolate a tree to splice.
    #[must_use]
    pub fn tree(self, tree: Tree) -> Self {
        self.interpolate(Interpolation::tree(tree))
    }

    #[must_use]
    pub fn build(mut self) -> Template {
        self.strings.push(self.pending);
        Template {
            strings: self.strings,
            interpolations: self.interpolations,
            source_info: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_interleaves_parts() {
        let template = Template::builder()
            .text("a")
            .text("b")
            .value(1_u8)
            .tree(Tree::new("x", vec![]))
            .text("c")
            .build();
        assert_eq!(template.strings(), ["ab", "", "c"]);
        assert_eq!(template.interpolations().len(), 2);
        assert!(matches!(template.interpolations()[1].value(), InterpolatedValue::Tree(_)));
    }

    #[test]
    fn test_new_checks_segment_count() {
        assert!(Template::new(vec!["a".into()], vec![Interpolation::host(1)]).is_err());
        assert!(Template::new(vec!["a".into(), "b".into()], vec![Interpolation::host(1)]).is_ok());
    }

    #[test]
    fn test_join_merges_adjacent_literals() {
        let left = Template::builder().text("x = ").value(1_i32).text(" + ").build();
        let right = Template::builder().text("y").value(2_i32).build();
        let joined = left.join(&right);
        assert_eq!(joined.strings(), ["x = ", " + y", ""]);
        assert_eq!(joined.interpolations().len(), 2);
    }

    #[test]
    fn test_source_spans_are_validated() {
        let info = SourceInfo::new("a{1}").with_segment_spans(vec![Some((0, 1)), Some((4, 9))]);
        assert!(matches!(
            Template::literal("a").with_source_info(info),
            Err(Error::Usage(_))
        ));
    }
}
