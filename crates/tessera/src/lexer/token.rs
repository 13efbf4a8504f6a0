use crate::syntax::Tree;
use compact_str::CompactString;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Source position of a token or tree.
///
/// Offsets are byte offsets into the parsed text. Lines and columns are
/// 1-based; columns count characters. A span is always complete: code that
/// cannot compute every field leaves the whole span absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start_pos: usize,
    pub line: usize,
    pub column: usize,
    pub end_pos: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        let (start, end) = if self.start_pos <= other.start_pos {
            (self, other)
        } else {
            (other, self)
        };
        let last = if end.end_pos >= start.end_pos { end } else { start };
        Self {
            start_pos: start.start_pos,
            line: start.line,
            column: start.column,
            end_pos: last.end_pos,
            end_line: last.end_line,
            end_column: last.end_column,
        }
    }
}

/// A type-erased value supplied by the host program.
///
/// Host values travel through a parse unchanged; they are cloned by sharing
/// and compare by identity.
#[derive(Clone)]
pub struct HostValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl HostValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
        }
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Runtime type of the wrapped value (not of the shared pointer).
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        Any::type_id(&*self.value)
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path, e.g. `Image` for `app::paint::Image`.
    #[must_use]
    pub fn short_type_name(&self) -> &'static str {
        short_name(self.type_name)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostValue(<{}>)", self.short_type_name())
    }
}

/// Runtime type descriptor used by typed placeholders.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostType {
    id: TypeId,
    name: &'static str,
}

impl HostType {
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[must_use]
    pub fn matches(&self, value: &HostValue) -> bool {
        value.type_id() == self.id
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn short_name(&self) -> &'static str {
        short_name(self.name)
    }
}

impl fmt::Debug for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostType({})", self.name)
    }
}

fn short_name(name: &'static str) -> &'static str {
    // Generic arguments may contain paths of their own
    let head = name.split('<').next().unwrap_or(name);
    match head.rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

/// Payload of a [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// Matched source text
    Text(CompactString),
    /// A previously parsed tree spliced into the input
    Tree(Box<Tree>),
    /// An opaque value interpolated by the host program
    Host(HostValue),
}

/// A token produced by a lexer or a template tokenizer.
///
/// Equality compares `kind` and `value`; positions never participate.
#[derive(Debug, Clone)]
pub struct Token {
    /// Name of the terminal this token was matched as
    pub kind: CompactString,
    pub value: TokenValue,
    pub span: Option<Span>,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

impl Token {
    pub fn new(kind: impl Into<CompactString>, text: impl Into<CompactString>) -> Self {
        Self {
            kind: kind.into(),
            value: TokenValue::Text(text.into()),
            span: None,
        }
    }

    pub fn host(kind: impl Into<CompactString>, value: HostValue) -> Self {
        Self {
            kind: kind.into(),
            value: TokenValue::Host(value),
            span: None,
        }
    }

    pub fn tree(kind: impl Into<CompactString>, tree: Tree) -> Self {
        Self {
            kind: kind.into(),
            value: TokenValue::Tree(Box::new(tree)),
            span: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    /// Same value and position under a different terminal name.
    #[must_use]
    pub fn retyped(&self, kind: impl Into<CompactString>) -> Self {
        Self {
            kind: kind.into(),
            value: self.value.clone(),
            span: self.span,
        }
    }

    /// The matched text, for ordinary tokens.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.value, TokenValue::Host(_))
    }

    #[must_use]
    pub fn is_splice(&self) -> bool {
        matches!(self.value, TokenValue::Tree(_))
    }

    #[must_use]
    pub fn host_value(&self) -> Option<&HostValue> {
        match &self.value {
            TokenValue::Host(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn spliced_tree(&self) -> Option<&Tree> {
        match &self.value {
            TokenValue::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    #[must_use]
    pub fn line(&self) -> Option<usize> {
        self.span.map(|span| span.line)
    }

    #[must_use]
    pub fn column(&self) -> Option<usize> {
        self.span.map(|span| span.column)
    }

    /// Human-readable description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.value {
            TokenValue::Text(text) => format!("{}('{}')", self.kind, text),
            TokenValue::Tree(tree) => format!("Tree('{}')", tree.data),
            TokenValue::Host(value) => {
                format!("interpolated value <{}>", value.short_type_name())
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            TokenValue::Text(text) => f.write_str(text),
            _ => f.write_str(&self.describe()),
        }
    }
}
