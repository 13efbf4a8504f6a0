use compact_str::{CompactString, format_compact};
use std::fmt;

/// Name of the generic placeholder terminal.
pub const PLACEHOLDER: &str = "PLACEHOLDER";

/// Prefix of the splice terminals synthesized for tree labels.
pub const TREE_PREFIX: &str = "TREE__";

/// How a terminal recognizes its tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Pattern {
    /// A literal string
    Str { value: String, flags: CompactString },
    /// A regular expression
    Regex { value: String, flags: CompactString },
    /// An interpolated host value, optionally restricted to a registered type
    Placeholder { type_key: Option<String> },
    /// A previously parsed tree with the given label
    Tree { label: String },
}

impl Pattern {
    pub fn string(value: impl Into<String>) -> Self {
        Self::Str {
            value: value.into(),
            flags: CompactString::default(),
        }
    }

    pub fn regex(value: impl Into<String>) -> Self {
        Self::Regex {
            value: value.into(),
            flags: CompactString::default(),
        }
    }

    /// Whether the pattern can be matched against source text.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Str { .. } | Self::Regex { .. })
    }

    #[must_use]
    pub fn flags(&self) -> &str {
        match self {
            Self::Str { flags, .. } | Self::Regex { flags, .. } => flags,
            _ => "",
        }
    }

    /// Regular expression source for text patterns, with flags applied.
    #[must_use]
    pub fn to_regexp(&self) -> Option<String> {
        let (source, flags) = match self {
            Self::Str { value, flags } => (regex::escape(value), flags),
            Self::Regex { value, flags } => (value.clone(), flags),
            _ => return None,
        };
        if flags.is_empty() {
            Some(source)
        } else {
            Some(format!("(?{flags}:{source})"))
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str { value, flags } => write!(f, "{value:?}{flags}"),
            Self::Regex { value, flags } => write!(f, "/{value}/{flags}"),
            Self::Placeholder { type_key: None } => f.write_str(PLACEHOLDER),
            Self::Placeholder { type_key: Some(key) } => write!(f, "{PLACEHOLDER}[{key}]"),
            Self::Tree { label } => write!(f, "Tree('{label}')"),
        }
    }
}

/// A named terminal definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TerminalDef {
    pub name: CompactString,
    pub pattern: Pattern,
    pub priority: i32,
}

impl TerminalDef {
    pub fn new(name: impl Into<CompactString>, pattern: Pattern) -> Self {
        Self {
            name: name.into(),
            pattern,
            priority: 0,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Replace every character outside `[0-9A-Za-z_]` with `_` and upper-case.
#[must_use]
pub fn sanitize_label(label: &str) -> CompactString {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Splice terminal name for a tree label, e.g. `TREE__PAINT` for `paint`.
#[must_use]
pub fn tree_terminal_name(label: &str) -> CompactString {
    format_compact!("{TREE_PREFIX}{}", sanitize_label(label))
}

/// Terminal name of a placeholder, generic when `type_key` is `None`.
#[must_use]
pub fn placeholder_terminal_name(type_key: Option<&str>) -> CompactString {
    match type_key {
        None => CompactString::const_new(PLACEHOLDER),
        Some(key) => format_compact!("{PLACEHOLDER}__{}", sanitize_label(key)),
    }
}
