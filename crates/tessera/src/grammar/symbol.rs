use compact_str::CompactString;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A grammar symbol.
///
/// Equality, ordering and hashing use the symbol kind and name only;
/// `filter_out` never participates.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Symbol {
    Terminal {
        name: CompactString,
        /// Dropped from the tree unless the rule keeps all tokens
        filter_out: bool,
    },
    NonTerminal {
        name: CompactString,
    },
}

impl Symbol {
    pub fn terminal(name: impl Into<CompactString>) -> Self {
        Self::Terminal {
            name: name.into(),
            filter_out: false,
        }
    }

    pub fn filtered_terminal(name: impl Into<CompactString>) -> Self {
        Self::Terminal {
            name: name.into(),
            filter_out: true,
        }
    }

    pub fn non_terminal(name: impl Into<CompactString>) -> Self {
        Self::NonTerminal { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &CompactString {
        match self {
            Self::Terminal { name, .. } | Self::NonTerminal { name } => name,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }

    #[must_use]
    pub const fn filter_out(&self) -> bool {
        matches!(self, Self::Terminal { filter_out: true, .. })
    }

    fn key(&self) -> (bool, &str) {
        (self.is_terminal(), self.name().as_str())
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
