//! Configuration for the Earley parser

use std::fmt;

/// How the Earley parser reports a span that has several derivations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Ambiguity {
    /// Keep one derivation: highest rule priority, then lowest rule order
    #[default]
    Resolve,
    /// Keep every derivation under an `_ambig` node
    Explicit,
    /// Return the shared packed forest itself; not provided by this backend
    Forest,
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolve => "resolve",
            Self::Explicit => "explicit",
            Self::Forest => "forest",
        })
    }
}

/// Configuration options for the Earley parser
#[derive(Debug, Clone, Default)]
pub struct EarleyConfig {
    /// Ambiguity policy
    pub ambiguity: Ambiguity,

    /// Dynamic lexing only: also try every shorter match of a terminal
    pub complete_lex: bool,
}

impl EarleyConfig {
    /// Create a new configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ambiguity(mut self, ambiguity: Ambiguity) -> Self {
        self.ambiguity = ambiguity;
        self
    }

    /// Enable or disable exhaustive terminal matching in dynamic lexing
    #[must_use]
    pub fn with_complete_lex(mut self, enabled: bool) -> Self {
        self.complete_lex = enabled;
        self
    }
}
