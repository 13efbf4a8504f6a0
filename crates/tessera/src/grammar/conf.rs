//! Configuration bundles handed to lexers and parser backends.

use crate::grammar::{Rule, TerminalDef};
use crate::lexer::{PostLex, Token};
use crate::syntax::Child;
use crate::HashMap;
use compact_str::CompactString;
use std::fmt;
use std::sync::Arc;

/// Builds the value of a rule from the values of its expansion.
///
/// Backends call it with exactly one child per expansion symbol.
pub type Callback = Arc<dyn Fn(Vec<Child>) -> Child + Send + Sync>;

/// Rewrites a token right after it was lexed.
pub type TokenCallback = Arc<dyn Fn(Token) -> Token + Send + Sync>;

/// Everything a lexer needs to know about the grammar.
#[derive(Clone, Default)]
pub struct LexerConf {
    pub terminals: Vec<TerminalDef>,
    /// Terminals matched and then discarded
    pub ignore: Vec<CompactString>,
    pub callbacks: HashMap<CompactString, TokenCallback>,
    pub postlex: Option<Arc<dyn PostLex>>,
    /// Skip zero-width and pattern validation
    pub skip_validation: bool,
    /// Regex flags applied to every text pattern
    pub global_flags: CompactString,
}

impl LexerConf {
    #[must_use]
    pub fn new(terminals: Vec<TerminalDef>, ignore: Vec<CompactString>) -> Self {
        Self {
            terminals,
            ignore,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_postlex(mut self, postlex: Arc<dyn PostLex>) -> Self {
        self.postlex = Some(postlex);
        self
    }

    #[must_use]
    pub fn with_callback(mut self, terminal: impl Into<CompactString>, callback: TokenCallback) -> Self {
        self.callbacks.insert(terminal.into(), callback);
        self
    }

    #[must_use]
    pub fn with_skip_validation(mut self, skip: bool) -> Self {
        self.skip_validation = skip;
        self
    }

    #[must_use]
    pub fn with_global_flags(mut self, flags: impl Into<CompactString>) -> Self {
        self.global_flags = flags.into();
        self
    }

    #[must_use]
    pub fn terminals_by_name(&self) -> HashMap<&str, &TerminalDef> {
        self.terminals.iter().map(|t| (t.name.as_str(), t)).collect()
    }
}

impl fmt::Debug for LexerConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexerConf")
            .field("terminals", &self.terminals)
            .field("ignore", &self.ignore)
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .field("postlex", &self.postlex.is_some())
            .field("skip_validation", &self.skip_validation)
            .field("global_flags", &self.global_flags)
            .finish()
    }
}

/// Everything a parser backend needs to know about the grammar.
#[derive(Clone, Default)]
pub struct ParserConf {
    pub rules: Vec<Rule>,
    pub callbacks: HashMap<Rule, Callback>,
    /// Declared start symbols
    pub start: Vec<CompactString>,
    /// Splice rules have already been synthesized into `rules`
    pub augmented: bool,
}

impl ParserConf {
    #[must_use]
    pub fn new(rules: Vec<Rule>, callbacks: HashMap<Rule, Callback>, start: Vec<CompactString>) -> Self {
        Self {
            rules,
            callbacks,
            start,
            augmented: false,
        }
    }
}

impl fmt::Debug for ParserConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserConf")
            .field("rules", &self.rules.len())
            .field("callbacks", &self.callbacks.len())
            .field("start", &self.start)
            .field("augmented", &self.augmented)
            .finish()
    }
}
