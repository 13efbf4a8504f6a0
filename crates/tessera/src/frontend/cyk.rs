use crate::backend::cyk::{CykParser, RawTree};
use crate::error::{Error, Result};
use crate::frontend::{verify_start, LexerKind};
use crate::grammar::{Callback, LexerConf, ParserConf};
use crate::lexer::{BasicLexer, Lexer, LexerThread, PostLex, TextSlice, Token, TokenSource};
use crate::syntax::{Child, Tree};
use compact_str::CompactString;
use std::fmt;
use std::mem;
use std::sync::Arc;

/// Tokenizes the whole input, parses it with CYK, then builds the result
/// leaves first.
pub struct CykFrontend {
    lexer: Box<dyn Lexer>,
    postlex: Option<Arc<dyn PostLex>>,
    parser: CykParser,
    /// One entry per rule of the parser
    callbacks: Vec<Option<Callback>>,
    start: Vec<CompactString>,
}

impl CykFrontend {
    pub fn new(lexer: LexerKind, lexer_conf: LexerConf, parser_conf: ParserConf) -> Result<Self> {
        let bound: Box<dyn Lexer> = match lexer {
            LexerKind::Basic => Box::new(BasicLexer::new(&lexer_conf)?),
            LexerKind::Custom(custom) => Box::new(custom),
            other => {
                return Err(Error::configuration(format!(
                    "The {other} lexer cannot be used with the cyk algorithm"
                )));
            }
        };
        let parser = CykParser::new(&parser_conf.rules)?;
        let callbacks = parser_conf
            .rules
            .iter()
            .map(|rule| parser_conf.callbacks.get(rule).cloned())
            .collect();
        Ok(Self {
            lexer: bound,
            postlex: lexer_conf.postlex,
            parser,
            callbacks,
            start: parser_conf.start,
        })
    }

    #[must_use]
    pub fn start_symbols(&self) -> &[CompactString] {
        &self.start
    }

    pub fn parse(&self, slice: TextSlice<'_>, start: Option<&str>) -> Result<Child> {
        let start = verify_start(&self.start, start)?;
        let tokens = self.tokenize(slice)?;
        log::trace!("cyk: parsing {} tokens as {start}", tokens.len());
        let raw = self.parser.parse(&tokens, &start)?;
        Ok(self.transform(raw))
    }

    fn tokenize(&self, slice: TextSlice<'_>) -> Result<Vec<Token>> {
        let thread: Box<dyn TokenSource + '_> = Box::new(LexerThread::new(self.lexer.as_ref(), slice));
        let mut stream = match &self.postlex {
            Some(postlex) => postlex.process(thread),
            None => thread,
        };
        let mut tokens = Vec::new();
        while let Some(token) = stream.next_token(None)? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Apply callbacks bottom-up, keeping the open ancestors on a stack.
    fn transform(&self, raw: RawTree) -> Child {
        let (rule, children) = match raw {
            RawTree::Token(token) => return Child::Token(token),
            RawTree::Node { rule, children } => (rule, children),
        };
        let mut current = (rule, children.into_iter(), Vec::new());
        let mut ancestors = Vec::new();
        loop {
            match current.1.next() {
                Some(RawTree::Token(token)) => current.2.push(Child::Token(token)),
                Some(RawTree::Node { rule, children }) => {
                    ancestors.push(mem::replace(&mut current, (rule, children.into_iter(), Vec::new())));
                }
                None => {
                    let node = self.apply(current.0, mem::take(&mut current.2));
                    match ancestors.pop() {
                        Some(parent) => {
                            current = parent;
                            current.2.push(node);
                        }
                        None => return node,
                    }
                }
            }
        }
    }

    fn apply(&self, rule: usize, children: Vec<Child>) -> Child {
        match self.callbacks.get(rule).and_then(Option::as_ref) {
            Some(callback) => callback(children),
            None => {
                let label = self
                    .parser
                    .rules()
                    .get(rule)
                    .map_or_else(CompactString::default, |r| r.label().clone());
                Child::Tree(Tree::new(label, children))
            }
        }
    }
}

impl fmt::Debug for CykFrontend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CykFrontend")
            .field("parser", &self.parser)
            .field("postlex", &self.postlex.is_some())
            .field("start", &self.start)
            .finish_non_exhaustive()
    }
}
