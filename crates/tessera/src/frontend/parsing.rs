use crate::backend::earley::{DynamicEarleyParser, EarleyConfig, EarleyParser};
use crate::backend::lalr::{ErrorHandler, InteractiveParser, LalrParser};
use crate::backend::{Algorithm, NameMatch};
use crate::error::{Error, Result};
use crate::frontend::{verify_start, FrontendOptions, LexerKind};
use crate::grammar::{LexerConf, ParserConf};
use crate::lexer::{BasicLexer, ContextualLexer, Lexer, LexerThread, PostLex, TextSlice, TokenSource};
use crate::syntax::Child;
use compact_str::CompactString;
use std::fmt;
use std::sync::Arc;

enum Backend {
    Lalr(LalrParser),
    Earley(EarleyParser),
    /// Lexes on its own; no lexer is bound
    Dynamic(DynamicEarleyParser),
}

/// A lexer bound to the LALR or Earley backend.
pub struct ParsingFrontend {
    lexer: Option<Box<dyn Lexer>>,
    postlex: Option<Arc<dyn PostLex>>,
    backend: Backend,
    start: Vec<CompactString>,
}

impl ParsingFrontend {
    /// Build the backend first, since the contextual lexer needs its table.
    pub fn new(
        algorithm: Algorithm,
        lexer: LexerKind,
        lexer_conf: LexerConf,
        parser_conf: ParserConf,
        options: &FrontendOptions,
    ) -> Result<Self> {
        let earley_config = EarleyConfig::new().with_ambiguity(options.ambiguity);
        let backend = match (algorithm, &lexer) {
            (Algorithm::Lalr, _) => Backend::Lalr(LalrParser::new(&parser_conf, options.strict, options.debug)?),
            (Algorithm::Earley, LexerKind::Dynamic | LexerKind::DynamicComplete) => {
                let config = earley_config.with_complete_lex(matches!(lexer, LexerKind::DynamicComplete));
                Backend::Dynamic(DynamicEarleyParser::new(&lexer_conf, &parser_conf, config)?)
            }
            (Algorithm::Earley, _) => {
                Backend::Earley(EarleyParser::new(&parser_conf, Arc::new(NameMatch), earley_config)?)
            }
            (Algorithm::Cyk, _) => {
                return Err(Error::configuration("The CYK algorithm is served by CykFrontend"));
            }
        };

        let bound: Option<Box<dyn Lexer>> = match (lexer, &backend) {
            (LexerKind::Dynamic | LexerKind::DynamicComplete, _) => None,
            (LexerKind::Basic, _) => Some(Box::new(BasicLexer::new(&lexer_conf)?)),
            (LexerKind::Contextual, Backend::Lalr(parser)) => {
                let always_accept = lexer_conf
                    .postlex
                    .as_ref()
                    .map(|postlex| postlex.always_accept())
                    .unwrap_or_default();
                Some(Box::new(ContextualLexer::new(
                    &lexer_conf,
                    &parser.accepted_terminals(),
                    &always_accept,
                )?))
            }
            (LexerKind::Custom(custom), _) => Some(Box::new(custom)),
            (other, _) => {
                return Err(Error::configuration(format!(
                    "The {other} lexer cannot be used with the {algorithm} algorithm"
                )));
            }
        };

        Ok(Self {
            lexer: bound,
            postlex: lexer_conf.postlex.clone(),
            backend,
            start: parser_conf.start,
        })
    }

    #[must_use]
    pub fn start_symbols(&self) -> &[CompactString] {
        &self.start
    }

    fn token_stream<'a>(&'a self, slice: TextSlice<'a>) -> Result<Box<dyn TokenSource + 'a>> {
        let lexer = self
            .lexer
            .as_deref()
            .ok_or_else(|| Error::configuration("No lexer is bound to this frontend"))?;
        let thread: Box<dyn TokenSource + 'a> = Box::new(LexerThread::new(lexer, slice));
        Ok(match &self.postlex {
            Some(postlex) => postlex.process(thread),
            None => thread,
        })
    }

    pub fn parse(
        &self,
        slice: TextSlice<'_>,
        start: Option<&str>,
        on_error: Option<&mut ErrorHandler<'_>>,
    ) -> Result<Child> {
        let start = verify_start(&self.start, start)?;
        if on_error.is_some() && !matches!(self.backend, Backend::Lalr(_)) {
            return Err(Error::configuration("on_error is only supported by the LALR backend"));
        }
        match &self.backend {
            Backend::Lalr(parser) => {
                let mut stream = self.token_stream(slice)?;
                parser.parse(&mut *stream, &start, on_error)
            }
            Backend::Earley(parser) => {
                let mut stream = self.token_stream(slice)?;
                parser.parse(&mut *stream, &start)
            }
            Backend::Dynamic(parser) => {
                if !slice.is_complete_text() {
                    return Err(Error::usage("Dynamic lexers cannot parse a partial text slice"));
                }
                parser.parse(slice.text(), &start)
            }
        }
    }

    /// Stepwise LALR parse; without `text`, tokens are fed by hand. The
    /// post-lexer is not applied to interactive parses.
    pub fn parse_interactive<'a>(
        &'a self,
        text: Option<&'a str>,
        start: Option<&str>,
    ) -> Result<InteractiveParser<'a>> {
        let Backend::Lalr(parser) = &self.backend else {
            return Err(Error::configuration(
                "parse_interactive is only supported by the LALR backend",
            ));
        };
        let start = verify_start(&self.start, start)?;
        let thread = match (text, self.lexer.as_deref()) {
            (Some(text), Some(lexer)) => Some(LexerThread::new(lexer, TextSlice::whole(text))),
            _ => None,
        };
        parser.parse_interactive(thread, &start)
    }
}

impl fmt::Debug for ParsingFrontend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend: &dyn fmt::Debug = match &self.backend {
            Backend::Lalr(parser) => parser,
            Backend::Earley(parser) => parser,
            Backend::Dynamic(parser) => parser,
        };
        f.debug_struct("ParsingFrontend")
            .field("backend", backend)
            .field("lexer", &self.lexer.is_some())
            .field("postlex", &self.postlex.is_some())
            .field("start", &self.start)
            .finish()
    }
}
