use crate::backend::earley::{EarleyConfig, EarleyParser};
use crate::backend::TermMatch;
use crate::error::{Error, ParseError, Result};
use crate::frontend::{verify_start, FrontendOptions, ParseInput};
use crate::grammar::terminal::placeholder_terminal_name;
use crate::grammar::{augment, LexerConf, ParserConf, Pattern};
use crate::lexer::{BasicLexer, HostType, LexerThread, Token, TokenValue};
use crate::syntax::{Child, Tree};
use crate::template::{Template, TemplateTokens};
use crate::HashMap;
use compact_str::CompactString;
use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::sync::Arc;

/// Decides terminal matches from the terminal's [`Pattern`].
///
/// - text terminals match ordinary tokens of the same name
/// - the generic placeholder matches any interpolated host value
/// - a typed placeholder matches values of its registered type, and fails
///   with [`Error::TypeMismatch`] for any other host value
/// - a splice terminal matches the tree tokens produced for its label
#[derive(Debug, Clone)]
pub struct PatternMatch {
    patterns: HashMap<CompactString, Pattern>,
    types: BTreeMap<String, HostType>,
}

impl PatternMatch {
    #[must_use]
    pub fn new(patterns: HashMap<CompactString, Pattern>, types: BTreeMap<String, HostType>) -> Self {
        Self { patterns, types }
    }

    /// How a terminal reads in error messages.
    fn describe(&self, terminal: &str) -> String {
        match self.patterns.get(terminal) {
            Some(Pattern::Tree { label }) => format!("Tree('{label}')"),
            Some(Pattern::Placeholder { type_key: None }) => "interpolated value".to_string(),
            Some(Pattern::Placeholder { type_key: Some(key) }) => match self.types.get(key) {
                Some(host_type) => format!("interpolated <{}>", host_type.short_name()),
                None => format!("interpolated value[{key}]"),
            },
            _ => terminal.to_string(),
        }
    }
}

impl TermMatch for PatternMatch {
    fn matches(&self, terminal: &str, token: &Token) -> Result<bool> {
        match (self.patterns.get(terminal), &token.value) {
            (Some(Pattern::Placeholder { type_key: None }), TokenValue::Host(_)) => Ok(true),
            (Some(Pattern::Placeholder { type_key: Some(key) }), TokenValue::Host(value)) => {
                let expected = self.types.get(key).ok_or_else(|| {
                    Error::configuration(format!("No host type registered for placeholder[{key}]"))
                })?;
                if expected.matches(value) {
                    Ok(true)
                } else {
                    Err(Error::TypeMismatch {
                        key: key.clone(),
                        expected: expected.short_name().to_string(),
                        found: value.short_type_name().to_string(),
                    })
                }
            }
            (Some(Pattern::Tree { .. }), TokenValue::Tree(_)) => Ok(token.kind == terminal),
            (Some(Pattern::Placeholder { .. } | Pattern::Tree { .. }), _) => Ok(false),
            (_, TokenValue::Text(_)) => Ok(token.kind == terminal),
            (_, _) => Ok(false),
        }
    }
}

/// Earley frontend over templates.
///
/// Construction augments the grammar with splice terminals and rules, so
/// any tree whose label the grammar produces can be interpolated where that
/// label is grammatical. After parsing, splice tokens are replaced by the
/// trees they carry.
pub struct TemplateFrontend {
    parser: EarleyParser,
    matcher: Arc<PatternMatch>,
    /// Lexes literal segments; placeholder and splice terminals excluded
    segment_lexer: BasicLexer,
    /// Lexes plain string input
    text_lexer: BasicLexer,
    tree_terminals: HashMap<CompactString, CompactString>,
    typed: Vec<(CompactString, HostType)>,
    start: Vec<CompactString>,
}

impl TemplateFrontend {
    pub fn new(lexer_conf: LexerConf, parser_conf: ParserConf, options: &FrontendOptions) -> Result<Self> {
        let missing: Vec<&str> = lexer_conf
            .terminals
            .iter()
            .filter_map(|terminal| match &terminal.pattern {
                Pattern::Placeholder { type_key: Some(key) } => Some(key.as_str()),
                _ => None,
            })
            .filter(|key| !options.placeholder_types.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(Error::configuration(format!(
                "No host type registered for typed placeholders: {}",
                missing.join(", ")
            )));
        }

        let augmented = augment(&parser_conf.rules, &lexer_conf.terminals);
        let mut callbacks = parser_conf.callbacks;
        callbacks.extend(augmented.splice_callbacks());
        let conf = ParserConf {
            rules: augmented.rules.clone(),
            callbacks,
            start: parser_conf.start,
            augmented: true,
        };

        let patterns: HashMap<CompactString, Pattern> = augmented
            .terminals
            .iter()
            .map(|terminal| (terminal.name.clone(), terminal.pattern.clone()))
            .collect();
        let typed = options
            .placeholder_types
            .iter()
            .map(|(key, host_type)| (placeholder_terminal_name(Some(key)), *host_type))
            .filter(|(name, _)| patterns.contains_key(name))
            .collect();
        let matcher = Arc::new(PatternMatch::new(patterns, options.placeholder_types.clone()));

        let text_conf = LexerConf {
            terminals: augmented.terminals,
            postlex: None,
            ..lexer_conf
        };
        let segment_conf = LexerConf {
            skip_validation: true,
            ..text_conf.clone()
        };
        let config = EarleyConfig::new().with_ambiguity(options.ambiguity);
        let parser = EarleyParser::new(&conf, Arc::clone(&matcher) as Arc<dyn TermMatch>, config)?;
        log::debug!(
            "template frontend: {} splice labels, {} typed placeholders",
            augmented.tree_terminals.len(),
            options.placeholder_types.len()
        );

        Ok(Self {
            parser,
            matcher,
            segment_lexer: BasicLexer::new(&segment_conf)?,
            text_lexer: BasicLexer::new(&text_conf)?,
            tree_terminals: augmented.tree_terminals,
            typed,
            start: conf.start,
        })
    }

    #[must_use]
    pub fn start_symbols(&self) -> &[CompactString] {
        &self.start
    }

    /// Tree label to splice terminal name.
    #[must_use]
    pub const fn tree_terminals(&self) -> &HashMap<CompactString, CompactString> {
        &self.tree_terminals
    }

    /// Token stream of a template, as the parser sees it.
    #[must_use]
    pub fn tokenize<'a>(&'a self, template: &'a Template) -> TemplateTokens<'a> {
        TemplateTokens::new(template, &self.segment_lexer, &self.tree_terminals, &self.typed)
    }

    pub fn parse(&self, input: ParseInput<'_>, start: Option<&str>) -> Result<Child> {
        let start = verify_start(&self.start, start)?;
        match input {
            ParseInput::Text(slice) => {
                let mut thread = LexerThread::new(&self.text_lexer, slice);
                self.parser
                    .parse(&mut thread, &start)
                    .map(Self::splice)
                    .map_err(|err| self.describe_expected(err))
            }
            ParseInput::Template(template) => {
                let mut tokens = self.tokenize(template);
                self.parser
                    .parse(&mut tokens, &start)
                    .map(Self::splice)
                    .map_err(|err| self.enhance(err))
            }
        }
    }

    /// Replace every splice token by the tree it carries.
    ///
    /// Carried trees are not descended into, so splicing a spliced result
    /// changes nothing.
    #[must_use]
    pub fn splice(result: Child) -> Child {
        match result {
            Child::Token(Token {
                value: TokenValue::Tree(tree),
                ..
            }) => Child::Tree(*tree),
            Child::Tree(tree) => Child::Tree(splice_tree(tree)),
            other => other,
        }
    }

    /// Describe interpolated tokens in domain terms instead of their
    /// synthetic terminal names.
    fn enhance(&self, err: Error) -> Error {
        let Error::Parse(mut parse_err) = err else {
            return err;
        };
        let note = parse_err.token().and_then(|token| match &token.value {
            TokenValue::Tree(tree) => Some(format!(
                "Interpolated Tree('{}') is not valid in this context",
                tree.data
            )),
            TokenValue::Host(value) => Some(format!(
                "Interpolated value <{}> is not valid in this context",
                value.short_type_name()
            )),
            TokenValue::Text(_) => None,
        });
        if let Some(note) = note {
            parse_err.set_note(note);
        }
        self.describe_expected(Error::Parse(parse_err))
    }

    /// Rename splice and placeholder terminals in the expected list.
    fn describe_expected(&self, err: Error) -> Error {
        let Error::Parse(mut parse_err) = err else {
            return err;
        };
        if let ParseError::UnexpectedToken { expected, .. } | ParseError::UnexpectedEof { expected } = &mut parse_err {
            let mut described: Vec<String> = expected.iter().map(|name| self.matcher.describe(name)).collect();
            described.sort();
            described.dedup();
            *expected = described;
        }
        Error::Parse(parse_err)
    }
}

/// Splices below the root, walking subtrees with an explicit stack.
fn splice_tree(mut tree: Tree) -> Tree {
    let mut stack = vec![&mut tree];
    while let Some(node) = stack.pop() {
        for child in &mut node.children {
            if let Child::Token(Token {
                value: TokenValue::Tree(inner),
                ..
            }) = child
            {
                let inner = mem::replace(inner.as_mut(), Tree::new("", Vec::new()));
                *child = Child::Tree(inner);
            } else if let Child::Tree(subtree) = child {
                stack.push(subtree);
            }
        }
    }
    tree
}

impl fmt::Debug for TemplateFrontend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateFrontend")
            .field("parser", &self.parser)
            .field("tree_terminals", &self.tree_terminals)
            .field("typed", &self.typed)
            .field("start", &self.start)
            .finish_non_exhaustive()
    }
}
