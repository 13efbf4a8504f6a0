use crate::error::{ParseError, Result};
use crate::grammar::LexerConf;
use crate::lexer::{BasicLexer, Lexer, LexerState, Token};
use crate::{HashMap, HashSet};
use compact_str::CompactString;
use std::sync::Arc;

/// A lexer that only considers the terminals the parser can accept next.
///
/// One [`BasicLexer`] is built per distinct accept set; parser states with
/// equal sets share it. When the state's lexer cannot match but the full
/// lexer can, the failure is reported as an unexpected token of the full
/// lexer's choice, with the state's accept set as the expectation.
#[derive(Debug, Clone)]
pub struct ContextualLexer {
    lexers: HashMap<usize, Arc<BasicLexer>>,
    expected: HashMap<usize, Vec<String>>,
    root: BasicLexer,
}

impl ContextualLexer {
    /// `states` maps each parser state to the terminals it accepts.
    /// `always_accept` names terminals every state must lex regardless.
    pub fn new(
        conf: &LexerConf,
        states: &HashMap<usize, HashSet<CompactString>>,
        always_accept: &[CompactString],
    ) -> Result<Self> {
        let text_terminals: HashSet<&str> = conf
            .terminals
            .iter()
            .filter(|t| t.pattern.is_text())
            .map(|t| t.name.as_str())
            .collect();
        let state_conf = LexerConf {
            skip_validation: true,
            ..conf.clone()
        };

        let mut cache: HashMap<Vec<CompactString>, Arc<BasicLexer>> = HashMap::default();
        let mut lexers = HashMap::default();
        let mut expected = HashMap::default();
        for (&state, accepts) in states {
            let mut key: Vec<CompactString> = accepts
                .iter()
                .filter(|name| text_terminals.contains(name.as_str()))
                .chain(conf.ignore.iter())
                .chain(always_accept.iter())
                .cloned()
                .collect();
            key.sort();
            key.dedup();

            let lexer = match cache.get(&key) {
                Some(lexer) => Arc::clone(lexer),
                None => {
                    let allowed: HashSet<CompactString> = key.iter().cloned().collect();
                    let lexer = Arc::new(BasicLexer::restricted(&state_conf, Some(&allowed))?);
                    cache.insert(key, Arc::clone(&lexer));
                    lexer
                }
            };
            lexers.insert(state, lexer);

            let mut names: Vec<String> = accepts.iter().map(ToString::to_string).collect();
            names.sort();
            expected.insert(state, names);
        }
        log::debug!(
            "contextual lexer: {} parser states share {} lexers",
            states.len(),
            cache.len()
        );

        Ok(Self {
            lexers,
            expected,
            root: BasicLexer::new(conf)?,
        })
    }
}

impl Lexer for ContextualLexer {
    fn next_token(&self, state: &mut LexerState<'_>, parser_state: Option<usize>) -> Result<Option<Token>> {
        let Some(lexer) = parser_state.and_then(|ps| self.lexers.get(&ps)) else {
            return self.root.next_token(state, None);
        };
        match lexer.next_token(state, parser_state) {
            Err(err) if matches!(err.as_parse_error(), Some(ParseError::UnexpectedCharacters { .. })) => {
                let rest = state.remaining();
                match self.root.match_prefix(rest) {
                    Some((name, len)) if !self.root.is_ignored(&name) => {
                        let mut counter = state.line_ctr;
                        let span = counter.span_of(&rest[..len]);
                        let token = Token::new(name, &rest[..len]).with_span(Some(span));
                        let expected = parser_state
                            .and_then(|ps| self.expected.get(&ps))
                            .cloned()
                            .unwrap_or_default();
                        Err(ParseError::unexpected_token(token, expected).into())
                    }
                    _ => Err(err),
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::grammar::{Pattern, TerminalDef};
    use crate::lexer::TextSlice;

    fn conf() -> LexerConf {
        LexerConf::new(
            vec![
                TerminalDef::new("NAME", Pattern::regex("[a-z]+")),
                TerminalDef::new("LET", Pattern::string("let")),
                TerminalDef::new("EQ", Pattern::string("=")),
                TerminalDef::new("WS", Pattern::regex(" +")),
            ],
            vec!["WS".into()],
        )
    }

    fn states() -> HashMap<usize, HashSet<CompactString>> {
        let mut states = HashMap::default();
        states.insert(0, ["LET".into()].into_iter().collect());
        states.insert(1, ["NAME".into()].into_iter().collect());
        states.insert(2, ["EQ".into()].into_iter().collect());
        states
    }

    #[test]
    fn test_keyword_is_identifier_where_only_names_are_expected() {
        let lexer = ContextualLexer::new(&conf(), &states(), &[]).expect("valid lexer");
        let mut state = LexerState::new(TextSlice::whole("let let"));
        let first = lexer.next_token(&mut state, Some(0)).expect("lexes").expect("token");
        assert_eq!(first.kind, "LET");
        let second = lexer.next_token(&mut state, Some(1)).expect("lexes").expect("token");
        assert_eq!(second.kind, "NAME");
    }

    #[test]
    fn test_failure_reports_unexpected_token() {
        let lexer = ContextualLexer::new(&conf(), &states(), &[]).expect("valid lexer");
        let mut state = LexerState::new(TextSlice::whole("x"));
        let err = lexer.next_token(&mut state, Some(2)).unwrap_err();
        match err {
            Error::Parse(ParseError::UnexpectedToken { token, expected, .. }) => {
                assert_eq!(token.kind, "NAME");
                assert_eq!(expected, ["EQ".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
