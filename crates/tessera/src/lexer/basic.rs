use crate::error::{Error, ParseError, Result};
use crate::grammar::{LexerConf, Pattern, TokenCallback};
use crate::lexer::pattern::CompiledPattern;
use crate::lexer::{Lexer, LexerState, Token};
use crate::{HashMap, HashSet};
use compact_str::CompactString;
use std::cmp::Reverse;

#[derive(Debug, Clone)]
struct ScanTerminal {
    name: CompactString,
    pattern: CompiledPattern,
    /// String terminals this regex terminal matches exactly, re-typed on a
    /// whole match
    unless: Vec<(String, CompactString)>,
}

/// A lexer that tries every text terminal at the current position and takes
/// the first that matches.
///
/// Terminals are tried by descending priority, then descending maximum width,
/// then descending pattern length, then name. String terminals that a regex
/// terminal of the same priority matches in full are folded into that regex
/// terminal: the regex matches, and a token whose text equals the string is
/// re-typed to the string terminal.
#[derive(Clone)]
pub struct BasicLexer {
    terminals: Vec<ScanTerminal>,
    ignore: HashSet<CompactString>,
    callbacks: HashMap<CompactString, TokenCallback>,
}

impl BasicLexer {
    /// Lexer over every text terminal of `conf`.
    pub fn new(conf: &LexerConf) -> Result<Self> {
        Self::restricted(conf, None)
    }

    /// Lexer over the text terminals of `conf` named in `accepts`, or all of
    /// them when `accepts` is `None`.
    pub fn restricted(conf: &LexerConf, accepts: Option<&HashSet<CompactString>>) -> Result<Self> {
        let mut selected: Vec<_> = conf
            .terminals
            .iter()
            .filter(|t| t.pattern.is_text())
            .filter(|t| accepts.map_or(true, |set| set.contains(&t.name)))
            .collect();

        let mut compiled = HashMap::default();
        for terminal in &selected {
            let pattern = CompiledPattern::new(terminal, &conf.global_flags)?;
            if pattern.min_width == 0 && !conf.skip_validation {
                return Err(Error::grammar(format!(
                    "Lexer does not allow zero-width terminals ({}: {})",
                    terminal.name, terminal.pattern
                )));
            }
            compiled.insert(terminal.name.clone(), pattern);
        }

        // Fold exact string matches into regex terminals
        let mut unless: HashMap<CompactString, Vec<(String, CompactString)>> = HashMap::default();
        let mut embedded: HashSet<CompactString> = HashSet::default();
        for re_term in selected.iter().filter(|t| matches!(t.pattern, Pattern::Regex { .. })) {
            let Some(re_pattern) = compiled.get(&re_term.name) else {
                continue;
            };
            for str_term in &selected {
                let Pattern::Str { value, flags } = &str_term.pattern else {
                    continue;
                };
                if str_term.priority != re_term.priority || !re_pattern.matches_whole(value) {
                    continue;
                }
                unless
                    .entry(re_term.name.clone())
                    .or_default()
                    .push((value.clone(), str_term.name.clone()));
                if flags.chars().all(|f| re_term.pattern.flags().contains(f)) {
                    embedded.insert(str_term.name.clone());
                }
            }
        }
        selected.retain(|t| !embedded.contains(&t.name));

        selected.sort_by_key(|t| {
            let max_width = compiled.get(&t.name).map_or(0, |p| p.max_width);
            let len = match &t.pattern {
                Pattern::Str { value, .. } | Pattern::Regex { value, .. } => value.len(),
                _ => 0,
            };
            (Reverse(t.priority), Reverse(max_width), Reverse(len), t.name.clone())
        });

        let terminals = selected
            .into_iter()
            .filter_map(|t| {
                let pattern = compiled.remove(&t.name)?;
                Some(ScanTerminal {
                    name: t.name.clone(),
                    pattern,
                    unless: unless.remove(&t.name).unwrap_or_default(),
                })
            })
            .collect();

        Ok(Self {
            terminals,
            ignore: conf.ignore.iter().cloned().collect(),
            callbacks: conf.callbacks.clone(),
        })
    }

    /// Names of the terminals this lexer can produce, ignored ones excluded.
    #[must_use]
    pub fn terminal_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .terminals
            .iter()
            .filter(|t| !self.ignore.contains(&t.name))
            .flat_map(|t| {
                std::iter::once(t.name.to_string()).chain(t.unless.iter().map(|(_, name)| name.to_string()))
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// First terminal matching at the start of `text`, with the match length.
    #[must_use]
    pub fn match_prefix(&self, text: &str) -> Option<(CompactString, usize)> {
        self.terminals.iter().find_map(|terminal| {
            let len = terminal.pattern.match_prefix(text).filter(|len| *len > 0)?;
            let value = &text[..len];
            let name = terminal
                .unless
                .iter()
                .find(|(string, _)| string == value)
                .map_or(&terminal.name, |(_, name)| name);
            Some((name.clone(), len))
        })
    }

    pub(crate) fn is_ignored(&self, name: &str) -> bool {
        self.ignore.contains(name)
    }

    pub(crate) fn unexpected_characters(&self, state: &LexerState<'_>) -> ParseError {
        let counter = state.line_ctr;
        ParseError::UnexpectedCharacters {
            character: state.remaining().chars().next().unwrap_or('\0'),
            pos: counter.char_pos,
            line: counter.line,
            column: counter.column,
            allowed: self.terminal_names(),
        }
    }
}

impl Lexer for BasicLexer {
    fn next_token(&self, state: &mut LexerState<'_>, _parser_state: Option<usize>) -> Result<Option<Token>> {
        loop {
            let rest = state.remaining();
            if rest.is_empty() {
                return Ok(None);
            }
            let Some((name, len)) = self.match_prefix(rest) else {
                return Err(self.unexpected_characters(state).into());
            };
            let span = state.line_ctr.span_of(&rest[..len]);
            let mut token = Token::new(name, &rest[..len]).with_span(Some(span));
            if let Some(callback) = self.callbacks.get(&token.kind) {
                token = callback(token);
            }
            if self.ignore.contains(&token.kind) {
                continue;
            }
            state.last_token = Some(token.clone());
            return Ok(Some(token));
        }
    }
}

impl std::fmt::Debug for BasicLexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicLexer")
            .field("terminals", &self.terminals.iter().map(|t| &t.name).collect::<Vec<_>>())
            .field("ignore", &self.ignore)
            .finish_non_exhaustive()
    }
}
