use crate::backend::Algorithm;
use crate::error::{Error, Result};
use crate::frontend::{construct_frontend, Frontend, FrontendOptions, LexerKind};
use crate::grammar::terminal::{placeholder_terminal_name, PLACEHOLDER};
use crate::grammar::{LexerConf, ParserConf, Pattern, Rule, RuleOptions, Symbol, TerminalDef};
use crate::syntax::ParseTreeBuilder;
use crate::{HashMap, HashSet};
use compact_str::{CompactString, format_compact};

/// A complete grammar: terminals, rules, start symbols and ignored terminals.
///
/// Built once with [`GrammarBuilder`], then compiled into the configuration
/// bundles consumed by a frontend.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Grammar {
    pub terminals: Vec<TerminalDef>,
    pub rules: Vec<Rule>,
    pub start: Vec<CompactString>,
    pub ignore: Vec<CompactString>,
}

impl Grammar {
    #[must_use]
    pub fn terminal(&self, name: &str) -> Option<&TerminalDef> {
        self.terminals.iter().find(|t| t.name == name)
    }

    pub fn rules_for<'a>(&'a self, origin: &'a str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |r| r.origin.name() == origin)
    }

    /// Produce the lexer and parser configuration, with tree-building
    /// callbacks for every rule.
    #[must_use]
    pub fn compile(&self, options: &FrontendOptions) -> (LexerConf, ParserConf) {
        let lexer_conf = LexerConf::new(self.terminals.clone(), self.ignore.clone());
        let callbacks = ParseTreeBuilder::from_options(options).create_callbacks(&self.rules);
        let parser_conf = ParserConf::new(self.rules.clone(), callbacks, self.start.clone());
        (lexer_conf, parser_conf)
    }

    /// Compile and construct a frontend in one step.
    pub fn frontend(
        &self,
        algorithm: Algorithm,
        lexer: LexerKind,
        options: FrontendOptions,
    ) -> Result<Frontend> {
        let (lexer_conf, parser_conf) = self.compile(&options);
        construct_frontend(algorithm, lexer, lexer_conf, parser_conf, options)
    }
}

#[derive(Debug, Clone)]
struct PendingRule {
    origin: CompactString,
    items: Vec<String>,
    alias: Option<CompactString>,
    options: RuleOptions,
}

/// Programmatic grammar construction.
///
/// Expansion items use a compact per-symbol notation:
///
/// - `"\"text\""`: an anonymous string terminal, filtered from trees
/// - `NAME`: a terminal (first letter upper-case); `_NAME` is filtered from trees
/// - `name`: a rule; `_name` rules are inlined into their parent
/// - `PLACEHOLDER` and `PLACEHOLDER[key]`: generic and typed placeholders
///
/// Rule origins may be prefixed with `?` (collapse single-child nodes) or
/// `!` (keep every token).
///
/// # Example
///
/// ```rust,no_run
/// use tessera::grammar::GrammarBuilder;
///
/// let grammar = GrammarBuilder::new()
///     .regex("NUMBER", r"\d+")
///     .rule("start", ["\"v\"", "NUMBER"])
///     .build()
///     .expect("valid grammar");
/// ```
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    terminals: Vec<TerminalDef>,
    rules: Vec<PendingRule>,
    start: Vec<CompactString>,
    ignore: Vec<CompactString>,
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn terminal(mut self, terminal: TerminalDef) -> Self {
        self.terminals.push(terminal);
        self
    }

    #[must_use]
    pub fn string(self, name: &str, value: &str) -> Self {
        self.terminal(TerminalDef::new(name, Pattern::string(value)))
    }

    #[must_use]
    pub fn regex(self, name: &str, value: &str) -> Self {
        self.terminal(TerminalDef::new(name, Pattern::regex(value)))
    }

    /// Declare the generic placeholder terminal.
    #[must_use]
    pub fn placeholder(self) -> Self {
        self.terminal(TerminalDef::new(PLACEHOLDER, Pattern::Placeholder { type_key: None }))
    }

    /// Declare a placeholder restricted to the type registered for `key`.
    #[must_use]
    pub fn typed_placeholder(self, key: &str) -> Self {
        self.terminal(TerminalDef::new(
            placeholder_terminal_name(Some(key)),
            Pattern::Placeholder {
                type_key: Some(key.to_string()),
            },
        ))
    }

    #[must_use]
    pub fn rule<I, S>(self, origin: &str, expansion: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_with(origin, expansion, None, RuleOptions::default())
    }

    /// A rule whose trees are labelled `alias` instead of the origin name.
    #[must_use]
    pub fn alias<I, S>(self, origin: &str, expansion: I, alias: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_with(origin, expansion, Some(alias.into()), RuleOptions::default())
    }

    #[must_use]
    pub fn rule_with<I, S>(
        mut self,
        origin: &str,
        expansion: I,
        alias: Option<CompactString>,
        mut options: RuleOptions,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut name = origin;
        loop {
            if let Some(rest) = name.strip_prefix('?') {
                options.expand1 = true;
                name = rest;
            } else if let Some(rest) = name.strip_prefix('!') {
                options.keep_all_tokens = true;
                name = rest;
            } else {
                break;
            }
        }
        self.rules.push(PendingRule {
            origin: name.into(),
            items: expansion.into_iter().map(Into::into).collect(),
            alias,
            options,
        });
        self
    }

    #[must_use]
    pub fn start(mut self, name: &str) -> Self {
        self.start.push(name.into());
        self
    }

    #[must_use]
    pub fn ignore(mut self, terminal: &str) -> Self {
        self.ignore.push(terminal.into());
        self
    }

    /// Resolve symbol references and validate the grammar.
    pub fn build(self) -> Result<Grammar> {
        let mut terminals: Vec<TerminalDef> = Vec::new();
        for terminal in self.terminals {
            match terminals.iter().find(|t| t.name == terminal.name) {
                Some(existing) if existing.pattern != terminal.pattern => {
                    return Err(Error::grammar(format!(
                        "Terminal '{}' defined more than once",
                        terminal.name
                    )));
                }
                Some(_) => {}
                None => terminals.push(terminal),
            }
        }

        let mut resolver = SymbolResolver {
            terminals,
            generated: HashSet::default(),
        };
        let mut rules = Vec::with_capacity(self.rules.len());
        let mut orders: HashMap<CompactString, usize> = HashMap::default();
        let mut seen: HashSet<Rule> = HashSet::default();
        for pending in self.rules {
            let keep_all = pending.options.keep_all_tokens;
            let expansion = pending
                .items
                .iter()
                .map(|item| resolver.resolve(item, keep_all))
                .collect::<Result<Vec<_>>>()?;
            let order = orders.entry(pending.origin.clone()).or_insert(0);
            let mut options = pending.options;
            options.empty_indices = vec![false; expansion.len()];
            let rule = Rule::new(pending.origin, expansion, *order)
                .with_alias(pending.alias)
                .with_options(options);
            *order += 1;
            if !seen.insert(rule.clone()) {
                return Err(Error::grammar(format!("Rule {rule} defined more than once")));
            }
            rules.push(rule);
        }

        let start = if self.start.is_empty() {
            vec![CompactString::const_new("start")]
        } else {
            self.start
        };
        let grammar = Grammar {
            terminals: resolver.terminals,
            rules,
            start,
            ignore: self.ignore,
        };
        validate(&grammar)?;
        log::debug!(
            "built grammar with {} rules and {} terminals",
            grammar.rules.len(),
            grammar.terminals.len()
        );
        Ok(grammar)
    }
}

struct SymbolResolver {
    terminals: Vec<TerminalDef>,
    /// Names of terminals synthesized for string literals
    generated: HashSet<CompactString>,
}

impl SymbolResolver {
    fn resolve(&mut self, item: &str, keep_all: bool) -> Result<Symbol> {
        if item.len() >= 2 && item.starts_with('"') && item.ends_with('"') {
            return Ok(self.literal(&item[1..item.len() - 1], keep_all));
        }
        if item == PLACEHOLDER {
            self.declare(TerminalDef::new(PLACEHOLDER, Pattern::Placeholder { type_key: None }));
            return Ok(Symbol::terminal(PLACEHOLDER));
        }
        if let Some(key) = item
            .strip_prefix(PLACEHOLDER)
            .and_then(|rest| rest.strip_prefix('['))
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let name = placeholder_terminal_name(Some(key));
            self.declare(TerminalDef::new(
                name.clone(),
                Pattern::Placeholder {
                    type_key: Some(key.to_string()),
                },
            ));
            return Ok(Symbol::terminal(name));
        }

        let bare = item.trim_start_matches('_');
        let Some(first) = bare.chars().next() else {
            return Err(Error::grammar(format!("Invalid symbol '{item}'")));
        };
        if !item.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::grammar(format!("Invalid symbol '{item}'")));
        }
        if first.is_ascii_uppercase() {
            let filter_out = item.starts_with('_') && !keep_all;
            Ok(Symbol::Terminal {
                name: item.into(),
                filter_out,
            })
        } else {
            Ok(Symbol::non_terminal(item))
        }
    }

    fn declare(&mut self, terminal: TerminalDef) {
        if !self.terminals.iter().any(|t| t.name == terminal.name) {
            self.terminals.push(terminal);
        }
    }

    fn literal(&mut self, value: &str, keep_all: bool) -> Symbol {
        let pattern = Pattern::string(value);
        if let Some(existing) = self.terminals.iter().find(|t| t.pattern == pattern) {
            // Anonymous literals stay filtered; user-named ones are kept
            let filter_out = self.generated.contains(&existing.name) && !keep_all;
            return Symbol::Terminal {
                name: existing.name.clone(),
                filter_out,
            };
        }

        let mut name = literal_name(value);
        if name.as_ref().is_some_and(|n| self.terminals.iter().any(|t| &t.name == n)) {
            name = None;
        }
        let name = name.unwrap_or_else(|| {
            let count = self.generated.iter().filter(|n| n.starts_with("__ANON_")).count();
            format_compact!("__ANON_{count}")
        });
        self.generated.insert(name.clone());
        self.terminals.push(TerminalDef::new(name.clone(), pattern));
        Symbol::Terminal {
            name,
            filter_out: !keep_all,
        }
    }
}

fn literal_name(value: &str) -> Option<CompactString> {
    let mut chars = value.chars();
    let first = chars.next()?;
    if (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Some(value.to_ascii_uppercase().into());
    }
    let name = match value {
        "." => "DOT",
        "," => "COMMA",
        ":" => "COLON",
        ";" => "SEMICOLON",
        "+" => "PLUS",
        "-" => "MINUS",
        "*" => "STAR",
        "/" => "SLASH",
        "\\" => "BACKSLASH",
        "|" => "VBAR",
        "?" => "QMARK",
        "!" => "BANG",
        "@" => "AT",
        "#" => "HASH",
        "$" => "DOLLAR",
        "%" => "PERCENT",
        "^" => "CIRCUMFLEX",
        "&" => "AMPERSAND",
        "<" => "LESSTHAN",
        ">" => "MORETHAN",
        "=" => "EQUAL",
        "\"" => "DBLQUOTE",
        "'" => "QUOTE",
        "`" => "BACKQUOTE",
        "~" => "TILDE",
        "(" => "LPAR",
        ")" => "RPAR",
        "{" => "LBRACE",
        "}" => "RBRACE",
        "[" => "LSQB",
        "]" => "RSQB",
        "\n" => "NEWLINE",
        "\t" => "TAB",
        " " => "SPACE",
        _ => return None,
    };
    Some(CompactString::const_new(name))
}

fn validate(grammar: &Grammar) -> Result<()> {
    let terminal_names: HashSet<&str> = grammar.terminals.iter().map(|t| t.name.as_str()).collect();
    let rule_names: HashSet<&str> = grammar.rules.iter().map(|r| r.origin.name().as_str()).collect();

    for rule in &grammar.rules {
        for symbol in &rule.expansion {
            let name = symbol.name().as_str();
            if symbol.is_terminal() && !terminal_names.contains(name) {
                return Err(Error::grammar(format!(
                    "Terminal '{name}' used but not defined (in rule {rule})"
                )));
            }
            if !symbol.is_terminal() && !rule_names.contains(name) {
                return Err(Error::grammar(format!(
                    "Rule '{name}' used but not defined (in rule {rule})"
                )));
            }
        }
    }
    for name in &grammar.ignore {
        if !terminal_names.contains(name.as_str()) {
            return Err(Error::grammar(format!("Ignored terminal '{name}' is not defined")));
        }
    }
    for name in &grammar.start {
        if !rule_names.contains(name.as_str()) {
            return Err(Error::grammar(format!("Start symbol '{name}' has no rules")));
        }
    }
    Ok(())
}
