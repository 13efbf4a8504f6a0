use tessera::grammar::{augment, Pattern, PLACEHOLDER};
use tessera::{Error, FrontendOptions, GrammarBuilder, Symbol};

#[test]
fn test_default_start_symbol() {
    let grammar = GrammarBuilder::new()
        .regex("A", "a")
        .rule("start", ["A"])
        .build()
        .expect("valid grammar");
    assert_eq!(grammar.start, ["start"]);
}

#[test]
fn test_undefined_symbols_are_rejected() {
    let missing_rule = GrammarBuilder::new()
        .regex("A", "a")
        .rule("start", ["A", "rest"])
        .build();
    assert!(matches!(missing_rule, Err(Error::Grammar(message)) if message.contains("rest")));

    let missing_terminal = GrammarBuilder::new().rule("start", ["NUMBER"]).build();
    assert!(matches!(missing_terminal, Err(Error::Grammar(message)) if message.contains("NUMBER")));

    let missing_ignore = GrammarBuilder::new()
        .regex("A", "a")
        .rule("start", ["A"])
        .ignore("WS")
        .build();
    assert!(matches!(missing_ignore, Err(Error::Grammar(_))));

    let missing_start = GrammarBuilder::new()
        .regex("A", "a")
        .rule("item", ["A"])
        .build();
    assert!(matches!(missing_start, Err(Error::Grammar(_))));
}

#[test]
fn test_duplicate_definitions_are_rejected() {
    let terminal = GrammarBuilder::new()
        .regex("A", "a")
        .regex("A", "b")
        .rule("start", ["A"])
        .build();
    assert!(matches!(terminal, Err(Error::Grammar(_))));

    let rule = GrammarBuilder::new()
        .regex("A", "a")
        .rule("start", ["A"])
        .rule("start", ["A"])
        .build();
    assert!(matches!(rule, Err(Error::Grammar(_))));
}

#[test]
fn test_literals_become_filtered_terminals() {
    let grammar = GrammarBuilder::new()
        .rule("start", ["\"v\"", "PLACEHOLDER"])
        .build()
        .expect("valid grammar");
    let expansion = &grammar.rules[0].expansion;
    assert_eq!(expansion[0], Symbol::filtered_terminal("V"));
    assert!(expansion[0].filter_out());
    assert!(!expansion[1].filter_out());
    assert_eq!(
        grammar.terminal("V").map(|t| &t.pattern),
        Some(&Pattern::string("v"))
    );
    assert!(grammar.terminal(PLACEHOLDER).is_some());
}

#[test]
fn test_compile_creates_callbacks_for_every_rule() {
    let grammar = GrammarBuilder::new()
        .regex("NAME", "[a-z]+")
        .rule("start", ["pair"])
        .rule("pair", ["NAME", "\"=\"", "NAME"])
        .build()
        .expect("valid grammar");
    let (lexer_conf, parser_conf) = grammar.compile(&FrontendOptions::default());
    assert_eq!(lexer_conf.terminals.len(), 2);
    assert_eq!(parser_conf.callbacks.len(), parser_conf.rules.len());
    assert!(!parser_conf.augmented);
    assert_eq!(parser_conf.start, ["start"]);
}

#[test]
fn test_augmentation_covers_aliases_and_is_idempotent() {
    let grammar = GrammarBuilder::new()
        .regex("NUMBER", r"\d+")
        .rule("?paint", ["color"])
        .alias("color", ["NUMBER", "\",\"", "NUMBER", "\",\"", "NUMBER"], "rgb")
        .rule("start", ["paint"])
        .build()
        .expect("valid grammar");

    let once = augment(&grammar.rules, &grammar.terminals);
    assert_eq!(once.tree_terminals.get("rgb").map(|t| t.as_str()), Some("TREE__RGB"));
    assert_eq!(once.tree_terminals.get("paint").map(|t| t.as_str()), Some("TREE__PAINT"));
    assert!(!once.tree_terminals.contains_key("color"));
    assert!(once
        .terminals
        .iter()
        .any(|t| t.pattern == Pattern::Tree { label: "rgb".into() }));

    let twice = augment(&once.rules, &once.terminals);
    assert_eq!(twice.rules, once.rules);
    assert_eq!(twice.terminals, once.terminals);
    assert_eq!(twice.tree_terminals, once.tree_terminals);
}
