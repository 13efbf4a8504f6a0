use tessera::backend::lalr::ErrorHandler;
use tessera::{
    Algorithm, Error, Frontend, FrontendOptions, GrammarBuilder, LexerKind, ParseError, Template, TextSlice, Token,
};

fn grammar() -> tessera::Grammar {
    GrammarBuilder::new()
        .regex("NAME", "[a-z]+")
        .regex("WS", " +")
        .ignore("WS")
        .rule("start", ["NAME", "NAME"])
        .build()
        .expect("valid grammar")
}

#[test]
fn test_supported_pairings() {
    let grammar = grammar();
    let supported = [
        (Algorithm::Lalr, LexerKind::Basic),
        (Algorithm::Lalr, LexerKind::Contextual),
        (Algorithm::Earley, LexerKind::Basic),
        (Algorithm::Earley, LexerKind::Dynamic),
        (Algorithm::Earley, LexerKind::DynamicComplete),
        (Algorithm::Earley, LexerKind::Template),
        (Algorithm::Cyk, LexerKind::Basic),
    ];
    for (algorithm, lexer) in supported {
        let name = format!("{algorithm}/{lexer}");
        let frontend = grammar
            .frontend(algorithm, lexer, FrontendOptions::default())
            .unwrap_or_else(|err| panic!("{name}: {err}"));
        let tree = frontend.parse("ab cd", None, None).unwrap_or_else(|err| panic!("{name}: {err}"));
        let texts: Vec<_> = tree.as_tree().expect("tree").tokens().filter_map(Token::text).collect();
        assert_eq!(texts, ["ab", "cd"], "{name}");
    }
}

#[test]
fn test_unsupported_pairings() {
    let grammar = grammar();
    let unsupported = [
        (Algorithm::Lalr, LexerKind::Dynamic, "dynamic"),
        (Algorithm::Lalr, LexerKind::DynamicComplete, "dynamic_complete"),
        (Algorithm::Lalr, LexerKind::Template, "earley"),
        (Algorithm::Earley, LexerKind::Contextual, "contextual"),
        (Algorithm::Cyk, LexerKind::Contextual, "contextual"),
        (Algorithm::Cyk, LexerKind::Template, "earley"),
    ];
    for (algorithm, lexer, mentions) in unsupported {
        match grammar.frontend(algorithm, lexer, FrontendOptions::default()) {
            Err(Error::Configuration(message)) => assert!(message.contains(mentions), "{message}"),
            other => panic!("{algorithm}: unexpected result {other:?}"),
        }
    }
}

#[test]
fn test_start_symbol_verification() {
    let grammar = GrammarBuilder::new()
        .regex("NAME", "[a-z]+")
        .rule("first", ["NAME"])
        .rule("second", ["NAME"])
        .start("first")
        .start("second")
        .build()
        .expect("valid grammar");
    for algorithm in [Algorithm::Lalr, Algorithm::Earley, Algorithm::Cyk] {
        let frontend = grammar
            .frontend(algorithm, LexerKind::Basic, FrontendOptions::default())
            .expect("valid frontend");
        assert!(matches!(frontend.parse("x", None, None), Err(Error::Configuration(_))));
        assert!(matches!(frontend.parse("x", Some("third"), None), Err(Error::Configuration(_))));
        let tree = frontend.parse("x", Some("second"), None).expect("declared start");
        assert_eq!(tree.as_tree().map(|t| t.data.as_str()), Some("second"));
    }
}

#[test]
fn test_error_handler_is_lalr_only() {
    let grammar = grammar();
    for (algorithm, lexer) in [
        (Algorithm::Earley, LexerKind::Basic),
        (Algorithm::Earley, LexerKind::Dynamic),
        (Algorithm::Earley, LexerKind::Template),
        (Algorithm::Cyk, LexerKind::Basic),
    ] {
        let frontend = grammar
            .frontend(algorithm, lexer, FrontendOptions::default())
            .expect("valid frontend");
        let mut recover = |_: &ParseError| true;
        let result = frontend.parse("ab cd", None, Some(&mut recover as &mut ErrorHandler<'_>));
        assert!(matches!(result, Err(Error::Configuration(_))), "{algorithm}");
    }
}

#[test]
fn test_interactive_is_lalr_only() {
    let grammar = grammar();
    let earley = grammar
        .frontend(Algorithm::Earley, LexerKind::Basic, FrontendOptions::default())
        .expect("valid frontend");
    assert!(matches!(earley.parse_interactive(Some("ab cd"), None), Err(Error::Configuration(_))));

    let lalr = grammar
        .frontend(Algorithm::Lalr, LexerKind::Basic, FrontendOptions::default())
        .expect("valid frontend");
    let result = lalr
        .parse_interactive(Some("ab cd"), None)
        .and_then(|interactive| interactive.resume_parse())
        .expect("parses");
    assert_eq!(result.as_tree().map(|t| t.children.len()), Some(2));
}

#[test]
fn test_templates_need_the_template_frontend() {
    let grammar = grammar();
    let template = Template::literal("ab cd");
    let lalr = grammar
        .frontend(Algorithm::Lalr, LexerKind::Contextual, FrontendOptions::default())
        .expect("valid frontend");
    assert!(matches!(lalr.parse(&template, None, None), Err(Error::Configuration(_))));

    let templates = grammar
        .frontend(Algorithm::Earley, LexerKind::Template, FrontendOptions::default())
        .expect("valid frontend");
    assert!(matches!(templates, Frontend::Template(_)));
    assert!(templates.parse(&template, None, None).is_ok());
}

#[test]
fn test_text_slices_keep_absolute_positions() {
    let grammar = grammar();
    let text = "zz ab cd zz";
    let slice = TextSlice::new(text, 3, 8).expect("valid slice");
    for algorithm in [Algorithm::Lalr, Algorithm::Earley, Algorithm::Cyk] {
        let frontend = grammar
            .frontend(algorithm, LexerKind::Basic, FrontendOptions::default())
            .expect("valid frontend");
        let tree = frontend.parse(slice, None, None).expect("parses").into_tree().expect("tree");
        let columns: Vec<_> = tree.tokens().filter_map(Token::column).collect();
        assert_eq!(columns, [4, 7], "{algorithm}");
    }
}
