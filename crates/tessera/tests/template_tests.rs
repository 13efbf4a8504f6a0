mod common;

use common::{item_names, statements};
use tessera::{
    Algorithm, Child, Error, Frontend, FrontendOptions, GrammarBuilder, HostType, HostValue, Interpolation,
    LexerKind, ParseError, SourceInfo, Template, Token, Tree,
};

fn template_frontend(builder: GrammarBuilder, options: FrontendOptions) -> Frontend {
    builder
        .build()
        .expect("valid grammar")
        .frontend(Algorithm::Earley, LexerKind::Template, options)
        .expect("template frontend")
}

fn expression_frontend() -> Frontend {
    template_frontend(
        GrammarBuilder::new()
            .regex("NUMBER", r"\d+")
            .regex("WS", " +")
            .ignore("WS")
            .rule("?start", ["expr"])
            .rule("?expr", ["term"])
            .alias("?expr", ["expr", "\"+\"", "term"], "add")
            .rule("?term", ["NUMBER"]),
        FrontendOptions::default(),
    )
}

#[test]
fn test_placeholder_accepts_any_host_value() {
    let frontend = template_frontend(
        GrammarBuilder::new().rule("start", ["\"v\"", "PLACEHOLDER"]),
        FrontendOptions::default(),
    );
    let template = Template::builder().text("v").value(42_i64).build();
    let tree = frontend.parse(&template, None, None).expect("parses").into_tree().expect("tree");
    assert_eq!(tree.data, "start");
    assert_eq!(tree.children.len(), 1);
    let token = tree.children[0].as_token().expect("placeholder token");
    assert_eq!(token.kind, "PLACEHOLDER");
    assert_eq!(token.host_value().and_then(HostValue::downcast_ref::<i64>), Some(&42));

    let text = Template::builder().text("v").value(String::from("text")).build();
    assert!(frontend.parse(&text, None, None).is_ok());
}

#[test]
fn test_plain_strings_cannot_fill_placeholders() {
    let frontend = template_frontend(
        GrammarBuilder::new().rule("start", ["\"v\"", "PLACEHOLDER"]),
        FrontendOptions::default(),
    );
    let err = frontend.parse("v1", None, None).expect_err("no text matches a placeholder");
    match err.as_parse_error() {
        Some(ParseError::UnexpectedCharacters { character, column, .. }) => {
            assert_eq!((*character, *column), ('1', 2));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_consecutive_interpolations() {
    let frontend = template_frontend(
        GrammarBuilder::new().rule("start", ["PLACEHOLDER", "PLACEHOLDER"]),
        FrontendOptions::default(),
    );
    let template = Template::builder().value(1_u8).value(2_u8).build();
    assert_eq!(template.strings(), ["", "", ""]);
    let tree = frontend.parse(&template, None, None).expect("parses").into_tree().expect("tree");
    assert_eq!(tree.children.len(), 2);
}

#[test]
fn test_positions_come_from_source_info() {
    let frontend = template_frontend(
        GrammarBuilder::new()
            .regex("NAME", "[a-z]+")
            .rule("start", ["NAME", "PLACEHOLDER"]),
        FrontendOptions::default(),
    );
    let template = Template::new(vec!["a".into(), String::new()], vec![Interpolation::host(123_i32)])
        .expect("two segments")
        .with_source_info(
            SourceInfo::new("a{123}")
                .with_filename("inline.txt")
                .with_segment_spans(vec![Some((0, 1)), Some((6, 6))])
                .with_interpolation_spans(vec![Some((1, 6))]),
        )
        .expect("valid spans");
    let tree = frontend.parse(&template, None, None).expect("parses").into_tree().expect("tree");
    let placeholder = tree.children[1].as_token().expect("placeholder token");
    assert_eq!((placeholder.line(), placeholder.column()), (Some(1), Some(2)));
    let span = placeholder.span.expect("positioned");
    assert_eq!((span.start_pos, span.end_pos), (1, 6));

    let bare = Template::builder().text("a").value(123_i32).build();
    let tree = frontend.parse(&bare, None, None).expect("parses").into_tree().expect("tree");
    assert!(tree.tokens().all(|token| token.span.is_none()));
}

#[test]
fn test_source_info_locates_errors() {
    let frontend = template_frontend(
        GrammarBuilder::new()
            .regex("NAME", "[a-z]+")
            .regex("WS", r"\s+")
            .ignore("WS")
            .rule("start", ["NAME", "NAME"]),
        FrontendOptions::default(),
    );
    let template = Template::new(vec!["ab\n  ".into(), String::new()], vec![Interpolation::host(5_i32)])
        .expect("two segments")
        .with_source_info(
            SourceInfo::new("ab\n  {n}")
                .with_segment_spans(vec![Some((0, 5)), Some((8, 8))])
                .with_interpolation_spans(vec![Some((5, 8))]),
        )
        .expect("valid spans");
    let err = frontend.parse(&template, None, None).expect_err("a value is not a NAME");
    let parse_err = err.as_parse_error().expect("parse error");
    assert_eq!((parse_err.line(), parse_err.column()), (Some(2), Some(3)));
}

#[test]
fn test_errors_describe_interpolations() {
    let frontend = template_frontend(
        GrammarBuilder::new()
            .regex("NUMBER", r"\d+")
            .rule("start", ["\"v\"", "NUMBER"]),
        FrontendOptions::default(),
    );
    let template = Template::builder().text("v").value(42_i32).build();
    let err = frontend.parse(&template, None, None).expect_err("a value is not a NUMBER");
    match err.as_parse_error() {
        Some(ParseError::UnexpectedToken { note, expected, .. }) => {
            assert_eq!(
                note.as_deref(),
                Some("Interpolated value <i32> is not valid in this context")
            );
            assert_eq!(expected, &["NUMBER".to_string()]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(err.to_string().contains("Interpolated value <i32>"));

    let tree_in_wrong_place = Template::builder().text("v").tree(Tree::new("start", vec![])).build();
    let err = frontend.parse(&tree_in_wrong_place, None, None).expect_err("a tree is not a NUMBER");
    match err.as_parse_error() {
        Some(ParseError::UnexpectedToken { note, .. }) => {
            assert_eq!(
                note.as_deref(),
                Some("Interpolated Tree('start') is not valid in this context")
            );
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let misplaced_value = Template::builder().value(1_i32).build();
    let err = frontend.parse(&misplaced_value, None, None).expect_err("start needs text");
    let expected = err.as_parse_error().map(ParseError::expected).unwrap_or_default();
    assert_eq!(expected, ["Tree('start')", "V"]);
}

#[test]
fn test_typed_placeholders() {
    let grammar = GrammarBuilder::new().rule("start", ["\"n\"", "PLACEHOLDER[num]"]);
    let options = FrontendOptions::default().with_placeholder_type("num", HostType::of::<i64>());
    let frontend = template_frontend(grammar, options);

    let good = Template::builder().text("n").value(7_i64).build();
    let tree = frontend.parse(&good, None, None).expect("parses").into_tree().expect("tree");
    assert_eq!(
        tree.children[0].as_token().map(|t| t.kind.as_str()),
        Some("PLACEHOLDER__NUM")
    );

    let bad = Template::builder().text("n").value(String::from("seven")).build();
    match frontend.parse(&bad, None, None) {
        Err(Error::TypeMismatch { key, expected, found }) => {
            assert_eq!(key, "num");
            assert_eq!(expected, "i64");
            assert_eq!(found, "String");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_missing_type_mappings_are_reported_together() {
    let grammar = GrammarBuilder::new()
        .rule("start", ["PLACEHOLDER[image]", "PLACEHOLDER[num]"])
        .build()
        .expect("valid grammar");
    let err = grammar
        .frontend(Algorithm::Earley, LexerKind::Template, FrontendOptions::default())
        .expect_err("types missing");
    match err {
        Error::Configuration(message) => {
            assert!(message.contains("image"), "{message}");
            assert!(message.contains("num"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let partial = FrontendOptions::default().with_placeholder_type("num", HostType::of::<i64>());
    assert!(matches!(
        grammar.frontend(Algorithm::Earley, LexerKind::Template, partial),
        Err(Error::Configuration(message)) if message.contains("image") && !message.contains("num")
    ));
}

#[test]
fn test_tree_splicing() {
    let frontend = expression_frontend();
    let sub = frontend.parse("1 + 2", None, None).expect("parses");
    let sub = sub.into_tree().expect("tree");
    assert_eq!(sub.data, "add");

    let template = Template::builder().tree(sub.clone()).build();
    let result = frontend.parse(&template, None, None).expect("parses");
    assert_eq!(result, Child::Tree(sub.clone()));

    let bigger = Template::builder().tree(sub.clone()).text(" + 3").build();
    let tree = frontend.parse(&bigger, None, None).expect("parses").into_tree().expect("tree");
    assert_eq!(tree.data, "add");
    assert_eq!(tree.children[0], Child::Tree(sub));
    assert!(tree.tokens().all(|token| !token.is_splice()));
}

#[test]
fn test_unknown_tree_labels_cannot_be_spliced() {
    let frontend = expression_frontend();
    let template = Template::builder().tree(Tree::new("circle", vec![])).build();
    match frontend.parse(&template, None, None) {
        Err(err @ Error::Splice { .. }) => assert!(err.to_string().contains("circle")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_literal_templates_parse_like_plain_strings() {
    let frontend = expression_frontend();
    for text in ["4", "1 + 2", "1 + 2 + 3"] {
        let from_template = frontend.parse(&Template::literal(text), None, None).expect("parses");
        let from_text = frontend.parse(text, None, None).expect("parses");
        assert_eq!(from_template, from_text, "{text}");
    }
}

#[test]
fn test_mixed_static_values_and_trees() {
    let frontend = template_frontend(
        GrammarBuilder::new()
            .regex("NUMBER", r"\d+")
            .regex("WS", " +")
            .ignore("WS")
            .rule("start", ["\"static\"", "PLACEHOLDER", "expr"])
            .rule("expr", ["NUMBER"])
            .start("start")
            .start("expr"),
        FrontendOptions::default(),
    );
    let sub = frontend.parse("42", Some("expr"), None).expect("parses");
    assert_eq!(sub.as_tree().map(|t| t.data.as_str()), Some("expr"));

    let template = Template::builder()
        .text("static ")
        .value(100_i32)
        .text(" ")
        .tree(sub.clone().into_tree().expect("tree"))
        .build();
    let tree = frontend
        .parse(&template, Some("start"), None)
        .expect("parses")
        .into_tree()
        .expect("tree");
    assert_eq!(tree.children.len(), 2);
    assert!(tree.children[0].as_token().is_some_and(Token::is_placeholder));
    assert_eq!(tree.children[1], sub);
}

#[test]
fn test_joined_templates() {
    let frontend = expression_frontend();
    let sub = frontend.parse("2 + 3", None, None).expect("parses").into_tree().expect("tree");
    let left = Template::builder().tree(sub).text(" + ").build();
    let right = Template::literal("4");
    let joined = left.join(&right);
    assert_eq!(joined.strings(), ["", " + 4"]);
    let tree = frontend.parse(&joined, None, None).expect("parses").into_tree().expect("tree");
    assert_eq!(tree.data, "add");
    assert_eq!(tree.tokens().filter_map(Token::text).collect::<Vec<_>>(), ["2", "3", "4"]);
}

#[test]
fn test_long_lists_through_templates() {
    let frontend = statements()
        .frontend(Algorithm::Earley, LexerKind::Template, FrontendOptions::default())
        .expect("template frontend");
    let text = "a; ".repeat(3000);
    let from_text = frontend.parse(text.as_str(), None, None).expect("parses");
    assert_eq!(item_names(&from_text).len(), 3000);
    let from_template = frontend.parse(&Template::literal(text.as_str()), None, None).expect("parses");
    assert_eq!(from_template, from_text);

    let half = "a; ".repeat(1500);
    let item = Tree::new("item", vec![Token::new("NAME", "b").into()]);
    let template = Template::builder().text(half.as_str()).tree(item).text(half.as_str()).build();
    let result = frontend.parse(&template, None, None).expect("parses");
    let names = item_names(&result);
    assert_eq!(names.len(), 3001);
    assert_eq!(names[1500], "b");
    assert!(result.as_tree().expect("tree").tokens().all(|token| !token.is_splice()));
}

#[test]
fn test_plain_text_errors_name_splice_terminals_by_label() {
    let frontend = expression_frontend();
    let err = frontend.parse("1 + +", None, None).expect_err("missing operand");
    match err.as_parse_error() {
        Some(ParseError::UnexpectedToken { note, expected, .. }) => {
            assert_eq!(expected, &["NUMBER".to_string(), "Tree('term')".to_string()]);
            assert!(note.is_none());
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!err.to_string().contains("TREE__"), "{err}");
}
