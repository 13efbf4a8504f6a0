//! A small paint language exercised through templates: colors are written
//! inline or spliced in as trees, images arrive as host values.

use tessera::{
    Algorithm, Child, Error, Frontend, FrontendOptions, GrammarBuilder, HostType, HostValue, LexerKind, ParseError,
    Template, Tree,
};

#[derive(Debug, PartialEq)]
struct Image {
    path: String,
}

impl Image {
    fn new(path: &str) -> Self {
        Self { path: path.to_string() }
    }
}

fn paint_frontend() -> Frontend {
    GrammarBuilder::new()
        .regex("NUMBER", r"\d+")
        .regex("WS", r"\s+")
        .ignore("WS")
        .rule("start", ["_objects"])
        .rule("_objects", ["object"])
        .rule("_objects", ["_objects", "object"])
        .rule(
            "object",
            ["\"object\"", "\"{\"", "\"stroke:\"", "paint", "\"fill:\"", "paint", "\"}\""],
        )
        .rule("?paint", ["color"])
        .rule("?paint", ["image"])
        .rule("color", ["NUMBER", "\",\"", "NUMBER", "\",\"", "NUMBER"])
        .rule("image", ["PLACEHOLDER[image]"])
        .start("start")
        .start("color")
        .build()
        .expect("valid grammar")
        .frontend(
            Algorithm::Earley,
            LexerKind::Template,
            FrontendOptions::default().with_placeholder_type("image", HostType::of::<Image>()),
        )
        .expect("template frontend")
}

fn color(frontend: &Frontend, text: &str) -> Tree {
    frontend
        .parse(text, Some("color"), None)
        .expect("valid color")
        .into_tree()
        .expect("tree")
}

fn objects(result: &Child) -> Vec<&Tree> {
    result.as_tree().expect("tree").find_data("object").collect()
}

fn paints(object: &Tree) -> (&Tree, &Tree) {
    let mut paints = object.children.iter().filter_map(Child::as_tree);
    let stroke = paints.next().expect("stroke");
    let fill = paints.next().expect("fill");
    (stroke, fill)
}

fn channels(color: &Tree) -> Vec<&str> {
    color.tokens().filter_map(tessera::Token::text).collect()
}

fn image_path(image: &Tree) -> Option<&str> {
    image.children[0]
        .as_token()
        .and_then(tessera::Token::host_value)
        .and_then(HostValue::downcast_ref::<Image>)
        .map(|image| image.path.as_str())
}

#[test]
fn test_static_objects() {
    let frontend = paint_frontend();
    let result = frontend
        .parse("object { stroke: 255,0,0 fill: 0,0,255 }", Some("start"), None)
        .expect("parses");
    let objects = objects(&result);
    assert_eq!(objects.len(), 1);
    let (stroke, fill) = paints(objects[0]);
    assert_eq!((stroke.data.as_str(), fill.data.as_str()), ("color", "color"));
    assert_eq!(channels(stroke), ["255", "0", "0"]);
    assert_eq!(channels(fill), ["0", "0", "255"]);
}

#[test]
fn test_image_values_fill_typed_placeholders() {
    let frontend = paint_frontend();
    let template = Template::builder()
        .text("object { stroke: ")
        .value(Image::new("brush.png"))
        .text(" fill: 0,0,0 }")
        .build();
    let result = frontend.parse(&template, Some("start"), None).expect("parses");
    let (stroke, fill) = paints(objects(&result)[0]);
    assert_eq!(stroke.data, "image");
    assert_eq!(
        stroke.children[0].as_token().map(|t| t.kind.as_str()),
        Some("PLACEHOLDER__IMAGE")
    );
    assert_eq!(image_path(stroke), Some("brush.png"));
    assert_eq!(fill.data, "color");
}

#[test]
fn test_wrong_host_types_are_rejected() {
    let frontend = paint_frontend();
    let with_string = Template::builder()
        .text("object { stroke: ")
        .value(String::from("brush.png"))
        .text(" fill: 0,0,0 }")
        .build();
    match frontend.parse(&with_string, Some("start"), None) {
        Err(Error::TypeMismatch { key, expected, found }) => {
            assert_eq!((key.as_str(), expected.as_str(), found.as_str()), ("image", "Image", "String"));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let with_number = Template::builder()
        .text("object { stroke: 0,0,0 fill: ")
        .value(7_i32)
        .text(" }")
        .build();
    match frontend.parse(&with_number, Some("start"), None) {
        Err(err @ Error::TypeMismatch { .. }) => {
            let message = err.to_string();
            assert!(message.contains("Image") && message.contains("i32"), "{message}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_color_trees_splice_into_paint_positions() {
    let frontend = paint_frontend();
    let red = color(&frontend, "255,0,0");
    assert_eq!(channels(&red), ["255", "0", "0"]);

    let template = Template::builder()
        .text("object { stroke: ")
        .tree(red.clone())
        .text(" fill: 0,128,0 }")
        .build();
    let result = frontend.parse(&template, Some("start"), None).expect("parses");
    let (stroke, fill) = paints(objects(&result)[0]);
    assert_eq!(stroke, &red);
    assert_eq!(channels(fill), ["0", "128", "0"]);
    assert!(result.as_tree().expect("tree").tokens().all(|token| !token.is_splice()));
}

#[test]
fn test_joined_palette() {
    let frontend = paint_frontend();
    let palette = ["255,0,0", "0,255,0", "0,0,255"];
    let brush = HostValue::new(Image::new("brush.png"));

    let template = palette
        .iter()
        .map(|text| {
            Template::builder()
                .text("object { stroke: ")
                .tree(color(&frontend, text))
                .text(" fill: ")
                .host(brush.clone())
                .text(" }\n")
                .build()
        })
        .fold(Template::literal(""), |joined, object| joined.join(&object));
    assert_eq!(template.interpolations().len(), 2 * palette.len());
    assert_eq!(template.strings().len(), template.interpolations().len() + 1);

    let result = frontend.parse(&template, Some("start"), None).expect("parses");
    let objects = objects(&result);
    assert_eq!(objects.len(), palette.len());
    for (object, text) in objects.into_iter().zip(palette) {
        let (stroke, fill) = paints(object);
        assert_eq!(channels(stroke).join(","), text);
        assert_eq!(image_path(fill), Some("brush.png"));
    }
}

#[test]
fn test_mixed_multiline_document() {
    let frontend = paint_frontend();
    let gray = color(&frontend, "128,128,128");
    let template = Template::builder()
        .text("object {\n  stroke: 0,0,0\n  fill: ")
        .tree(gray.clone())
        .text("\n}\nobject {\n  stroke: ")
        .value(Image::new("a.png"))
        .text("\n  fill: 10,20,30\n}\nobject { stroke: ")
        .value(Image::new("b.png"))
        .text(" fill: ")
        .tree(gray)
        .text(" }\nobject { stroke: 1,2,3 fill: 4,5,6 }\nobject { stroke: ")
        .value(Image::new("c.png"))
        .text(" fill: ")
        .value(Image::new("d.png"))
        .text(" }")
        .build();
    let result = frontend.parse(&template, Some("start"), None).expect("parses");
    let kinds: Vec<_> = objects(&result)
        .into_iter()
        .map(|object| {
            let (stroke, fill) = paints(object);
            (stroke.data.to_string(), fill.data.to_string())
        })
        .collect();
    assert_eq!(
        kinds,
        [
            ("color".to_string(), "color".to_string()),
            ("image".to_string(), "color".to_string()),
            ("image".to_string(), "color".to_string()),
            ("color".to_string(), "color".to_string()),
            ("image".to_string(), "image".to_string()),
        ]
    );
}

#[test]
fn test_unknown_labels_cannot_be_spliced() {
    let frontend = paint_frontend();
    let circle = Tree::new("circle", vec![]);
    let template = Template::builder()
        .text("object { stroke: ")
        .tree(circle)
        .text(" fill: 0,0,0 }")
        .build();
    match frontend.parse(&template, Some("start"), None) {
        Err(err @ Error::Splice { .. }) => assert!(err.to_string().contains("circle")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_malformed_color() {
    let frontend = paint_frontend();
    let template = Template::literal("object { stroke: 255,0 fill: 0,0,0 }");
    let err = frontend.parse(&template, Some("start"), None).expect_err("two channels");
    match err.as_parse_error() {
        Some(ParseError::UnexpectedToken { expected, .. }) => {
            assert_eq!(expected, &["COMMA".to_string()]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_host_values_keep_their_identity() {
    let frontend = paint_frontend();
    let brush = HostValue::new(Image::new("brush.png"));
    let template = Template::builder()
        .text("object { stroke: ")
        .host(brush.clone())
        .text(" fill: ")
        .host(brush.clone())
        .text(" }")
        .build();
    let result = frontend.parse(&template, Some("start"), None).expect("parses");
    let (stroke, fill) = paints(objects(&result)[0]);
    for image in [stroke, fill] {
        let value = image.children[0]
            .as_token()
            .and_then(tessera::Token::host_value)
            .expect("host value");
        assert!(value.ptr_eq(&brush));
    }

    let other = HostValue::new(Image::new("brush.png"));
    assert!(!other.ptr_eq(&brush));
}

#[test]
fn test_static_template_parses_like_plain_text() {
    let frontend = paint_frontend();
    let text = "object { stroke: 1,2,3 fill: 4,5,6 }\nobject { stroke: 7,8,9 fill: 0,0,0 }";
    let from_template = frontend
        .parse(&Template::literal(text), Some("start"), None)
        .expect("parses");
    let from_text = frontend.parse(text, Some("start"), None).expect("parses");
    assert_eq!(from_template, from_text);
}
