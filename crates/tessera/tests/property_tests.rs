//! Property-based tests across the parsing backends
//!
//! Random arithmetic is parsed by every algorithm; the trees must agree and
//! evaluate to the value computed directly from the generated expression.

mod common;

use common::{calculator, evaluate};
use proptest::prelude::*;
use tessera::{Algorithm, Frontend, FrontendOptions, LexerKind, Template};

#[derive(Debug, Clone)]
enum Expr {
    Number(i64),
    Binary(Box<Expr>, char, Box<Expr>),
}

impl Expr {
    fn value(&self) -> i64 {
        match self {
            Self::Number(n) => *n,
            Self::Binary(left, op, right) => {
                let (left, right) = (left.value(), right.value());
                match op {
                    '+' => left.wrapping_add(right),
                    '-' => left.wrapping_sub(right),
                    _ => left.wrapping_mul(right),
                }
            }
        }
    }

    /// Fully parenthesized, so the grouping never depends on precedence.
    fn render(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Binary(left, op, right) => format!("({} {op} {})", left.render(), right.render()),
        }
    }
}

fn expr() -> impl Strategy<Value = Expr> {
    let leaf = (0_i64..1000).prop_map(Expr::Number);
    leaf.prop_recursive(4, 16, 2, |inner| {
        (inner.clone(), prop::sample::select(vec!['+', '-', '*']), inner)
            .prop_map(|(left, op, right)| Expr::Binary(Box::new(left), op, Box::new(right)))
    })
}

/// A flat operator chain such as `3 + 4 * 2 - 1`.
fn chain() -> impl Strategy<Value = (i64, Vec<(char, i64)>)> {
    (
        0_i64..100,
        prop::collection::vec((prop::sample::select(vec!['+', '-', '*']), 0_i64..100), 0..8),
    )
}

fn chain_text(first: i64, rest: &[(char, i64)]) -> String {
    rest.iter()
        .fold(first.to_string(), |text, (op, n)| format!("{text} {op} {n}"))
}

/// Products bind tighter than sums; both group to the left.
fn chain_value(first: i64, rest: &[(char, i64)]) -> i64 {
    let mut total = 0_i64;
    let mut sign = 1_i64;
    let mut product = first;
    for &(op, n) in rest {
        match op {
            '*' => product = product.wrapping_mul(n),
            _ => {
                total = total.wrapping_add(sign.wrapping_mul(product));
                sign = if op == '+' { 1 } else { -1 };
                product = n;
            }
        }
    }
    total.wrapping_add(sign.wrapping_mul(product))
}

fn frontends() -> Vec<(Algorithm, Frontend)> {
    let grammar = calculator();
    [
        (Algorithm::Lalr, LexerKind::Contextual),
        (Algorithm::Earley, LexerKind::Basic),
        (Algorithm::Cyk, LexerKind::Basic),
    ]
    .into_iter()
    .map(|(algorithm, lexer)| {
        let frontend = grammar
            .frontend(algorithm, lexer, FrontendOptions::default())
            .expect("valid frontend");
        (algorithm, frontend)
    })
    .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn backends_agree_on_nested_expressions(expr in expr()) {
        let text = expr.render();
        let frontends = frontends();
        let (_, reference) = &frontends[0];
        let expected = reference.parse(text.as_str(), None, None).expect("parses");
        prop_assert_eq!(evaluate(&expected), expr.value());
        for (algorithm, frontend) in &frontends[1..] {
            let result = frontend.parse(text.as_str(), None, None).expect("parses");
            prop_assert_eq!(&result, &expected, "{}: {}", algorithm, text);
        }
    }

    #[test]
    fn backends_respect_precedence((first, rest) in chain()) {
        let text = chain_text(first, &rest);
        for (algorithm, frontend) in frontends() {
            let result = frontend.parse(text.as_str(), None, None).expect("parses");
            prop_assert_eq!(evaluate(&result), chain_value(first, &rest), "{}: {}", algorithm, text);
        }
    }

    #[test]
    fn literal_templates_parse_like_text((first, rest) in chain()) {
        let text = chain_text(first, &rest);
        let frontend = calculator()
            .frontend(Algorithm::Earley, LexerKind::Template, FrontendOptions::default())
            .expect("template frontend");
        let from_template = frontend.parse(&Template::literal(text.as_str()), None, None).expect("parses");
        let from_text = frontend.parse(text.as_str(), None, None).expect("parses");
        prop_assert_eq!(from_template, from_text);
    }

    #[test]
    fn joined_templates_keep_their_parts(
        left in prop::collection::vec("[a-z ]{0,4}", 1..5),
        right in prop::collection::vec("[a-z ]{0,4}", 1..5),
    ) {
        let build = |parts: &[String]| {
            let (last, init) = parts.split_last().expect("non-empty");
            init.iter()
                .enumerate()
                .fold(Template::builder(), |builder, (index, text)| builder.text(text).value(index))
                .text(last)
                .build()
        };
        let (left_template, right_template) = (build(&left), build(&right));
        let joined = left_template.join(&right_template);

        prop_assert_eq!(
            joined.interpolations().len(),
            left_template.interpolations().len() + right_template.interpolations().len()
        );
        prop_assert_eq!(joined.strings().len(), joined.interpolations().len() + 1);
        prop_assert_eq!(joined.strings().concat(), format!("{}{}", left.concat(), right.concat()));
    }
}
