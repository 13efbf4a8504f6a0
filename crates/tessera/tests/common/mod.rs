#![allow(dead_code)]

use tessera::{Child, Grammar, GrammarBuilder};

/// Left-associative arithmetic over `+`, `-` and `*` with parentheses.
///
/// Every rule collapses single children, so a tree holds only `add`, `sub`
/// and `mul` nodes over `NUMBER` tokens.
pub fn calculator() -> Grammar {
    GrammarBuilder::new()
        .regex("NUMBER", r"\d+")
        .regex("WS", " +")
        .ignore("WS")
        .rule("?sum", ["product"])
        .alias("?sum", ["sum", "\"+\"", "product"], "add")
        .alias("?sum", ["sum", "\"-\"", "product"], "sub")
        .rule("?product", ["atom"])
        .alias("?product", ["product", "\"*\"", "atom"], "mul")
        .rule("?atom", ["NUMBER"])
        .rule("?atom", ["\"(\"", "sum", "\")\""])
        .start("sum")
        .build()
        .expect("valid grammar")
}

/// Value of a calculator tree, with wrapping arithmetic.
pub fn evaluate(node: &Child) -> i64 {
    match node {
        Child::Token(token) => token.text().and_then(|text| text.parse().ok()).unwrap_or_default(),
        Child::Tree(tree) => {
            let left = evaluate(&tree.children[0]);
            let right = evaluate(&tree.children[1]);
            match tree.data.as_str() {
                "add" => left.wrapping_add(right),
                "sub" => left.wrapping_sub(right),
                "mul" => left.wrapping_mul(right),
                other => panic!("unexpected node {other}"),
            }
        }
    }
}

/// `start: _items`, where each item is a `NAME` followed by `;`.
pub fn statements() -> Grammar {
    GrammarBuilder::new()
        .regex("NAME", "[a-z]+")
        .regex("WS", r"\s+")
        .ignore("WS")
        .rule("start", ["_items"])
        .rule("_items", ["item"])
        .rule("_items", ["_items", "item"])
        .rule("item", ["NAME", "\";\""])
        .build()
        .expect("valid grammar")
}

/// Texts of the `NAME` tokens of every `item` in a statements tree.
pub fn item_names(result: &Child) -> Vec<String> {
    result
        .as_tree()
        .map(|tree| {
            tree.find_data("item")
                .flat_map(|item| item.tokens())
                .filter_map(|token| token.text().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
