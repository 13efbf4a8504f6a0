use crate::frontend::FrontendOptions;
use crate::grammar::{Callback, Rule};
use crate::lexer::Span;
use crate::syntax::{Child, Tree};
use crate::HashMap;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::sync::Arc;

/// What to do with the child produced for one expansion symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Keep,
    Drop,
    /// Splice the children of an `_rule` subtree into the parent
    Inline,
}

/// Produces the per-rule callbacks that turn backend derivations into trees.
///
/// Each callback drops filtered tokens (unless the rule keeps every token),
/// inlines `_rule` subtrees, collapses single-child `?rule` nodes, labels the
/// node with the rule's alias or origin, and optionally records positions.
/// A user callback registered under the rule's label replaces the default
/// tree construction and receives the prepared children.
#[derive(Clone, Default)]
pub struct ParseTreeBuilder {
    propagate_positions: bool,
    keep_all_tokens: bool,
    user_callbacks: HashMap<CompactString, Callback>,
}

impl ParseTreeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_options(options: &FrontendOptions) -> Self {
        Self {
            propagate_positions: options.propagate_positions,
            keep_all_tokens: options.keep_all_tokens,
            user_callbacks: options.callbacks.clone(),
        }
    }

    #[must_use]
    pub fn with_propagate_positions(mut self, enabled: bool) -> Self {
        self.propagate_positions = enabled;
        self
    }

    #[must_use]
    pub fn with_keep_all_tokens(mut self, enabled: bool) -> Self {
        self.keep_all_tokens = enabled;
        self
    }

    #[must_use]
    pub fn with_callback(mut self, label: impl Into<CompactString>, callback: Callback) -> Self {
        self.user_callbacks.insert(label.into(), callback);
        self
    }

    #[must_use]
    pub fn create_callbacks(&self, rules: &[Rule]) -> HashMap<Rule, Callback> {
        rules
            .iter()
            .map(|rule| (rule.clone(), self.callback_for(rule)))
            .collect()
    }

    fn callback_for(&self, rule: &Rule) -> Callback {
        let keep_all = self.keep_all_tokens || rule.options.keep_all_tokens;
        let slots: SmallVec<[Slot; 8]> = rule
            .expansion
            .iter()
            .map(|symbol| {
                if symbol.is_terminal() {
                    if symbol.filter_out() && !keep_all {
                        Slot::Drop
                    } else {
                        Slot::Keep
                    }
                } else if symbol.name().starts_with('_') {
                    Slot::Inline
                } else {
                    Slot::Keep
                }
            })
            .collect();
        let label = rule.label().clone();
        let expand1 = rule.options.expand1;
        let propagate = self.propagate_positions;
        let user = self.user_callbacks.get(&label).cloned();

        Arc::new(move |children: Vec<Child>| {
            let span = if propagate { cover(&children) } else { None };
            let mut kept = Vec::with_capacity(children.len());
            for (i, child) in children.into_iter().enumerate() {
                match (slots.get(i).copied().unwrap_or(Slot::Keep), child) {
                    (Slot::Drop, _) => {}
                    (Slot::Inline, Child::Tree(tree)) if tree.data.starts_with('_') => {
                        kept.extend(tree.children);
                    }
                    (_, child) => kept.push(child),
                }
            }

            if let Some(user) = &user {
                return user(kept);
            }
            if expand1 && kept.len() == 1 {
                if let Some(only) = kept.pop() {
                    return only;
                }
            }
            Child::Tree(Tree::new(label.clone(), kept).with_meta(span))
        })
    }
}

/// Span covering every positioned child, if any has a position.
fn cover(children: &[Child]) -> Option<Span> {
    children
        .iter()
        .filter_map(Child::span)
        .reduce(Span::cover)
}

impl std::fmt::Debug for ParseTreeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseTreeBuilder")
            .field("propagate_positions", &self.propagate_positions)
            .field("keep_all_tokens", &self.keep_all_tokens)
            .field("user_callbacks", &self.user_callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{RuleOptions, Symbol};
    use crate::lexer::Token;

    fn build(builder: &ParseTreeBuilder, rule: &Rule, children: Vec<Child>) -> Child {
        let callbacks = builder.create_callbacks(std::slice::from_ref(rule));
        callbacks[rule](children)
    }

    #[test]
    fn test_filters_anonymous_tokens() {
        let rule = Rule::new(
            "pair",
            vec![Symbol::filtered_terminal("LPAR"), Symbol::terminal("NAME")],
            0,
        );
        let out = build(
            &ParseTreeBuilder::new(),
            &rule,
            vec![Token::new("LPAR", "(").into(), Token::new("NAME", "x").into()],
        );
        assert_eq!(out, Child::Tree(Tree::new("pair", vec![Token::new("NAME", "x").into()])));

        let out = build(
            &ParseTreeBuilder::new().with_keep_all_tokens(true),
            &rule,
            vec![Token::new("LPAR", "(").into(), Token::new("NAME", "x").into()],
        );
        assert_eq!(out.as_tree().map(|t| t.children.len()), Some(2));
    }

    #[test]
    fn test_inlines_underscore_rules() {
        let rule = Rule::new("list", vec![Symbol::non_terminal("_items")], 0);
        let inner = Tree::new("_items", vec![Token::new("A", "a").into(), Token::new("A", "b").into()]);
        let out = build(&ParseTreeBuilder::new(), &rule, vec![inner.into()]);
        assert_eq!(out.as_tree().map(|t| t.children.len()), Some(2));
    }

    #[test]
    fn test_expand1_and_alias() {
        let rule = Rule::new("value", vec![Symbol::non_terminal("number")], 0)
            .with_options(RuleOptions::new().with_expand1(true));
        let number = Tree::new("number", vec![]);
        assert_eq!(build(&ParseTreeBuilder::new(), &rule, vec![number.clone().into()]), Child::Tree(number));

        let aliased = Rule::new("value", vec![Symbol::terminal("N")], 1).with_alias(Some("num".into()));
        let out = build(&ParseTreeBuilder::new(), &aliased, vec![Token::new("N", "1").into()]);
        assert_eq!(out.as_tree().map(|t| t.data.as_str()), Some("num"));
    }

    #[test]
    fn test_user_callback_by_label() {
        let rule = Rule::new("number", vec![Symbol::terminal("N")], 0);
        let builder = ParseTreeBuilder::new().with_callback(
            "number",
            Arc::new(|mut children: Vec<Child>| children.remove(0)),
        );
        let out = build(&builder, &rule, vec![Token::new("N", "7").into()]);
        assert_eq!(out, Child::Token(Token::new("N", "7")));
    }

    #[test]
    fn test_propagates_positions() {
        let rule = Rule::new("pair", vec![Symbol::terminal("A"), Symbol::terminal("B")], 0);
        let a = Token::new("A", "a").with_span(Some(Span {
            start_pos: 0,
            line: 1,
            column: 1,
            end_pos: 1,
            end_line: 1,
            end_column: 2,
        }));
        let b = Token::new("B", "b").with_span(Some(Span {
            start_pos: 2,
            line: 1,
            column: 3,
            end_pos: 3,
            end_line: 1,
            end_column: 4,
        }));
        let out = build(
            &ParseTreeBuilder::new().with_propagate_positions(true),
            &rule,
            vec![a.into(), b.into()],
        );
        let meta = out.as_tree().and_then(|t| t.meta).expect("meta is propagated");
        assert_eq!((meta.start_pos, meta.end_pos, meta.end_column), (0, 3, 4));
    }
}
