use crate::lexer::{Span, Token, TokenValue};
use compact_str::CompactString;
use std::fmt;

/// A parse tree node.
///
/// Equality compares `data` and `children` only; `meta` is ignored.
#[derive(Debug, Clone)]
pub struct Tree {
    /// Rule name or alias that produced this node
    pub data: CompactString,
    pub children: Vec<Child>,
    /// Position covered by this node, when positions are propagated
    pub meta: Option<Span>,
}

/// A child of a [`Tree`]: a subtree or a token.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Tree(Tree),
    Token(Token),
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.children == other.children
    }
}

impl Tree {
    pub fn new(data: impl Into<CompactString>, children: Vec<Child>) -> Self {
        Self {
            data: data.into(),
            children,
            meta: None,
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Option<Span>) -> Self {
        self.meta = meta;
        self
    }

    /// Depth-first iteration, children before their parent.
    pub fn iter_subtrees(&self) -> impl Iterator<Item = &Tree> {
        let mut out = Vec::new();
        collect_postorder(self, &mut out);
        out.into_iter()
    }

    /// Depth-first iteration, parent before its children.
    pub fn iter_subtrees_topdown(&self) -> impl Iterator<Item = &Tree> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let tree = stack.pop()?;
            stack.extend(tree.children.iter().rev().filter_map(Child::as_tree));
            Some(tree)
        })
    }

    /// Every subtree labelled `data`, in top-down order.
    pub fn find_data<'a>(&'a self, data: &'a str) -> impl Iterator<Item = &'a Tree> + 'a {
        self.iter_subtrees_topdown().filter(move |tree| tree.data == data)
    }

    /// Every token anywhere below this node, left to right.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        let mut stack = vec![self.children.iter()];
        std::iter::from_fn(move || loop {
            match stack.last_mut()?.next() {
                Some(Child::Token(token)) => return Some(token),
                Some(Child::Tree(tree)) => stack.push(tree.children.iter()),
                None => {
                    stack.pop();
                }
            }
        })
    }

    /// Multi-line indented rendering.
    #[must_use]
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(0, &mut out);
        out
    }

    fn write_pretty(&self, level: usize, out: &mut String) {
        let indent = "  ".repeat(level);
        if let [Child::Token(token)] = self.children.as_slice() {
            out.push_str(&format!("{indent}{}\t{}\n", self.data, token));
            return;
        }
        out.push_str(&format!("{indent}{}\n", self.data));
        for child in &self.children {
            match child {
                Child::Tree(tree) => tree.write_pretty(level + 1, out),
                Child::Token(token) => out.push_str(&format!("{indent}  {token}\n")),
            }
        }
    }
}

fn collect_postorder<'a>(tree: &'a Tree, out: &mut Vec<&'a Tree>) {
    for child in &tree.children {
        if let Child::Tree(sub) = child {
            collect_postorder(sub, out);
        }
    }
    out.push(tree);
}

impl Child {
    #[must_use]
    pub const fn as_tree(&self) -> Option<&Tree> {
        match self {
            Self::Tree(tree) => Some(tree),
            Self::Token(_) => None,
        }
    }

    #[must_use]
    pub const fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            Self::Tree(_) => None,
        }
    }

    #[must_use]
    pub fn into_tree(self) -> Option<Tree> {
        match self {
            Self::Tree(tree) => Some(tree),
            Self::Token(_) => None,
        }
    }

    #[must_use]
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Tree(tree) => tree.meta,
            Self::Token(token) => token.span,
        }
    }
}

impl From<Tree> for Child {
    fn from(tree: Tree) -> Self {
        Self::Tree(tree)
    }
}

impl From<Token> for Child {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tree('{}', [", self.data)?;
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{child}")?;
        }
        f.write_str("])")
    }
}

impl fmt::Display for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(tree) => write!(f, "{tree}"),
            Self::Token(token) => match &token.value {
                TokenValue::Text(text) => write!(f, "Token('{}', '{}')", token.kind, text),
                _ => write!(f, "Token('{}', {})", token.kind, token.describe()),
            },
        }
    }
}
