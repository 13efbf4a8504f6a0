//! # Syntax Trees
//!
//! Parse trees ([`Tree`], [`Child`]), the callbacks that build them from
//! backend derivations ([`ParseTreeBuilder`]), and line/column tracking.

pub mod builder;
pub mod line_col;
pub mod tree;

pub use builder::ParseTreeBuilder;
pub use line_col::{offset_to_span, LineCounter};
pub use tree::{Child, Tree};
