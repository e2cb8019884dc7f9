//! Carto Style Compiler Core
//!
//! Turns an annotated carto syntax tree into a cascaded [`Stylesheet`]:
//! variable scoping, typed expression evaluation, selector specificity and
//! cascade resolution.

mod builder;
mod cascade;
mod env;
mod error;
mod eval;
mod functions;
mod rule;
mod selectors;
mod visitor;

pub use builder::StylesheetBuilder;
pub use cascade::{can_inherit, cascade, CascadeMode};
pub use env::StyleEnv;
pub use error::{Operator, StyleError, StyleResult};
pub use eval::{fix_color_range, Expression, RawColor};
pub use functions::{BuiltinFn, FunctionCall, FunctionRegistry};
pub use rule::{Rule, RuleSet, Specificity, StyleGroup, Stylesheet};
pub use selectors::{AttachmentSelector, FilterSelector, FilterSet, NameSelector, Predicate};
pub use visitor::{Dumper, StylesheetVisitor};

use carto_tree::Node;

/// Compile a stylesheet tree with default settings
pub fn parse_stylesheet(tree: &Node) -> StyleResult<Stylesheet> {
    StylesheetBuilder::new().parse_stylesheet(tree, StyleEnv::new())
}
