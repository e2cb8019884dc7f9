//! Carto Annotated Syntax Tree
//!
//! The input interface of the style compiler. A parser for the styling
//! language produces a tree of [`Node`]s, each tagged with a semantic
//! [`NodeKind`] and a [`SourceLocation`]; the compiler consumes it.

mod color;
mod kind;
mod location;
mod node;
mod value;

pub use color::{Color, Hsla};
pub use kind::NodeKind;
pub use location::SourceLocation;
pub use node::{Node, Payload};
pub use value::{Value, ValueType};
