//! Semantic node kinds
//!
//! Every node of the annotated tree is tagged with one of these by the parser.

use std::fmt;

/// Semantic kind of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum NodeKind {
    // Statements
    Stylesheet,
    Variable,
    MapStyle,
    Style,
    Mixin,
    Comment,
    Attribute,

    // Selectors
    Selector,
    Filter,
    FilterEq,
    FilterLt,
    FilterLe,
    FilterGt,
    FilterGe,
    FilterNeq,

    // Expressions
    Expression,
    Add,
    Sub,
    Mult,
    Div,
    Negate,
    Function,

    // Literals
    Color,
    Number,
    String,
    Keyword,
    Boolean,
    List,
    Nil,
}

impl NodeKind {
    /// Name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stylesheet => "stylesheet",
            Self::Variable => "variable",
            Self::MapStyle => "map-style",
            Self::Style => "style",
            Self::Mixin => "mixin",
            Self::Comment => "comment",
            Self::Attribute => "attribute",
            Self::Selector => "selector",
            Self::Filter => "filter",
            Self::FilterEq => "filter-eq",
            Self::FilterLt => "filter-lt",
            Self::FilterLe => "filter-le",
            Self::FilterGt => "filter-gt",
            Self::FilterGe => "filter-ge",
            Self::FilterNeq => "filter-neq",
            Self::Expression => "expression",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mult => "mult",
            Self::Div => "div",
            Self::Negate => "negate",
            Self::Function => "function",
            Self::Color => "color",
            Self::Number => "number",
            Self::String => "string",
            Self::Keyword => "keyword",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Nil => "nil",
        }
    }

    /// Whether this is one of the filter clause kinds
    pub fn is_filter_clause(&self) -> bool {
        matches!(
            self,
            Self::FilterEq
                | Self::FilterLt
                | Self::FilterLe
                | Self::FilterGt
                | Self::FilterGe
                | Self::FilterNeq
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
