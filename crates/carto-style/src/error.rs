//! Compilation errors
//!
//! Every error carries the location of the node that caused it. There is no
//! recovery: the first error aborts the whole stylesheet.

use carto_tree::{NodeKind, SourceLocation, ValueType};

/// Result alias used throughout the compiler
pub type StyleResult<T> = Result<T, StyleError>;

/// Binary operator named in type errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    Div,
    Negate,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mult => "*",
            Self::Div => "/",
            Self::Negate => "unary -",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Stylesheet compilation error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StyleError {
    #[error("Unknown variable: @{name} at {location}")]
    UndefinedVariable { name: String, location: SourceLocation },

    #[error("Cannot apply '{op}' to {lhs} and {rhs} at {location}")]
    TypeMismatch {
        op: Operator,
        lhs: ValueType,
        rhs: ValueType,
        location: SourceLocation,
    },

    #[error("Unknown function: {name}() at {location}")]
    UnknownFunction { name: String, location: SourceLocation },

    #[error("Invalid arguments to {function}(): {message} at {location}")]
    InvalidArgument {
        function: String,
        message: String,
        location: SourceLocation,
    },

    #[error("Unknown name: {name} at {location}")]
    InvalidSelectorName { name: String, location: SourceLocation },

    #[error("Unknown predicate '{kind}' at {location}")]
    UnknownPredicate { kind: NodeKind, location: SourceLocation },

    #[error("Invalid {context} node type: {kind} at {location}")]
    InvalidNodeKind {
        kind: NodeKind,
        context: &'static str,
        location: SourceLocation,
    },

    #[error("Malformed {kind} node: expected {expected} at {location}")]
    MalformedNode {
        kind: NodeKind,
        expected: &'static str,
        location: SourceLocation,
    },

    #[error("Generation error: {message} at {location}")]
    Generation { message: String, location: SourceLocation },
}

impl StyleError {
    /// Location of the offending node
    pub fn location(&self) -> &SourceLocation {
        match self {
            Self::UndefinedVariable { location, .. }
            | Self::TypeMismatch { location, .. }
            | Self::UnknownFunction { location, .. }
            | Self::InvalidArgument { location, .. }
            | Self::InvalidSelectorName { location, .. }
            | Self::UnknownPredicate { location, .. }
            | Self::InvalidNodeKind { location, .. }
            | Self::MalformedNode { location, .. }
            | Self::Generation { location, .. } => location,
        }
    }

    pub(crate) fn malformed(kind: NodeKind, expected: &'static str, location: &SourceLocation) -> Self {
        Self::MalformedNode {
            kind,
            expected,
            location: location.clone(),
        }
    }

    pub(crate) fn invalid_argument(
        function: &str,
        message: impl Into<String>,
        location: &SourceLocation,
    ) -> Self {
        Self::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
            location: location.clone(),
        }
    }
}
