//! Annotated tree nodes
//!
//! A [`Node`] pairs a payload with its semantic kind and source location, so
//! the compiler never has to consult a side table to learn what a value means
//! or where it came from.

use crate::{Color, NodeKind, SourceLocation, Value};

/// Node payload: a leaf value or a list of children
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    Leaf(Value),
    Branch(Vec<Node>),
}

/// A node of the annotated syntax tree
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    kind: NodeKind,
    location: SourceLocation,
    payload: Payload,
}

impl Node {
    pub fn leaf(kind: NodeKind, value: impl Into<Value>) -> Self {
        Self {
            kind,
            location: SourceLocation::default(),
            payload: Payload::Leaf(value.into()),
        }
    }

    pub fn branch(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            location: SourceLocation::default(),
            payload: Payload::Branch(children),
        }
    }

    /// Replace this node's location
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Leaf value, `None` for branches
    pub fn value(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Leaf(value) => Some(value),
            Payload::Branch(_) => None,
        }
    }

    /// Children, empty for leaves
    pub fn children(&self) -> &[Node] {
        match &self.payload {
            Payload::Leaf(_) => &[],
            Payload::Branch(children) => children,
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children().get(index)
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.payload, Payload::Branch(_))
    }

    /// A nil leaf marks an absent optional part
    pub fn is_nil(&self) -> bool {
        matches!(&self.payload, Payload::Leaf(Value::Nil))
    }

    /// String content of a leaf
    pub fn as_str(&self) -> Option<&str> {
        self.value().and_then(Value::as_str)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.value().and_then(Value::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value().and_then(Value::as_bool)
    }

    pub fn as_color(&self) -> Option<Color> {
        self.value().and_then(Value::as_color)
    }

    // Literals

    pub fn nil() -> Self {
        Self::leaf(NodeKind::Nil, Value::Nil)
    }

    pub fn number(n: f64) -> Self {
        Self::leaf(NodeKind::Number, Value::Double(n))
    }

    pub fn integer(n: i64) -> Self {
        Self::leaf(NodeKind::Number, Value::Int(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::leaf(NodeKind::String, Value::Str(s.into()))
    }

    pub fn keyword(s: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Keyword, Value::Str(s.into()))
    }

    pub fn boolean(b: bool) -> Self {
        Self::leaf(NodeKind::Boolean, Value::Bool(b))
    }

    pub fn color(c: Color) -> Self {
        Self::leaf(NodeKind::Color, Value::Color(c))
    }

    pub fn list(items: Vec<Node>) -> Self {
        Self::branch(NodeKind::List, items)
    }

    /// Literal node for an already computed value
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Nil => Self::nil(),
            Value::Bool(b) => Self::boolean(b),
            Value::Int(_) | Value::Double(_) => Self::leaf(NodeKind::Number, value),
            Value::Str(s) => Self::string(s),
            Value::Color(c) => Self::color(c),
            Value::List(items) => Self::list(items.into_iter().map(Self::from_value).collect()),
        }
    }

    // Expressions

    /// `@name` reference
    pub fn var_ref(name: impl Into<String>) -> Self {
        Self::branch(NodeKind::Variable, vec![Self::string(name)])
    }

    pub fn expression(inner: Node) -> Self {
        Self::branch(NodeKind::Expression, vec![inner])
    }

    pub fn binary(kind: NodeKind, lhs: Node, rhs: Node) -> Self {
        Self::branch(kind, vec![lhs, rhs])
    }

    pub fn add(lhs: Node, rhs: Node) -> Self {
        Self::binary(NodeKind::Add, lhs, rhs)
    }

    pub fn sub(lhs: Node, rhs: Node) -> Self {
        Self::binary(NodeKind::Sub, lhs, rhs)
    }

    pub fn mult(lhs: Node, rhs: Node) -> Self {
        Self::binary(NodeKind::Mult, lhs, rhs)
    }

    pub fn div(lhs: Node, rhs: Node) -> Self {
        Self::binary(NodeKind::Div, lhs, rhs)
    }

    pub fn negate(operand: Node) -> Self {
        Self::branch(NodeKind::Negate, vec![operand])
    }

    pub fn call(name: impl Into<String>, args: Vec<Node>) -> Self {
        let mut children = Vec::with_capacity(args.len() + 1);
        children.push(Self::string(name));
        children.extend(args);
        Self::branch(NodeKind::Function, children)
    }

    // Statements

    /// `@name: value;`
    pub fn variable(name: impl Into<String>, value: Node) -> Self {
        Self::branch(NodeKind::Variable, vec![Self::string(name), value])
    }

    /// `key: value;`
    pub fn attribute(key: impl Into<String>, value: Node) -> Self {
        Self::branch(NodeKind::Attribute, vec![Self::string(key), value])
    }

    /// `Map { ... }` block of attribute entries
    pub fn map_style(entries: Vec<Node>) -> Self {
        Self::branch(NodeKind::MapStyle, entries)
    }

    /// One selector of a style's selector group
    pub fn selector(name: Option<&str>, attachment: Option<&str>, filters: Option<Node>) -> Self {
        Self::branch(
            NodeKind::Selector,
            vec![
                name.map(Self::string).unwrap_or_else(Self::nil),
                attachment.map(Self::string).unwrap_or_else(Self::nil),
                filters.unwrap_or_else(Self::nil),
            ],
        )
    }

    /// Filter group of a selector
    pub fn filters(clauses: Vec<Node>) -> Self {
        Self::branch(NodeKind::Filter, clauses)
    }

    /// `[key <op> value]` clause; `kind` is one of the filter clause kinds
    pub fn filter(kind: NodeKind, key: impl Into<String>, value: Node) -> Self {
        Self::branch(kind, vec![Self::string(key), value])
    }

    /// Style block: a selector group and a body
    pub fn style(selectors: Vec<Node>, body: Vec<Node>) -> Self {
        Self::branch(NodeKind::Style, vec![Self::list(selectors), Self::list(body)])
    }

    pub fn mixin(name: impl Into<String>, body: Vec<Node>) -> Self {
        Self::branch(NodeKind::Mixin, vec![Self::string(name), Self::list(body)])
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Comment, Value::Str(text.into()))
    }

    pub fn stylesheet(statements: Vec<Node>) -> Self {
        Self::branch(NodeKind::Stylesheet, statements)
    }
}
