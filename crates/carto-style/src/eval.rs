//! Expression Evaluator
//!
//! Reduces an expression subtree to a single [`Value`]:
//! 1. Literals evaluate to themselves (colors are recognised by node kind)
//! 2. Variable references are resolved through the [`StyleEnv`] chain
//! 3. Arithmetic is overloaded over numbers and colors
//! 4. Function calls dispatch through the [`FunctionRegistry`]
//!
//! Color arithmetic runs on unclamped floating point channels and is only
//! normalized into a [`Color`] when the whole expression has been reduced.

use carto_tree::{Color, Node, NodeKind, SourceLocation, Value, ValueType};

use crate::env::StyleEnv;
use crate::error::{Operator, StyleError, StyleResult};
use crate::functions::{FunctionCall, FunctionRegistry};

/// Color with channels that may temporarily leave `[0, 255]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl RawColor {
    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
            a: f(self.a),
        }
    }

    fn zip(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            r: f(self.r, other.r),
            g: f(self.g, other.g),
            b: f(self.b, other.b),
            a: f(self.a, other.a),
        }
    }
}

impl From<Color> for RawColor {
    fn from(c: Color) -> Self {
        Self {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

/// Round each channel and clamp it into `[0, 255]`; NaN becomes 0
pub fn fix_color_range(raw: RawColor) -> Color {
    let fix = |v: f64| if v.is_nan() { 0 } else { v.round().clamp(0.0, 255.0) as u8 };
    Color::rgba(fix(raw.r), fix(raw.g), fix(raw.b), fix(raw.a))
}

/// Intermediate result while an expression is being reduced
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Value(Value),
    Color(RawColor),
}

impl Operand {
    fn value_type(&self) -> ValueType {
        match self {
            Self::Value(v) => v.value_type(),
            Self::Color(_) => ValueType::Color,
        }
    }

    fn finish(self) -> Value {
        match self {
            Self::Value(v) => v,
            Self::Color(raw) => Value::Color(fix_color_range(raw)),
        }
    }
}

/// Arithmetic view of an operand
enum Arith {
    Number(f64),
    Color(RawColor),
}

impl Arith {
    fn of(operand: &Operand) -> Option<Self> {
        match operand {
            Operand::Color(raw) => Some(Self::Color(*raw)),
            Operand::Value(Value::Color(c)) => Some(Self::Color(RawColor::from(*c))),
            Operand::Value(v) => v.as_f64().map(Self::Number),
        }
    }
}

/// Evaluates expression subtrees against an environment
pub struct Expression<'a> {
    functions: &'a FunctionRegistry,
    /// Bindings currently being resolved with their defining frames,
    /// innermost last. Frames are compared by address only.
    resolving: Vec<(String, *const StyleEnv)>,
}

impl<'a> Expression<'a> {
    pub fn new(functions: &'a FunctionRegistry) -> Self {
        Self {
            functions,
            resolving: Vec::new(),
        }
    }

    /// Semantic kind of a node
    pub fn get_node_type(&self, node: &Node) -> NodeKind {
        node.kind()
    }

    pub fn get_location<'n>(&self, node: &'n Node) -> &'n SourceLocation {
        node.location()
    }

    /// Color test by annotated kind; a plain number or string inside a color
    /// literal only means a color because the grammar said so
    pub fn is_color(&self, node: &Node) -> bool {
        node.kind() == NodeKind::Color || matches!(node.value(), Some(Value::Color(_)))
    }

    pub fn is_double(&self, node: &Node) -> bool {
        matches!(node.value(), Some(Value::Double(_)))
    }

    /// Evaluate `node` to a fully resolved value
    pub fn eval(&mut self, node: &Node, env: &StyleEnv) -> StyleResult<Value> {
        Ok(self.eval_node(node, env)?.finish())
    }

    fn eval_node(&mut self, node: &Node, env: &StyleEnv) -> StyleResult<Operand> {
        match node.kind() {
            NodeKind::Expression => match node.children() {
                [inner] => self.eval_node(inner, env),
                _ => Err(StyleError::malformed(node.kind(), "one operand", node.location())),
            },
            NodeKind::Variable => self.eval_var(node, env).map(Operand::Value),
            NodeKind::Add => self.eval_binary(Operator::Add, node, env),
            NodeKind::Sub => self.eval_binary(Operator::Sub, node, env),
            NodeKind::Mult => self.eval_binary(Operator::Mult, node, env),
            NodeKind::Div => self.eval_binary(Operator::Div, node, env),
            NodeKind::Negate => self.eval_negate(node, env),
            NodeKind::Function => self.eval_function(node, env).map(Operand::Value),
            NodeKind::List => {
                let items = node
                    .children()
                    .iter()
                    .map(|item| self.eval(item, env))
                    .collect::<StyleResult<Vec<_>>>()?;
                Ok(Operand::Value(Value::List(items)))
            }
            _ if self.is_color(node) => self.eval_color(node).map(Operand::Color),
            _ => match node.value() {
                Some(value) => Ok(Operand::Value(value.clone())),
                None => Err(StyleError::InvalidNodeKind {
                    kind: node.kind(),
                    context: "expression",
                    location: node.location().clone(),
                }),
            },
        }
    }

    /// Resolve a variable reference, following references to other variables
    /// until a value is reached
    pub fn eval_var(&mut self, node: &Node, env: &StyleEnv) -> StyleResult<Value> {
        let name = node
            .child(0)
            .and_then(Node::as_str)
            .ok_or_else(|| StyleError::malformed(node.kind(), "a variable name", node.location()))?;

        let undefined = || StyleError::UndefinedVariable {
            name: name.to_string(),
            location: node.location().clone(),
        };

        let mut found = env.lookup_binding(name);
        // Inside its own definition a name means the enclosing scope's binding
        if let (Some((_, scope)), Some((current, frame))) = (found, self.resolving.last()) {
            if current == name && std::ptr::eq(scope, *frame) {
                found = scope.parent().and_then(|parent| parent.lookup_binding(name));
            }
        }
        let (bound, scope) = found.ok_or_else(undefined)?;

        if let Some(value) = scope.cached(name) {
            return Ok(value);
        }
        // A binding already on the chain never reaches a terminal value
        if self.is_resolving(name, scope) {
            return Err(undefined());
        }

        let value = self.eval_binding(name, bound, scope)?;
        scope.cache(name, value.clone());
        Ok(value)
    }

    /// Evaluate `value` as the definition of `name` in frame `scope`
    pub fn eval_binding(&mut self, name: &str, value: &Node, scope: &StyleEnv) -> StyleResult<Value> {
        self.resolving.push((name.to_string(), scope as *const StyleEnv));
        let result = self.eval(value, scope);
        self.resolving.pop();
        result
    }

    fn is_resolving(&self, name: &str, scope: &StyleEnv) -> bool {
        self.resolving
            .iter()
            .any(|(n, frame)| n == name && std::ptr::eq(scope, *frame))
    }

    /// Call a built-in function
    pub fn eval_function(&mut self, node: &Node, env: &StyleEnv) -> StyleResult<Value> {
        let (name_node, arg_nodes) = node
            .children()
            .split_first()
            .ok_or_else(|| StyleError::malformed(node.kind(), "a function name", node.location()))?;
        let name = name_node
            .as_str()
            .ok_or_else(|| StyleError::malformed(node.kind(), "a function name", node.location()))?;

        let function = self.functions.get(name).ok_or_else(|| StyleError::UnknownFunction {
            name: name.to_string(),
            location: node.location().clone(),
        })?;

        let args = arg_nodes
            .iter()
            .map(|arg| self.eval(arg, env))
            .collect::<StyleResult<Vec<_>>>()?;

        function(&FunctionCall {
            name,
            args: &args,
            location: node.location(),
        })
    }

    fn eval_binary(&mut self, op: Operator, node: &Node, env: &StyleEnv) -> StyleResult<Operand> {
        let [lhs, rhs] = node.children() else {
            return Err(StyleError::malformed(node.kind(), "two operands", node.location()));
        };
        let lhs = self.eval_node(lhs, env)?;
        let rhs = self.eval_node(rhs, env)?;

        match op {
            Operator::Add => self.eval_add(lhs, rhs, node.location()),
            Operator::Sub => self.eval_sub(lhs, rhs, node.location()),
            Operator::Mult => self.eval_mult(lhs, rhs, node.location()),
            _ => self.eval_div(lhs, rhs, node.location()),
        }
    }

    fn eval_add(&self, lhs: Operand, rhs: Operand, location: &SourceLocation) -> StyleResult<Operand> {
        arithmetic(Operator::Add, lhs, rhs, location, |a, b| a + b)
    }

    fn eval_sub(&self, lhs: Operand, rhs: Operand, location: &SourceLocation) -> StyleResult<Operand> {
        arithmetic(Operator::Sub, lhs, rhs, location, |a, b| a - b)
    }

    fn eval_mult(&self, lhs: Operand, rhs: Operand, location: &SourceLocation) -> StyleResult<Operand> {
        arithmetic(Operator::Mult, lhs, rhs, location, |a, b| a * b)
    }

    fn eval_div(&self, lhs: Operand, rhs: Operand, location: &SourceLocation) -> StyleResult<Operand> {
        arithmetic(Operator::Div, lhs, rhs, location, |a, b| a / b)
    }

    fn eval_negate(&mut self, node: &Node, env: &StyleEnv) -> StyleResult<Operand> {
        let [operand] = node.children() else {
            return Err(StyleError::malformed(node.kind(), "one operand", node.location()));
        };
        let operand = self.eval_node(operand, env)?;
        match Arith::of(&operand) {
            Some(Arith::Number(n)) => Ok(Operand::Value(Value::Double(-n))),
            _ => Err(StyleError::TypeMismatch {
                op: Operator::Negate,
                lhs: operand.value_type(),
                rhs: ValueType::Nil,
                location: node.location().clone(),
            }),
        }
    }

    /// Interpret a node the grammar marked as a color literal
    fn eval_color(&self, node: &Node) -> StyleResult<RawColor> {
        let malformed = || StyleError::malformed(node.kind(), "a color", node.location());
        match node.value() {
            Some(Value::Color(c)) => Ok(RawColor::from(*c)),
            Some(Value::Str(s)) => Color::from_hex(s)
                .or_else(|| Color::from_name(s))
                .map(RawColor::from)
                .ok_or_else(malformed),
            Some(_) => Err(malformed()),
            None => {
                // rgb[a] channel list
                let channels = node
                    .children()
                    .iter()
                    .map(Node::as_f64)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(malformed)?;
                match channels[..] {
                    [r, g, b] => Ok(RawColor { r, g, b, a: 255.0 }),
                    [r, g, b, a] => Ok(RawColor { r, g, b, a }),
                    _ => Err(malformed()),
                }
            }
        }
    }
}

/// Apply `f` to numbers, per channel to two colors, or broadcast a number
/// over every channel of a color
fn arithmetic(
    op: Operator,
    lhs: Operand,
    rhs: Operand,
    location: &SourceLocation,
    f: impl Fn(f64, f64) -> f64,
) -> StyleResult<Operand> {
    let result = match (Arith::of(&lhs), Arith::of(&rhs)) {
        (Some(Arith::Number(a)), Some(Arith::Number(b))) => Operand::Value(Value::Double(f(a, b))),
        (Some(Arith::Color(a)), Some(Arith::Color(b))) => Operand::Color(a.zip(b, &f)),
        (Some(Arith::Color(a)), Some(Arith::Number(b))) => Operand::Color(a.map(|c| f(c, b))),
        (Some(Arith::Number(a)), Some(Arith::Color(b))) => Operand::Color(b.map(|c| f(a, c))),
        _ => {
            return Err(StyleError::TypeMismatch {
                op,
                lhs: lhs.value_type(),
                rhs: rhs.value_type(),
                location: location.clone(),
            });
        }
    };
    Ok(result)
}
