//! Variable Environment
//!
//! Chained lexical scopes for `@name` variables. Each style block gets its own
//! frame; frames only ever read their ancestors, so parents are shared through
//! `Rc` and a child costs one pointer copy regardless of nesting depth.
//!
//! Bindings hold unevaluated right-hand sides so that a block may reference a
//! variable defined later in it. Each binding is evaluated at most once: the
//! result is cached on the defining frame.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use carto_tree::{Node, Value};

/// One frame of the variable scope chain
#[derive(Debug, Clone, Default)]
pub struct StyleEnv {
    /// Bindings of this frame (name without the `@`)
    vars: HashMap<String, Node>,
    /// Values of bindings of this frame that have been evaluated
    values: RefCell<HashMap<String, Value>>,
    /// Enclosing frame
    parent: Option<Rc<StyleEnv>>,
}

impl StyleEnv {
    /// Create an empty root frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frame whose parent is `self`
    pub fn child(self: &Rc<Self>) -> Self {
        Self {
            vars: HashMap::new(),
            values: RefCell::default(),
            parent: Some(Rc::clone(self)),
        }
    }

    /// Bind `name` in this frame only, shadowing any ancestor binding.
    ///
    /// The bound node is the unevaluated right-hand side; it is evaluated when
    /// referenced.
    pub fn define(&mut self, name: impl Into<String>, value: Node) {
        let name = name.into();
        self.values.get_mut().remove(&name);
        self.vars.insert(name, value);
    }

    /// Bind an already computed value
    pub fn define_value(&mut self, name: impl Into<String>, value: Value) {
        self.define(name, Node::from_value(value));
    }

    /// Find the nearest binding of `name`
    pub fn lookup(&self, name: &str) -> Option<&Node> {
        self.lookup_binding(name).map(|(node, _)| node)
    }

    /// Find the nearest binding of `name` together with the frame that
    /// defines it
    pub fn lookup_binding(&self, name: &str) -> Option<(&Node, &StyleEnv)> {
        let mut frame = self;
        loop {
            if let Some(node) = frame.vars.get(name) {
                return Some((node, frame));
            }
            frame = frame.parent.as_deref()?;
        }
    }

    /// Evaluated value of this frame's binding of `name`, if already known
    pub fn cached(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).cloned()
    }

    /// Remember the evaluated value of this frame's binding of `name`
    pub fn cache(&self, name: &str, value: Value) {
        if self.vars.contains_key(name) {
            self.values.borrow_mut().insert(name.to_string(), value);
        }
    }

    /// Whether `name` is bound in this frame (ancestors not consulted)
    pub fn is_local(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn parent(&self) -> Option<&StyleEnv> {
        self.parent.as_deref()
    }

    /// Number of frames above this one
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self;
        while let Some(parent) = frame.parent.as_deref() {
            depth += 1;
            frame = parent;
        }
        depth
    }

    /// Number of bindings in this frame
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
