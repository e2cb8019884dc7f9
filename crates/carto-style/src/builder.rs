//! Stylesheet builder
//!
//! Walks an annotated tree in document order and produces a [`Stylesheet`]:
//! variables are bound into chained environments, style blocks become
//! [`Rule`]s carrying their accumulated selector chain, attribute values are
//! evaluated, and the cascade runs once over the finished rule set.

use std::rc::Rc;

use carto_tree::{Node, NodeKind, SourceLocation, Value};

use crate::cascade::{self, CascadeMode};
use crate::env::StyleEnv;
use crate::error::{StyleError, StyleResult};
use crate::eval::Expression;
use crate::functions::FunctionRegistry;
use crate::rule::{Rule, Stylesheet};
use crate::selectors::{AttachmentSelector, FilterSelector, NameSelector, Predicate};

/// Builds stylesheets from annotated trees
#[derive(Debug, Clone)]
pub struct StylesheetBuilder {
    /// Unknown statement kinds are errors rather than skipped
    strict: bool,
    cascade: CascadeMode,
    functions: FunctionRegistry,
}

impl Default for StylesheetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StylesheetBuilder {
    pub fn new() -> Self {
        Self {
            strict: true,
            cascade: CascadeMode::default(),
            functions: FunctionRegistry::with_builtins(),
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn cascade_mode(mut self, mode: CascadeMode) -> Self {
        self.cascade = mode;
        self
    }

    /// Replace the function registry
    pub fn functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Build a stylesheet from a tree root
    ///
    /// `env` is the root scope; top-level variables are added to it and are
    /// visible from every style block.
    pub fn parse_stylesheet(&self, tree: &Node, mut env: StyleEnv) -> StyleResult<Stylesheet> {
        if tree.kind() != NodeKind::Stylesheet {
            return Err(StyleError::InvalidNodeKind {
                kind: tree.kind(),
                context: "stylesheet root",
                location: tree.location().clone(),
            });
        }
        tracing::debug!(
            "Building stylesheet from {} ({} statements)",
            tree.location().file,
            tree.children().len()
        );

        hoist_variables(tree.children(), &mut env)?;
        let env = Rc::new(env);
        let root = Rule::new();
        let mut styl = Stylesheet::new();

        for node in tree.children() {
            match node.kind() {
                NodeKind::Variable => self.parse_variable(node, &env)?,
                NodeKind::MapStyle => self.parse_map_style(&mut styl, node, &env)?,
                NodeKind::Style => self.parse_style(&mut styl, node, &env, &root)?,
                NodeKind::Mixin | NodeKind::Comment => {}
                _ => self.invalid_kind(node, "stylesheet")?,
            }
        }

        let related = cascade::cascade(&mut styl.rules, self.cascade);
        tracing::debug!(
            "Built {} rules, {} map settings, {} cascade relations",
            styl.rules.len(),
            styl.map_style.len(),
            related
        );
        Ok(styl)
    }

    /// Build the rules of one style block
    ///
    /// Each selector of the block's group yields its own rule, starting from
    /// the parent's selector chain in a fresh child scope of `parent_env`.
    pub fn parse_style(
        &self,
        styl: &mut Stylesheet,
        node: &Node,
        parent_env: &Rc<StyleEnv>,
        parent_rule: &Rule,
    ) -> StyleResult<()> {
        let [selectors, body] = node.children() else {
            return Err(StyleError::malformed(
                node.kind(),
                "a selector group and a body",
                node.location(),
            ));
        };

        for selector in selectors.children() {
            let mut env = parent_env.child();
            hoist_variables(body.children(), &mut env)?;
            let env = Rc::new(env);

            let mut rule = Rule {
                names: parent_rule.names.clone(),
                filters: parent_rule.filters.clone(),
                attachment: parent_rule.attachment.clone(),
                ..Rule::default()
            };
            self.parse_selector(selector, &env, &mut rule)?;

            for item in body.children() {
                match item.kind() {
                    NodeKind::Variable => self.parse_variable(item, &env)?,
                    NodeKind::Style => self.parse_style(styl, item, &env, &rule)?,
                    NodeKind::Attribute => self.parse_attribute(item, &env, &mut rule)?,
                    NodeKind::Mixin | NodeKind::Comment => {}
                    _ => self.invalid_kind(item, "style")?,
                }
            }

            tracing::trace!("Rule {} ({} attributes)", rule.selector_name(), rule.attrs.len());
            styl.rules.insert(rule);
        }
        Ok(())
    }

    /// Apply one `[name, attachment, filters]` selector entry to `rule`
    fn parse_selector(&self, node: &Node, env: &StyleEnv, rule: &mut Rule) -> StyleResult<()> {
        let [name, attachment, filters] = node.children() else {
            return Err(StyleError::malformed(
                node.kind(),
                "name, attachment and filters",
                node.location(),
            ));
        };

        if !name.is_nil() {
            let text = name
                .as_str()
                .ok_or_else(|| StyleError::malformed(node.kind(), "a string name", name.location()))?;
            // An empty name is the same as none
            if !text.is_empty() {
                rule.push_name(NameSelector::parse(text, located(name, node))?);
            }
        }

        if !attachment.is_nil() {
            let text = attachment.as_str().ok_or_else(|| {
                StyleError::malformed(node.kind(), "a string attachment", attachment.location())
            })?;
            rule.set_attachment(AttachmentSelector::new(text));
        }

        if !filters.is_nil() {
            if filters.kind() != NodeKind::Filter {
                return Err(StyleError::InvalidNodeKind {
                    kind: filters.kind(),
                    context: "filter",
                    location: filters.location().clone(),
                });
            }
            self.parse_filter(filters, env, rule)?;
        }
        Ok(())
    }

    /// Add each clause of a filter group to `rule`
    pub fn parse_filter(&self, node: &Node, env: &StyleEnv, rule: &mut Rule) -> StyleResult<()> {
        for clause in node.children() {
            if !clause.kind().is_filter_clause() {
                return Err(StyleError::UnknownPredicate {
                    kind: clause.kind(),
                    location: clause.location().clone(),
                });
            }

            let (key, value) = self.key_value(clause, env)?;
            rule.add_filter(FilterSelector::new(key, Predicate::from_kind(clause.kind()), value));
        }
        Ok(())
    }

    /// Evaluate an attribute into `rule`; a repeated key overwrites
    pub fn parse_attribute(&self, node: &Node, env: &StyleEnv, rule: &mut Rule) -> StyleResult<()> {
        let (key, value) = self.key_value(node, env)?;
        rule.set_attr(key, value);
        Ok(())
    }

    /// Evaluate a variable definition
    ///
    /// The binding itself was hoisted into `env` when the enclosing block was
    /// entered; this checks that the definition evaluates. Inside its own
    /// right-hand side the name refers to the enclosing scope's binding.
    pub fn parse_variable(&self, node: &Node, env: &StyleEnv) -> StyleResult<()> {
        let (name, value) = split_key_value(node)?;
        let value = Expression::new(&self.functions).eval_binding(name, value, env)?;
        tracing::trace!("Variable @{} = {}", name, value);
        Ok(())
    }

    /// Evaluate map-level settings into `styl.map_style`
    pub fn parse_map_style(&self, styl: &mut Stylesheet, node: &Node, env: &StyleEnv) -> StyleResult<()> {
        for entry in node.children() {
            if entry.kind() != NodeKind::Attribute {
                self.invalid_kind(entry, "map style")?;
                continue;
            }
            let (key, value) = self.key_value(entry, env)?;
            styl.map_style.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Split a `[key, value]` node and evaluate the value
    fn key_value<'n>(&self, node: &'n Node, env: &StyleEnv) -> StyleResult<(&'n str, Value)> {
        let (key, value) = split_key_value(node)?;
        let value = Expression::new(&self.functions).eval(value, env)?;
        Ok((key, value))
    }

    /// Fail, or in non-strict mode log and skip
    fn invalid_kind(&self, node: &Node, context: &'static str) -> StyleResult<()> {
        let err = StyleError::InvalidNodeKind {
            kind: node.kind(),
            context,
            location: node.location().clone(),
        };
        if self.strict {
            return Err(err);
        }
        tracing::warn!("Skipping: {}", err);
        Ok(())
    }
}

/// Location of `leaf`, or of `parent` when the leaf was never positioned
fn located<'n>(leaf: &'n Node, parent: &'n Node) -> &'n SourceLocation {
    if *leaf.location() == SourceLocation::default() {
        parent.location()
    } else {
        leaf.location()
    }
}

fn split_key_value(node: &Node) -> StyleResult<(&str, &Node)> {
    match node.children() {
        [key, value] => key
            .as_str()
            .map(|key| (key, value))
            .ok_or_else(|| StyleError::malformed(node.kind(), "a string key", node.location())),
        _ => Err(StyleError::malformed(node.kind(), "a key and a value", node.location())),
    }
}

/// Bind every variable definition among `statements` into `env`, unevaluated
///
/// References are then resolved regardless of where in the block the
/// definition appears; the last definition of a name wins.
fn hoist_variables(statements: &[Node], env: &mut StyleEnv) -> StyleResult<()> {
    for node in statements.iter().filter(|n| n.kind() == NodeKind::Variable) {
        let (name, value) = split_key_value(node)?;
        env.define(name, value.clone());
    }
    Ok(())
}
