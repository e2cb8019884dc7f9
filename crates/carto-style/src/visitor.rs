//! Stylesheet traversal
//!
//! Backends consume a compiled [`Stylesheet`] through [`StylesheetVisitor`].
//! [`Dumper`] renders it back to CSS-like text.

use std::fmt::Write as _;

use crate::rule::{Rule, Stylesheet};

/// Visits a stylesheet rule by rule, in specificity order
pub trait StylesheetVisitor {
    /// Visit the whole stylesheet
    fn visit_stylesheet(&mut self, styl: &Stylesheet) {
        for rule in &styl.rules {
            self.visit_rule(rule);
        }
    }

    /// Visit one rule
    fn visit_rule(&mut self, rule: &Rule);
}

/// Renders rules as `selector { key: value; }` blocks
#[derive(Debug, Clone, Default)]
pub struct Dumper {
    out: String,
}

impl Dumper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a whole stylesheet
    pub fn dump(styl: &Stylesheet) -> String {
        let mut dumper = Self::new();
        dumper.visit_stylesheet(styl);
        dumper.finish()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl StylesheetVisitor for Dumper {
    fn visit_rule(&mut self, rule: &Rule) {
        // Writing into a String cannot fail
        let _ = writeln!(self.out, "{} {{", rule.selector_name());
        for (key, value) in &rule.attrs {
            let _ = writeln!(self.out, "    {}: {};", key, value);
        }
        let _ = writeln!(self.out, "}}\n");
    }
}
