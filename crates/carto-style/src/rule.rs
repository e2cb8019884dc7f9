//! Rules and stylesheets
//!
//! A [`Rule`] is a fully resolved style block: its accumulated selector chain
//! and the attributes it sets. A [`Stylesheet`] keeps its rules ordered by
//! ascending [`Specificity`], with declaration order preserved among equals.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use carto_tree::Value;

use crate::selectors::{AttachmentSelector, FilterSelector, FilterSet, NameSelector};

/// Rule specificity (names, filters, attachment) packed into one word
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Specificity(pub u32);

impl Specificity {
    pub fn new(names: usize, filters: usize, attachment: bool) -> Self {
        let names = names.min(u16::MAX as usize) as u32;
        let filters = filters.min(0xFF) as u32;
        let attachment = if attachment { 0xFF } else { 0 };
        Self((names << 16) | (filters << 8) | attachment)
    }

    pub fn names(&self) -> u32 {
        self.0 >> 16
    }

    pub fn filters(&self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub fn has_attachment(&self) -> bool {
        self.0 & 0xFF != 0
    }
}

/// A resolved style rule
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    /// Name selector chain, outermost first
    pub names: Vec<NameSelector>,
    pub filters: FilterSet,
    pub attachment: Option<AttachmentSelector>,
    pub attrs: BTreeMap<String, Value>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn specificity(&self) -> Specificity {
        Specificity::new(self.names.len(), self.filters.len(), self.attachment.is_some())
    }

    pub fn push_name(&mut self, name: NameSelector) {
        self.names.push(name);
    }

    pub fn add_filter(&mut self, filter: FilterSelector) {
        self.filters.insert(filter);
    }

    /// Set the attachment, replacing an inherited one
    pub fn set_attachment(&mut self, attachment: AttachmentSelector) {
        self.attachment = Some(attachment);
    }

    /// Set an attribute; the last write wins
    pub fn set_attr(&mut self, key: impl Into<String>, value: Value) {
        self.attrs.insert(key.into(), value);
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// Names and attachment, the key rules are grouped into styles by
    pub fn partial_name(&self) -> String {
        let mut out = String::new();
        for name in &self.names {
            let _ = write!(out, "{}", name);
        }
        if let Some(attachment) = &self.attachment {
            let _ = write!(out, "{}", attachment);
        }
        out
    }

    /// Full selector: names, filters, then attachment
    pub fn selector_name(&self) -> String {
        let mut out = String::new();
        for name in &self.names {
            let _ = write!(out, "{}", name);
        }
        for filter in &self.filters {
            let _ = write!(out, "{}", filter);
        }
        if let Some(attachment) = &self.attachment {
            let _ = write!(out, "{}", attachment);
        }
        out
    }

    /// Whether `self` specializes the more general rule `general`: the
    /// general rule's names are a strict prefix of ours and its attachment,
    /// if any, is ours
    pub fn specializes(&self, general: &Rule) -> bool {
        general.names.len() < self.names.len()
            && self.names.starts_with(&general.names)
            && (general.attachment.is_none() || general.attachment == self.attachment)
    }
}

/// Rules ordered by ascending specificity; stable for equal specificity
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert after every rule of lower or equal specificity
    pub fn insert(&mut self, rule: Rule) {
        let specificity = rule.specificity();
        let at = self.rules.partition_point(|r| r.specificity() <= specificity);
        self.rules.insert(at, rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Mutable access for in-place attribute merges; selectors must not
    /// change, or the ordering breaks
    pub(crate) fn as_mut_slice(&mut self) -> &mut [Rule] {
        &mut self.rules
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Rules sharing a partial name
#[derive(Debug, Clone, PartialEq)]
pub struct StyleGroup<'a> {
    pub name: String,
    pub rules: Vec<&'a Rule>,
}

/// Compiled stylesheet
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stylesheet {
    /// Map-level settings (`srs`, `background-color`, ...)
    pub map_style: BTreeMap<String, Value>,
    pub rules: RuleSet,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules grouped by [`Rule::partial_name`], groups in order of first
    /// appearance
    pub fn styles(&self) -> Vec<StyleGroup<'_>> {
        let mut groups: Vec<StyleGroup<'_>> = Vec::new();
        for rule in &self.rules {
            let name = rule.partial_name();
            match groups.iter_mut().find(|g| g.name == name) {
                Some(group) => group.rules.push(rule),
                None => groups.push(StyleGroup {
                    name,
                    rules: vec![rule],
                }),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::Predicate;

    fn rule(names: &[NameSelector], filters: usize, attachment: Option<&str>) -> Rule {
        let mut r = Rule::new();
        for name in names {
            r.push_name(name.clone());
        }
        for i in 0..filters {
            r.add_filter(FilterSelector::new(format!("k{}", i), Predicate::Eq, Value::Int(i as i64)));
        }
        if let Some(a) = attachment {
            r.set_attachment(AttachmentSelector::new(a));
        }
        r
    }

    fn class(n: &str) -> NameSelector {
        NameSelector::Class(n.into())
    }

    fn id(n: &str) -> NameSelector {
        NameSelector::Id(n.into())
    }

    #[test]
    fn test_specificity_packing() {
        let r = rule(&[id("a"), class("b")], 3, Some("glow"));
        assert_eq!(r.specificity().0, (2 << 16) | (3 << 8) | 0xFF);

        let s = r.specificity();
        assert_eq!(s.names(), 2);
        assert_eq!(s.filters(), 3);
        assert!(s.has_attachment());
    }

    #[test]
    fn test_specificity_clamps_filters() {
        let r = rule(&[class("x")], 300, None);
        assert_eq!(r.specificity().0, (1 << 16) | (255 << 8));
    }

    #[test]
    fn test_specificity_ignores_attributes() {
        let mut r = rule(&[class("x")], 0, None);
        let before = r.specificity();
        r.set_attr("line-width", Value::Double(2.0));
        assert_eq!(r.specificity(), before);
    }

    #[test]
    fn test_ruleset_orders_by_specificity() {
        let mut set = RuleSet::new();
        set.insert(rule(&[class("a"), class("b")], 0, None));
        set.insert(rule(&[class("a")], 1, None));
        set.insert(rule(&[class("a")], 0, None));

        let order: Vec<u32> = set.iter().map(|r| r.specificity().0).collect();
        assert_eq!(order, vec![1 << 16, (1 << 16) | (1 << 8), 2 << 16]);
    }

    #[test]
    fn test_ruleset_stable_for_ties() {
        let mut set = RuleSet::new();
        let mut first = rule(&[class("x")], 0, None);
        first.set_attr("order", Value::Int(1));
        let mut second = rule(&[class("y")], 0, None);
        second.set_attr("order", Value::Int(2));

        set.insert(first);
        set.insert(second);

        let order: Vec<_> = set.iter().filter_map(|r| r.attr("order").cloned()).collect();
        assert_eq!(order, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_names() {
        let mut r = rule(&[id("roads"), class("major")], 0, Some("casing"));
        r.add_filter(FilterSelector::new("zoom", Predicate::Gt, Value::Int(10)));
        assert_eq!(r.partial_name(), "#roads.major::casing");
        assert_eq!(r.selector_name(), "#roads.major[zoom>10]::casing");
    }

    #[test]
    fn test_specializes() {
        let general = rule(&[class("foo")], 0, None);
        let specific = rule(&[class("foo"), class("bar")], 0, None);
        let unrelated = rule(&[class("baz"), class("bar")], 0, None);

        assert!(specific.specializes(&general));
        assert!(!general.specializes(&specific));
        assert!(!unrelated.specializes(&general));
        // Prefix must be strict
        assert!(!general.specializes(&general));
    }

    #[test]
    fn test_specializes_respects_attachment() {
        let casing = rule(&[id("roads")], 0, Some("casing"));
        let casing_major = rule(&[id("roads"), class("major")], 0, Some("casing"));
        let fill_major = rule(&[id("roads"), class("major")], 0, Some("fill"));
        let plain_major = rule(&[id("roads"), class("major")], 0, None);

        assert!(casing_major.specializes(&casing));
        assert!(!fill_major.specializes(&casing));
        assert!(!plain_major.specializes(&casing));

        let general = rule(&[id("roads")], 0, None);
        assert!(fill_major.specializes(&general));
    }

    #[test]
    fn test_styles_grouping() {
        let mut sheet = Stylesheet::new();
        sheet.rules.insert(rule(&[id("water")], 0, None));
        sheet.rules.insert(rule(&[id("roads")], 0, None));
        sheet.rules.insert(rule(&[id("water")], 1, None));

        let groups = sheet.styles();
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["#water", "#roads"]);
        assert_eq!(groups[0].rules.len(), 2);
    }
}
