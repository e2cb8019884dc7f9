//! Selector model
//!
//! A rule is matched by a chain of name selectors (`.class`, `#id`), a set of
//! attribute filters (`[key = value]`) and at most one attachment (`::name`).

use std::fmt;

use carto_tree::{NodeKind, SourceLocation, Value};

use crate::error::{StyleError, StyleResult};

/// Class or id name selector
///
/// Equality is kind-aware: `.x` and `#x` never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NameSelector {
    Class(String),
    Id(String),
}

impl NameSelector {
    /// Parse `.name` or `#name`
    pub fn parse(text: &str, location: &SourceLocation) -> StyleResult<Self> {
        let invalid = || StyleError::InvalidSelectorName {
            name: text.to_string(),
            location: location.clone(),
        };
        if let Some(name) = text.strip_prefix('#') {
            Ok(Self::Id(name.to_string()))
        } else if let Some(name) = text.strip_prefix('.') {
            Ok(Self::Class(name.to_string()))
        } else {
            Err(invalid())
        }
    }

    /// Name without its sigil
    pub fn name(&self) -> &str {
        match self {
            Self::Class(name) | Self::Id(name) => name,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }

    pub fn is_id(&self) -> bool {
        matches!(self, Self::Id(_))
    }
}

impl fmt::Display for NameSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => write!(f, ".{}", name),
            Self::Id(name) => write!(f, "#{}", name),
        }
    }
}

/// Filter comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Predicate {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Neq,
    Unknown,
}

impl Predicate {
    /// Predicate named by a filter clause kind
    pub fn from_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::FilterEq => Self::Eq,
            NodeKind::FilterLt => Self::Lt,
            NodeKind::FilterLe => Self::Le,
            NodeKind::FilterGt => Self::Gt,
            NodeKind::FilterGe => Self::Ge,
            NodeKind::FilterNeq => Self::Neq,
            _ => Self::Unknown,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Neq => "!=",
            Self::Unknown => "?",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `[key <predicate> value]`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterSelector {
    pub key: String,
    pub predicate: Predicate,
    pub value: Value,
}

impl FilterSelector {
    pub fn new(key: impl Into<String>, predicate: Predicate, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            predicate,
            value: value.into(),
        }
    }

    fn sort_key(&self) -> (&str, Predicate) {
        (&self.key, self.predicate)
    }
}

impl fmt::Display for FilterSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}{}{}]", self.key, self.predicate, self.value)
    }
}

/// Rendering sub-layer of a rule, `::name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttachmentSelector {
    pub name: String,
}

impl AttachmentSelector {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for AttachmentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "::{}", self.name)
    }
}

/// Filters ordered by key then predicate; duplicates allowed, equal entries
/// keep insertion order
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterSet {
    filters: Vec<FilterSelector>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, filter: FilterSelector) {
        let at = self
            .filters
            .partition_point(|f| f.sort_key() <= filter.sort_key());
        self.filters.insert(at, filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterSelector> {
        self.filters.iter()
    }

    pub fn contains(&self, filter: &FilterSelector) -> bool {
        self.filters.contains(filter)
    }

    /// Whether every filter of `self` also appears in `other`
    pub fn is_subset_of(&self, other: &FilterSet) -> bool {
        self.filters.iter().all(|f| other.contains(f))
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a FilterSelector;
    type IntoIter = std::slice::Iter<'a, FilterSelector>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}

impl FromIterator<FilterSelector> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilterSelector>>(iter: I) -> Self {
        let mut set = Self::new();
        for filter in iter {
            set.insert(filter);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_selector_kind_sensitive() {
        assert_ne!(NameSelector::Class("x".into()), NameSelector::Id("x".into()));
        assert_eq!(NameSelector::Class("x".into()), NameSelector::Class("x".into()));
    }

    #[test]
    fn test_parse_name_selector() {
        let loc = SourceLocation::default();
        assert_eq!(NameSelector::parse("#roads", &loc).unwrap(), NameSelector::Id("roads".into()));
        assert_eq!(NameSelector::parse(".minor", &loc).unwrap(), NameSelector::Class("minor".into()));

        let err = NameSelector::parse("roads", &loc).unwrap_err();
        assert!(matches!(err, StyleError::InvalidSelectorName { ref name, .. } if name == "roads"));
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(NameSelector::Id("water".into()).to_string(), "#water");
        assert_eq!(NameSelector::Class("big".into()).to_string(), ".big");
        assert_eq!(AttachmentSelector::new("glow").to_string(), "::glow");
        assert_eq!(
            FilterSelector::new("zoom", Predicate::Ge, Value::Int(10)).to_string(),
            "[zoom>=10]"
        );
        assert_eq!(
            FilterSelector::new("type", Predicate::Eq, "motorway").to_string(),
            "[type=\"motorway\"]"
        );
    }

    #[test]
    fn test_predicate_from_kind() {
        assert_eq!(Predicate::from_kind(NodeKind::FilterNeq), Predicate::Neq);
        assert_eq!(Predicate::from_kind(NodeKind::FilterLe), Predicate::Le);
        assert_eq!(Predicate::from_kind(NodeKind::Attribute), Predicate::Unknown);
    }

    #[test]
    fn test_filter_equality_needs_all_parts() {
        let a = FilterSelector::new("zoom", Predicate::Gt, Value::Int(3));
        assert_eq!(a, FilterSelector::new("zoom", Predicate::Gt, Value::Int(3)));
        assert_ne!(a, FilterSelector::new("zoom", Predicate::Ge, Value::Int(3)));
        assert_ne!(a, FilterSelector::new("zoom", Predicate::Gt, Value::Int(4)));
        assert_ne!(a, FilterSelector::new("scale", Predicate::Gt, Value::Int(3)));
    }

    #[test]
    fn test_filter_set_ordering() {
        let set: FilterSet = [
            FilterSelector::new("zoom", Predicate::Lt, Value::Int(15)),
            FilterSelector::new("type", Predicate::Eq, "a"),
            FilterSelector::new("zoom", Predicate::Gt, Value::Int(10)),
            FilterSelector::new("type", Predicate::Eq, "b"),
        ]
        .into_iter()
        .collect();

        let rendered: Vec<String> = set.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["[type=\"a\"]", "[type=\"b\"]", "[zoom<15]", "[zoom>10]"]
        );
    }

    #[test]
    fn test_filter_set_is_multiset() {
        let mut set = FilterSet::new();
        set.insert(FilterSelector::new("zoom", Predicate::Eq, Value::Int(1)));
        set.insert(FilterSelector::new("zoom", Predicate::Eq, Value::Int(1)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_filter_subset() {
        let general: FilterSet = [FilterSelector::new("zoom", Predicate::Gt, Value::Int(5))]
            .into_iter()
            .collect();
        let mut specific = general.clone();
        specific.insert(FilterSelector::new("type", Predicate::Eq, "river"));

        assert!(general.is_subset_of(&specific));
        assert!(!specific.is_subset_of(&general));
        assert!(FilterSet::new().is_subset_of(&general));
    }
}
