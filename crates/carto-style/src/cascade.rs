//! Cascade resolution
//!
//! Runs once after all rules are built. Every rule is compared against the
//! rules declared before it in the ordered collection, nearest first; a pair
//! where the later rule specializes the earlier one is a cascade relation.

use crate::rule::{Rule, RuleSet};

/// How related rules are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CascadeMode {
    /// Rules stay distinct; override happens at render time
    #[default]
    Distinct,
    /// Specializing rules fill missing attributes from the rules they
    /// specialize
    Inherit,
}

/// Whether `specific` may take attributes from `general`
///
/// Beyond the selector relation, every filter of the general rule must also
/// constrain the specific one, so everything the specific rule matches is
/// matched by the general rule too.
pub fn can_inherit(specific: &Rule, general: &Rule) -> bool {
    specific.specializes(general) && general.filters.is_subset_of(&specific.filters)
}

/// Resolve the cascade over `rules` in place
///
/// Returns the number of related pairs found.
pub fn cascade(rules: &mut RuleSet, mode: CascadeMode) -> usize {
    let rules = rules.as_mut_slice();
    let mut related = 0;

    for i in (0..rules.len()).rev() {
        let (earlier, rest) = rules.split_at_mut(i);
        let rule = &mut rest[0];

        for general in earlier.iter().rev() {
            if !rule.specializes(general) {
                continue;
            }
            related += 1;
            tracing::trace!(
                "Cascade: {} specializes {}",
                rule.selector_name(),
                general.selector_name()
            );

            if mode == CascadeMode::Inherit && can_inherit(rule, general) {
                for (key, value) in &general.attrs {
                    // Nearest general rule was visited first and wins
                    rule.attrs.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
        }
    }

    related
}
