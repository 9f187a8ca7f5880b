//! Specificity-based conflict resolution.
//!
//! The most constrained matching rule wins. Equally specific rules
//! stay co-applicable — ties are kept, never broken by rule order —
//! and the pricing calculator averages their fees.

use crate::rule::FeeRule;

/// Select the applied subset: every matching rule achieving the
/// maximum specificity score. Empty in, empty out.
pub fn select_applied<'a>(matching: &[&'a FeeRule]) -> Vec<&'a FeeRule> {
    let Some(max_score) = matching.iter().map(|rule| rule.specificity()).max() else {
        return Vec::new();
    };
    matching
        .iter()
        .copied()
        .filter(|rule| rule.specificity() == max_score)
        .collect()
}
