//! Scenario overlays — temporary, never-persisted substitutions.
//!
//! RULE: an overlay is a local value applied at evaluation time only.
//! Nothing is ever written back into the snapshot, so scenario
//! queries are repeatable and concurrent evaluations cannot
//! interfere.

use crate::{
    error::{DeskError, DeskResult},
    rule::FeeRule,
    types::RuleId,
};
use std::fmt;

/// The two editable pricing fields of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    FixedAmount,
    Rate,
}

impl fmt::Display for RuleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleField::FixedAmount => "fixed_amount",
            RuleField::Rate => "rate",
        })
    }
}

/// One-field substitution on one rule.
#[derive(Debug, Clone)]
pub struct RuleOverlay {
    pub rule_id: RuleId,
    pub field: RuleField,
    pub value: f64,
}

impl RuleOverlay {
    /// Negative or non-finite replacement values are configuration
    /// errors, rejected here rather than silently coerced.
    pub fn new(rule_id: RuleId, field: RuleField, value: f64) -> DeskResult<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(DeskError::InvalidOverlay {
                rule_id,
                reason: format!("{field} {value} must be finite and non-negative"),
            });
        }
        Ok(Self {
            rule_id,
            field,
            value,
        })
    }

    /// Shallow copy of the rule with the one field replaced.
    pub fn apply(&self, rule: &FeeRule) -> FeeRule {
        let mut edited = rule.clone();
        match self.field {
            RuleField::FixedAmount => edited.fixed_amount = self.value,
            RuleField::Rate => edited.rate = self.value,
        }
        edited
    }
}
