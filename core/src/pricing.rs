//! Fee arithmetic.

use crate::{
    error::{DeskError, DeskResult},
    rule::FeeRule,
};

/// fee = fixed_amount + rate * amount / 10000
///
/// Total for any non-negative amount; callers guard amounts at the
/// query boundary, not here.
pub fn rule_fee(rule: &FeeRule, amount: f64) -> f64 {
    rule.fixed_amount + rule.rate * amount / 10_000.0
}

/// Realized fee for an applied-rule set: the arithmetic mean across
/// the set, or exactly 0 when nothing matched. A transaction is
/// never dropped for lack of a matching rule.
pub fn realized_fee(applied: &[&FeeRule], amount: f64) -> f64 {
    if applied.is_empty() {
        return 0.0;
    }
    let total: f64 = applied.iter().map(|rule| rule_fee(rule, amount)).sum();
    total / applied.len() as f64
}

/// Guard for caller-supplied hypothetical amounts.
pub fn validate_amount(amount: f64) -> DeskResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(DeskError::InvalidAmount(amount));
    }
    Ok(())
}
