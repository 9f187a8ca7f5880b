//! Rule matching — one rule against one transaction context.
//!
//! RULE: matching is a pure predicate. No side effects, no shared
//! state; safe to evaluate concurrently across any number of
//! (rule, transaction) pairs.

use crate::rule::FeeRule;

/// Everything a rule may look at when matching one transaction: the
/// transaction's own attributes, the merchant's static profile, and
/// the monthly tiers for that merchant-month.
#[derive(Debug, Clone)]
pub struct MatchContext<'a> {
    pub card_scheme: &'a str,
    pub aci: &'a str,
    pub is_credit: bool,
    pub intracountry: bool,
    pub account_type: &'a str,
    pub merchant_category_code: u32,
    pub capture_delay_bucket: &'a str,
    /// None when no monthly stats row exists for the merchant-month;
    /// a concrete tier constraint then fails to match.
    pub volume_tier: Option<&'a str>,
    pub fraud_tier: Option<&'a str>,
}

/// Logical AND over all nine criteria. Wildcards always pass;
/// card_scheme has no wildcard state and is always evaluated.
pub fn rule_matches(rule: &FeeRule, ctx: &MatchContext<'_>) -> bool {
    if rule.card_scheme != ctx.card_scheme {
        return false;
    }
    if !rule.account_type.accepts(ctx.account_type) {
        return false;
    }
    if !rule.merchant_category_code.accepts(&ctx.merchant_category_code) {
        return false;
    }
    if !rule.aci.accepts(ctx.aci) {
        return false;
    }
    if !rule.is_credit.accepts(&ctx.is_credit) {
        return false;
    }
    if !rule.intracountry.accepts(&ctx.intracountry) {
        return false;
    }
    if !rule.capture_delay.accepts(ctx.capture_delay_bucket) {
        return false;
    }
    if !rule.monthly_volume.accepts_opt(ctx.volume_tier) {
        return false;
    }
    if !rule.monthly_fraud_level.accepts_opt(ctx.fraud_tier) {
        return false;
    }
    true
}
