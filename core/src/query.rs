//! Scenario and aggregate queries over a session snapshot.
//!
//! RULES:
//!   - Every operation takes an explicit transaction subset; callers
//!     own window selection.
//!   - Per-transaction evaluation is stateless. All aggregation is an
//!     order-independent reduce (sum, set-union, min/max), so the
//!     layer fans out across transactions without correctness risk.
//!   - What-if evaluation goes through local overlays only; the
//!     snapshot is never touched.

use crate::{
    error::{DeskError, DeskResult},
    matcher::{rule_matches, MatchContext},
    overlay::{RuleField, RuleOverlay},
    pricing::{realized_fee, rule_fee, validate_amount},
    resolver::select_applied,
    rule::FeeRule,
    snapshot::DeskSnapshot,
    transaction::Transaction,
    types::{MerchantId, RuleId},
};
use std::collections::BTreeSet;

/// Hypothetical steering dimension for best_dimension_value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    CardScheme,
    Aci,
}

impl Dimension {
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::CardScheme => "card_scheme",
            Dimension::Aci => "aci",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Cheapest,
    MostExpensive,
}

impl Objective {
    /// Strict comparison: ties keep the incumbent, and candidates
    /// iterate in ascending order, so ties resolve to the lowest
    /// candidate.
    fn better(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Objective::Cheapest => candidate < incumbent,
            Objective::MostExpensive => candidate > incumbent,
        }
    }
}

/// Declarative filter over the rule table for rule-space queries.
/// Each given field must be accepted by the rule's criterion
/// (wildcard criteria accept everything).
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    pub card_scheme: Option<String>,
    pub account_type: Option<String>,
    pub merchant_category_code: Option<u32>,
    pub aci: Option<String>,
    pub is_credit: Option<bool>,
}

impl RuleFilter {
    fn admits(&self, rule: &FeeRule) -> bool {
        if let Some(scheme) = &self.card_scheme {
            if rule.card_scheme != *scheme {
                return false;
            }
        }
        if let Some(account_type) = &self.account_type {
            if !rule.account_type.accepts(account_type.as_str()) {
                return false;
            }
        }
        if let Some(mcc) = self.merchant_category_code {
            if !rule.merchant_category_code.accepts(&mcc) {
                return false;
            }
        }
        if let Some(aci) = &self.aci {
            if !rule.aci.accepts(aci.as_str()) {
                return false;
            }
        }
        if let Some(is_credit) = self.is_credit {
            if !rule.is_credit.accepts(&is_credit) {
                return false;
            }
        }
        true
    }
}

impl DeskSnapshot {
    // ── Transaction-set operations ─────────────────────────────────

    /// All rule IDs that matched at least one transaction in the
    /// subset. This is a matching question, not a pricing one:
    /// specificity never filters here, so the result is a superset of
    /// every applied set.
    pub fn applicable_rule_ids(&self, txns: &[&Transaction]) -> DeskResult<BTreeSet<RuleId>> {
        let mut ids = BTreeSet::new();
        for txn in txns {
            let Some(ctx) = self.match_context(txn)? else {
                continue;
            };
            for rule in self.rules() {
                if rule_matches(rule, &ctx) {
                    ids.insert(rule.id);
                }
            }
        }
        Ok(ids)
    }

    /// Sum of realized fees over the subset, live rules.
    pub fn total_fee(&self, txns: &[&Transaction]) -> DeskResult<f64> {
        self.total_fee_with(txns, None)
    }

    /// Like total_fee, with one rule substituted for the whole pass:
    /// the overlay participates in matching and resolution, not just
    /// pricing.
    pub fn total_fee_with(
        &self,
        txns: &[&Transaction],
        overlay: Option<&RuleOverlay>,
    ) -> DeskResult<f64> {
        let edited = match overlay {
            Some(overlay) => Some(overlay.apply(self.rule(overlay.rule_id)?)),
            None => None,
        };
        let mut total = 0.0;
        for txn in txns {
            total += self.transaction_fee(txn, edited.as_ref())?;
        }
        Ok(total)
    }

    /// Realized fee for one transaction, with an optional edited rule
    /// standing in for its snapshot version.
    fn transaction_fee(&self, txn: &Transaction, edited: Option<&FeeRule>) -> DeskResult<f64> {
        let Some(ctx) = self.match_context(txn)? else {
            return Ok(0.0);
        };
        Ok(self.fee_in_context(&ctx, txn.eur_amount, edited))
    }

    /// The matcher/resolver/calculator pipeline for one context.
    fn fee_in_context(&self, ctx: &MatchContext<'_>, amount: f64, edited: Option<&FeeRule>) -> f64 {
        let mut matching: Vec<&FeeRule> = Vec::new();
        for rule in self.rules() {
            let effective = match edited {
                Some(e) if e.id == rule.id => e,
                _ => rule,
            };
            if rule_matches(effective, ctx) {
                matching.push(effective);
            }
        }
        let applied = select_applied(&matching);
        realized_fee(&applied, amount)
    }

    /// (new_total - old_total) after substituting new_value for one
    /// pricing field on one rule. Two independent full passes, so any
    /// change in a transaction's applied set is reflected, never
    /// delta-accumulated.
    pub fn fee_delta(
        &self,
        txns: &[&Transaction],
        rule_id: RuleId,
        field: RuleField,
        new_value: f64,
    ) -> DeskResult<f64> {
        // Unknown rule ids are a caller bug; fail fast before the
        // first pass.
        self.rule(rule_id)?;
        let overlay = RuleOverlay::new(rule_id, field, new_value)?;
        let old_total = self.total_fee(txns)?;
        let new_total = self.total_fee_with(txns, Some(&overlay))?;
        Ok(new_total - old_total)
    }

    /// Evaluate total_fee as if every transaction's dimension value
    /// were replaced by each candidate in turn, holding every other
    /// attribute fixed. Returns the best candidate and its total;
    /// ties break to the lowest candidate.
    pub fn best_dimension_value(
        &self,
        txns: &[&Transaction],
        dimension: Dimension,
        objective: Objective,
    ) -> DeskResult<(String, f64)> {
        let candidates = match dimension {
            Dimension::CardScheme => self.card_schemes(),
            Dimension::Aci => self.acis(),
        };
        if candidates.is_empty() {
            return Err(DeskError::NoCandidates {
                dimension: dimension.name(),
            });
        }

        let mut best: Option<(&str, f64)> = None;
        for candidate in candidates {
            let mut total = 0.0;
            for txn in txns {
                let Some(mut ctx) = self.match_context(txn)? else {
                    continue;
                };
                match dimension {
                    Dimension::CardScheme => ctx.card_scheme = candidate.as_str(),
                    Dimension::Aci => ctx.aci = candidate.as_str(),
                }
                total += self.fee_in_context(&ctx, txn.eur_amount, None);
            }
            let better = match best {
                None => true,
                Some((_, incumbent)) => objective.better(total, incumbent),
            };
            if better {
                best = Some((candidate.as_str(), total));
            }
        }
        best.map(|(candidate, total)| (candidate.to_string(), total))
            .ok_or(DeskError::NoCandidates {
                dimension: dimension.name(),
            })
    }

    /// Merchants with at least one snapshot transaction matching the
    /// rule. With a narrowed account type, merchants already of that
    /// type are excluded, since the change would not alter their
    /// outcome.
    pub fn affected_merchants(
        &self,
        rule_id: RuleId,
        narrowed_account_type: Option<&str>,
    ) -> DeskResult<BTreeSet<MerchantId>> {
        let rule = self.rule(rule_id)?;
        let mut affected = BTreeSet::new();
        for txn in self.transactions() {
            if affected.contains(&txn.merchant) {
                continue;
            }
            let Some(ctx) = self.match_context(txn)? else {
                continue;
            };
            if let Some(account_type) = narrowed_account_type {
                if ctx.account_type == account_type {
                    continue;
                }
            }
            if rule_matches(rule, &ctx) {
                affected.insert(txn.merchant.clone());
            }
        }
        Ok(affected)
    }

    // ── Rule-space operations ──────────────────────────────────────
    //
    // No transactions involved: these answer "which rules / what
    // average fee" questions at a hypothetical amount.

    pub fn rules_where(&self, filter: &RuleFilter) -> Vec<&FeeRule> {
        self.rules().iter().filter(|rule| filter.admits(rule)).collect()
    }

    pub fn rule_ids_where(&self, filter: &RuleFilter) -> BTreeSet<RuleId> {
        self.rules_where(filter).iter().map(|rule| rule.id).collect()
    }

    /// Mean rule fee at the given amount over the filtered rule set,
    /// or None when no rule admits the filter.
    pub fn average_rule_fee(&self, filter: &RuleFilter, amount: f64) -> DeskResult<Option<f64>> {
        validate_amount(amount)?;
        let rules = self.rules_where(filter);
        if rules.is_empty() {
            return Ok(None);
        }
        let total: f64 = rules.iter().map(|rule| rule_fee(rule, amount)).sum();
        Ok(Some(total / rules.len() as f64))
    }

    /// The card scheme whose rules have the cheapest / most expensive
    /// mean fee at the given amount. Ties break to the lowest scheme.
    pub fn best_scheme_by_average_fee(
        &self,
        amount: f64,
        objective: Objective,
    ) -> DeskResult<(String, f64)> {
        validate_amount(amount)?;
        let mut best: Option<(&str, f64)> = None;
        for scheme in self.card_schemes() {
            let rules: Vec<&FeeRule> = self
                .rules()
                .iter()
                .filter(|rule| rule.card_scheme == *scheme)
                .collect();
            // Every pooled scheme has at least one rule by
            // construction.
            let average: f64 =
                rules.iter().map(|rule| rule_fee(rule, amount)).sum::<f64>() / rules.len() as f64;
            let better = match best {
                None => true,
                Some((_, incumbent)) => objective.better(average, incumbent),
            };
            if better {
                best = Some((scheme.as_str(), average));
            }
        }
        best.map(|(scheme, average)| (scheme.to_string(), average))
            .ok_or(DeskError::NoCandidates {
                dimension: Dimension::CardScheme.name(),
            })
    }

    /// Over every MCC named by any rule, the mean fee across rules
    /// that are wildcard-or-containing for it; returns all MCCs tied
    /// at the extreme, sorted ascending.
    pub fn extreme_mcc_by_average_fee(
        &self,
        amount: f64,
        objective: Objective,
    ) -> DeskResult<Vec<u32>> {
        validate_amount(amount)?;
        let mut candidates: BTreeSet<u32> = BTreeSet::new();
        for rule in self.rules() {
            if let Some(mccs) = rule.merchant_category_code.values() {
                candidates.extend(mccs.iter().copied());
            }
        }
        if candidates.is_empty() {
            return Err(DeskError::NoCandidates {
                dimension: "merchant_category_code",
            });
        }

        let mut extreme: Option<f64> = None;
        let mut tied: Vec<u32> = Vec::new();
        for mcc in candidates {
            let fees: Vec<f64> = self
                .rules()
                .iter()
                .filter(|rule| rule.merchant_category_code.accepts(&mcc))
                .map(|rule| rule_fee(rule, amount))
                .collect();
            if fees.is_empty() {
                continue;
            }
            let average = fees.iter().sum::<f64>() / fees.len() as f64;
            match extreme {
                None => {
                    extreme = Some(average);
                    tied.push(mcc);
                }
                Some(incumbent) if (average - incumbent).abs() < 1e-10 => {
                    tied.push(mcc);
                }
                Some(incumbent) if objective.better(average, incumbent) => {
                    extreme = Some(average);
                    tied.clear();
                    tied.push(mcc);
                }
                Some(_) => {}
            }
        }
        Ok(tied)
    }

    /// Per candidate ACI (observed in the transaction table), the mean
    /// fee over rules of the scheme that admit it; returns the best
    /// candidate and its average. Candidates with no admitting rules
    /// are skipped; ties break to the lowest ACI.
    pub fn best_aci_by_average_fee(
        &self,
        card_scheme: &str,
        is_credit: Option<bool>,
        amount: f64,
        objective: Objective,
    ) -> DeskResult<(String, f64)> {
        validate_amount(amount)?;
        let mut best: Option<(&str, f64)> = None;
        for aci in self.acis() {
            let filter = RuleFilter {
                card_scheme: Some(card_scheme.to_string()),
                aci: Some(aci.clone()),
                is_credit,
                ..RuleFilter::default()
            };
            let rules = self.rules_where(&filter);
            if rules.is_empty() {
                continue;
            }
            let average: f64 =
                rules.iter().map(|rule| rule_fee(rule, amount)).sum::<f64>() / rules.len() as f64;
            let better = match best {
                None => true,
                Some((_, incumbent)) => objective.better(average, incumbent),
            };
            if better {
                best = Some((aci.as_str(), average));
            }
        }
        best.map(|(aci, average)| (aci.to_string(), average))
            .ok_or(DeskError::NoCandidates {
                dimension: Dimension::Aci.name(),
            })
    }
}
