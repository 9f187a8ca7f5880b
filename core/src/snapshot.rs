//! The immutable per-session data snapshot.
//!
//! RULES:
//!   - All tables are loaded once and never mutated; the engine only
//!     derives local overlay copies for what-if evaluation.
//!   - The snapshot is an explicit context object passed by reference
//!     into the query layer — never implicit module state.
//!   - Query operations take an explicit transaction subset; window
//!     selection happens at the call site via merchant_transactions.

use crate::{
    error::{DeskError, DeskResult},
    matcher::MatchContext,
    merchant::MerchantProfile,
    rule::FeeRule,
    stats::{MonthlyStats, MonthlyTiers},
    transaction::Transaction,
    types::{MerchantId, Month, RuleId, Year},
};
use std::collections::{BTreeSet, HashMap};

/// Time window for caller-side transaction selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Year,
    Month(Month),
    /// Inclusive month span.
    Months(Month, Month),
    Day(u16),
}

pub struct DeskSnapshot {
    rules: Vec<FeeRule>,
    rule_index: HashMap<RuleId, usize>,
    merchants: HashMap<MerchantId, MerchantProfile>,
    monthly: HashMap<MerchantId, HashMap<(Year, Month), MonthlyTiers>>,
    transactions: Vec<Transaction>,
    /// Sorted unique card schemes named by the rule table.
    card_schemes: Vec<String>,
    /// Sorted unique ACIs observed in the transaction table.
    acis: Vec<String>,
}

impl DeskSnapshot {
    /// Validate and index all tables for one analysis session.
    pub fn new(
        rules: Vec<FeeRule>,
        merchants: Vec<MerchantProfile>,
        stats: Vec<MonthlyStats>,
        transactions: Vec<Transaction>,
    ) -> DeskResult<Self> {
        let mut rule_index = HashMap::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            rule.validate()?;
            if rule_index.insert(rule.id, i).is_some() {
                return Err(DeskError::InvalidRule {
                    id: rule.id,
                    reason: "duplicate rule id".to_string(),
                });
            }
        }

        for txn in &transactions {
            if !txn.eur_amount.is_finite() || txn.eur_amount < 0.0 {
                return Err(DeskError::InvalidTransaction {
                    psp_reference: txn.psp_reference,
                    reason: format!("eur_amount {} must be finite and non-negative", txn.eur_amount),
                });
            }
            // Rejects out-of-range day_of_year up front, so later
            // month lookups cannot fail mid-query.
            txn.month()?;
        }

        let merchants: HashMap<MerchantId, MerchantProfile> = merchants
            .into_iter()
            .map(|profile| (profile.merchant.clone(), profile))
            .collect();

        let mut monthly: HashMap<MerchantId, HashMap<(Year, Month), MonthlyTiers>> = HashMap::new();
        for row in stats {
            monthly.entry(row.merchant).or_default().insert(
                (row.year, row.month),
                MonthlyTiers {
                    volume_tier: row.volume_tier,
                    fraud_tier: row.fraud_tier,
                },
            );
        }

        let card_schemes: Vec<String> = rules
            .iter()
            .map(|rule| rule.card_scheme.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let acis: Vec<String> = transactions
            .iter()
            .map(|txn| txn.aci.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        log::info!(
            "snapshot: {} rules, {} merchants, {} transactions, {} schemes, {} acis",
            rules.len(),
            merchants.len(),
            transactions.len(),
            card_schemes.len(),
            acis.len()
        );

        Ok(Self {
            rules,
            rule_index,
            merchants,
            monthly,
            transactions,
            card_schemes,
            acis,
        })
    }

    pub fn rules(&self) -> &[FeeRule] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> DeskResult<&FeeRule> {
        self.rule_index
            .get(&id)
            .map(|&i| &self.rules[i])
            .ok_or(DeskError::UnknownRule(id))
    }

    pub fn merchant(&self, merchant: &str) -> DeskResult<&MerchantProfile> {
        self.merchants
            .get(merchant)
            .ok_or_else(|| DeskError::UnknownMerchant(merchant.to_string()))
    }

    pub fn merchants(&self) -> impl Iterator<Item = &MerchantProfile> {
        self.merchants.values()
    }

    pub fn monthly_tiers(&self, merchant: &str, year: Year, month: Month) -> Option<&MonthlyTiers> {
        self.monthly
            .get(merchant)
            .and_then(|by_month| by_month.get(&(year, month)))
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn card_schemes(&self) -> &[String] {
        &self.card_schemes
    }

    pub fn acis(&self) -> &[String] {
        &self.acis
    }

    /// Caller-side window selection. The query operations themselves
    /// never filter by time, so window bugs stay visible at the call
    /// site.
    pub fn merchant_transactions(
        &self,
        merchant: &str,
        year: Year,
        window: TimeWindow,
    ) -> DeskResult<Vec<&Transaction>> {
        let mut selected = Vec::new();
        for txn in &self.transactions {
            if txn.merchant != merchant || txn.year != year {
                continue;
            }
            let keep = match window {
                TimeWindow::Year => true,
                TimeWindow::Month(month) => txn.month()? == month,
                TimeWindow::Months(from, to) => (from..=to).contains(&txn.month()?),
                TimeWindow::Day(day) => txn.day_of_year == day,
            };
            if keep {
                selected.push(txn);
            }
        }
        Ok(selected)
    }

    /// Assemble the matching context for one transaction. Returns None
    /// when the merchant is unknown; the transaction then matches
    /// nothing and prices to 0, and the batch continues.
    pub fn match_context<'a>(&'a self, txn: &'a Transaction) -> DeskResult<Option<MatchContext<'a>>> {
        let Some(profile) = self.merchants.get(&txn.merchant) else {
            log::debug!(
                "no profile for merchant '{}'; transaction {} matches nothing",
                txn.merchant,
                txn.psp_reference
            );
            return Ok(None);
        };
        let month = txn.month()?;
        let tiers = self.monthly_tiers(&txn.merchant, txn.year, month);
        Ok(Some(MatchContext {
            card_scheme: &txn.card_scheme,
            aci: &txn.aci,
            is_credit: txn.is_credit,
            intracountry: txn.intracountry(),
            account_type: &profile.account_type,
            merchant_category_code: profile.merchant_category_code,
            capture_delay_bucket: profile.capture_delay_bucket.as_label(),
            volume_tier: tiers.map(|t| t.volume_tier.as_str()),
            fraud_tier: tiers.map(|t| t.fraud_tier.as_str()),
        }))
    }
}
