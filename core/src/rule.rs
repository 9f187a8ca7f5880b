//! Fee rule model — matching criteria plus the pricing formula.
//!
//! RULE: every criterion is either a wildcard or a concrete constraint.
//! The upstream data writes "matches everything" as null for scalar
//! fields and as null OR an empty list for set fields; both spellings
//! normalize to the wildcard variant at deserialization time and the
//! ambiguity never reaches the matcher.

use crate::{
    error::{DeskError, DeskResult},
    types::RuleId,
};
use serde::{Deserialize, Deserializer};
use std::borrow::Borrow;
use std::collections::BTreeSet;

/// Set-valued criterion: wildcard, or an explicit non-empty set of
/// accepted values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetCriterion<T: Ord> {
    Any,
    OneOf(BTreeSet<T>),
}

impl<T: Ord> SetCriterion<T> {
    /// Build from any value collection; an empty collection is the
    /// wildcard, preserving the non-empty invariant of `OneOf`.
    pub fn of<I: IntoIterator<Item = T>>(values: I) -> Self {
        let set: BTreeSet<T> = values.into_iter().collect();
        if set.is_empty() {
            SetCriterion::Any
        } else {
            SetCriterion::OneOf(set)
        }
    }

    pub fn accepts<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self {
            SetCriterion::Any => true,
            SetCriterion::OneOf(values) => values.contains(value),
        }
    }

    pub fn is_constrained(&self) -> bool {
        !matches!(self, SetCriterion::Any)
    }

    /// The accepted values, or None for the wildcard.
    pub fn values(&self) -> Option<&BTreeSet<T>> {
        match self {
            SetCriterion::Any => None,
            SetCriterion::OneOf(values) => Some(values),
        }
    }
}

impl<T: Ord> Default for SetCriterion<T> {
    fn default() -> Self {
        SetCriterion::Any
    }
}

impl<'de, T> Deserialize<'de> for SetCriterion<T>
where
    T: Deserialize<'de> + Ord,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values: Option<Vec<T>> = Option::deserialize(deserializer)?;
        Ok(match values {
            None => SetCriterion::Any,
            Some(values) => SetCriterion::of(values),
        })
    }
}

/// Scalar criterion: wildcard, or one exact required value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueCriterion<T> {
    Any,
    Equals(T),
}

impl<T> ValueCriterion<T> {
    pub fn accepts<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self {
            ValueCriterion::Any => true,
            ValueCriterion::Equals(want) => want.borrow() == value,
        }
    }

    /// Like accepts, for context values that may be absent. A missing
    /// value never satisfies a concrete constraint.
    pub fn accepts_opt<Q>(&self, value: Option<&Q>) -> bool
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self {
            ValueCriterion::Any => true,
            ValueCriterion::Equals(want) => value.is_some_and(|v| want.borrow() == v),
        }
    }

    pub fn is_constrained(&self) -> bool {
        !matches!(self, ValueCriterion::Any)
    }

    /// The required value, or None for the wildcard.
    pub fn value(&self) -> Option<&T> {
        match self {
            ValueCriterion::Any => None,
            ValueCriterion::Equals(value) => Some(value),
        }
    }
}

impl<T> Default for ValueCriterion<T> {
    fn default() -> Self {
        ValueCriterion::Any
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ValueCriterion<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value: Option<T> = Option::deserialize(deserializer)?;
        Ok(value.map(ValueCriterion::Equals).unwrap_or(ValueCriterion::Any))
    }
}

/// The upstream table stores intracountry as null, a boolean, or a
/// 0.0/1.0 float depending on the export that produced it.
fn intracountry_criterion<'de, D>(deserializer: D) -> Result<ValueCriterion<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Num(f64),
    }
    let raw: Option<Raw> = Option::deserialize(deserializer)?;
    Ok(match raw {
        None => ValueCriterion::Any,
        Some(Raw::Bool(flag)) => ValueCriterion::Equals(flag),
        Some(Raw::Num(n)) => ValueCriterion::Equals(n != 0.0),
    })
}

/// One contractual pricing rule.
///
/// fee = fixed_amount + rate * amount / 10000
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeeRule {
    #[serde(rename = "ID")]
    pub id: RuleId,
    /// Mandatory criterion; a rule always names its card scheme.
    pub card_scheme: String,
    #[serde(default)]
    pub account_type: SetCriterion<String>,
    #[serde(default)]
    pub merchant_category_code: SetCriterion<u32>,
    #[serde(default)]
    pub aci: SetCriterion<String>,
    #[serde(default)]
    pub is_credit: ValueCriterion<bool>,
    #[serde(default, deserialize_with = "intracountry_criterion")]
    pub intracountry: ValueCriterion<bool>,
    /// Compared against the merchant's capture-delay bucket label,
    /// never the raw delay value.
    #[serde(default)]
    pub capture_delay: ValueCriterion<String>,
    #[serde(default)]
    pub monthly_volume: ValueCriterion<String>,
    #[serde(default)]
    pub monthly_fraud_level: ValueCriterion<String>,
    pub fixed_amount: f64,
    pub rate: f64,
}

impl FeeRule {
    /// Count of concrete constraints. card_scheme always contributes
    /// one, so scores range 1..=9; more constrained rules win matching
    /// conflicts.
    pub fn specificity(&self) -> u32 {
        let mut score = 1;
        score += self.account_type.is_constrained() as u32;
        score += self.merchant_category_code.is_constrained() as u32;
        score += self.aci.is_constrained() as u32;
        score += self.is_credit.is_constrained() as u32;
        score += self.intracountry.is_constrained() as u32;
        score += self.capture_delay.is_constrained() as u32;
        score += self.monthly_volume.is_constrained() as u32;
        score += self.monthly_fraud_level.is_constrained() as u32;
        score
    }

    /// Reject malformed pricing parameters. Called once per rule when
    /// the session snapshot is built.
    pub fn validate(&self) -> DeskResult<()> {
        if !self.fixed_amount.is_finite() || self.fixed_amount < 0.0 {
            return Err(DeskError::InvalidRule {
                id: self.id,
                reason: format!("fixed_amount {} must be finite and non-negative", self.fixed_amount),
            });
        }
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(DeskError::InvalidRule {
                id: self.id,
                reason: format!("rate {} must be finite and non-negative", self.rate),
            });
        }
        Ok(())
    }
}
