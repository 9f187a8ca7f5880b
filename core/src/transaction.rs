//! Payment events.

use crate::{
    calendar,
    error::DeskResult,
    types::{MerchantId, Month, Year},
};
use serde::{Deserialize, Deserializer};

/// One payment as recorded in the payments table. Extra columns in the
/// source file (device, shopper e-mail, card bin, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    pub psp_reference: u64,
    pub merchant: MerchantId,
    pub card_scheme: String,
    pub year: Year,
    /// 1-indexed on the fixed non-leap 365-day calendar.
    pub day_of_year: u16,
    #[serde(deserialize_with = "python_bool")]
    pub is_credit: bool,
    pub eur_amount: f64,
    pub issuing_country: String,
    pub acquirer_country: String,
    pub aci: String,
    #[serde(deserialize_with = "python_bool")]
    pub has_fraudulent_dispute: bool,
}

impl Transaction {
    /// Derived, never stored: domestic iff both countries agree.
    pub fn intracountry(&self) -> bool {
        self.issuing_country == self.acquirer_country
    }

    pub fn month(&self) -> DeskResult<Month> {
        calendar::month_of_day(self.day_of_year)
    }
}

/// The payments export writes Python-style "True"/"False".
fn python_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.as_str() {
        "True" | "true" | "1" => Ok(true),
        "False" | "false" | "0" => Ok(false),
        other => Err(serde::de::Error::custom(format!("not a boolean: {other}"))),
    }
}
