//! Merchant reference data.

use crate::{
    error::{DeskError, DeskResult},
    types::MerchantId,
};
use std::fmt;

/// Discretized settlement-delay label used for rule matching.
///
/// Raw delay values are "immediate", "manual", or a day count;
/// 1-2 days bucket to `<3`, 3-5 to `3-5`, anything longer to `>5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureBucket {
    Immediate,
    Under3,
    ThreeToFive,
    Over5,
    Manual,
}

impl CaptureBucket {
    pub fn from_raw(raw: &str) -> DeskResult<Self> {
        match raw {
            "immediate" => Ok(CaptureBucket::Immediate),
            "manual" => Ok(CaptureBucket::Manual),
            other => match other.parse::<u32>() {
                Ok(days) if days < 3 => Ok(CaptureBucket::Under3),
                Ok(days) if days <= 5 => Ok(CaptureBucket::ThreeToFive),
                Ok(_) => Ok(CaptureBucket::Over5),
                Err(_) => Err(DeskError::InvalidCaptureDelay(raw.to_string())),
            },
        }
    }

    /// The label fee rules constrain against.
    pub fn as_label(&self) -> &'static str {
        match self {
            CaptureBucket::Immediate => "immediate",
            CaptureBucket::Under3 => "<3",
            CaptureBucket::ThreeToFive => "3-5",
            CaptureBucket::Over5 => ">5",
            CaptureBucket::Manual => "manual",
        }
    }
}

impl fmt::Display for CaptureBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// One merchant's static attributes. The capture-delay bucket is
/// resolved once at load; matching never sees the raw delay value.
#[derive(Debug, Clone)]
pub struct MerchantProfile {
    pub merchant: MerchantId,
    pub account_type: String,
    pub merchant_category_code: u32,
    pub capture_delay_bucket: CaptureBucket,
    pub acquirer: Vec<String>,
}
