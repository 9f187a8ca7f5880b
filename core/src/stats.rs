//! Monthly merchant aggregates.
//!
//! Volume and fraud tiers are discretized upstream from total EUR
//! volume and the fraud-EUR ratio per merchant-month. The labels are
//! opaque to the engine; rules constrain on them by exact match.

use crate::types::{MerchantId, Month, Year};
use serde::Deserialize;

/// One row of the monthly stats table.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyStats {
    pub merchant: MerchantId,
    pub year: Year,
    pub month: Month,
    pub volume_tier: String,
    pub fraud_tier: String,
}

/// The two tier labels as held in the session snapshot. A missing
/// merchant-month means both tiers are unknown, and any rule that
/// constrains on a tier then fails to match.
#[derive(Debug, Clone)]
pub struct MonthlyTiers {
    pub volume_tier: String,
    pub fraud_tier: String,
}
