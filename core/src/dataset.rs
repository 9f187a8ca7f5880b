//! Loading the session snapshot from a data directory.
//!
//! File shapes follow the upstream payment-analysis data drop:
//!   fees.json                   — rule table
//!   merchant_data.json          — merchant profiles, raw capture delay
//!   monthly_merchant_stats.csv  — per merchant-month tier labels
//!   payments.csv                — transaction table
//!
//! Everything is read once, validated, and frozen into a DeskSnapshot.

use crate::{
    error::DeskResult,
    merchant::{CaptureBucket, MerchantProfile},
    rule::FeeRule,
    snapshot::DeskSnapshot,
    stats::MonthlyStats,
    transaction::Transaction,
    types::MerchantId,
};
use serde::Deserialize;

/// File shape of one merchant_data.json entry. The raw capture_delay
/// is bucketed here; the profile carries only the bucket.
#[derive(Debug, Clone, Deserialize)]
struct MerchantRecord {
    merchant: MerchantId,
    account_type: String,
    merchant_category_code: u32,
    capture_delay: String,
    #[serde(default)]
    acquirer: Vec<String>,
}

impl MerchantRecord {
    fn into_profile(self) -> DeskResult<MerchantProfile> {
        let bucket = CaptureBucket::from_raw(&self.capture_delay)?;
        Ok(MerchantProfile {
            merchant: self.merchant,
            account_type: self.account_type,
            merchant_category_code: self.merchant_category_code,
            capture_delay_bucket: bucket,
            acquirer: self.acquirer,
        })
    }
}

/// Load a data directory into a validated snapshot.
pub fn load_snapshot(data_dir: &str) -> DeskResult<DeskSnapshot> {
    let fees_path = format!("{data_dir}/fees.json");
    let fees_content = std::fs::read_to_string(&fees_path)
        .map_err(|e| anyhow::anyhow!("Cannot read {fees_path}: {e}"))?;
    let rules: Vec<FeeRule> = serde_json::from_str(&fees_content)?;

    let merchant_path = format!("{data_dir}/merchant_data.json");
    let merchant_content = std::fs::read_to_string(&merchant_path)
        .map_err(|e| anyhow::anyhow!("Cannot read {merchant_path}: {e}"))?;
    let records: Vec<MerchantRecord> = serde_json::from_str(&merchant_content)?;
    let mut merchants = Vec::with_capacity(records.len());
    for record in records {
        merchants.push(record.into_profile()?);
    }

    let stats_path = format!("{data_dir}/monthly_merchant_stats.csv");
    let mut stats_reader = csv::Reader::from_path(&stats_path)?;
    let mut stats = Vec::new();
    for row in stats_reader.deserialize() {
        let row: MonthlyStats = row?;
        stats.push(row);
    }

    let payments_path = format!("{data_dir}/payments.csv");
    let mut payments_reader = csv::Reader::from_path(&payments_path)?;
    let mut transactions = Vec::new();
    for row in payments_reader.deserialize() {
        let txn: Transaction = row?;
        transactions.push(txn);
    }

    log::debug!(
        "loaded {data_dir}: {} rules, {} merchants, {} stat rows, {} payments",
        rules.len(),
        merchants.len(),
        stats.len(),
        transactions.len()
    );

    DeskSnapshot::new(rules, merchants, stats, transactions)
}
