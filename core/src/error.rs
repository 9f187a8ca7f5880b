use crate::types::RuleId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Unknown fee rule id {0}")]
    UnknownRule(RuleId),

    #[error("Unknown merchant '{0}'")]
    UnknownMerchant(String),

    #[error("Rule {id}: {reason}")]
    InvalidRule { id: RuleId, reason: String },

    #[error("Transaction {psp_reference}: {reason}")]
    InvalidTransaction { psp_reference: u64, reason: String },

    #[error("Overlay on rule {rule_id}: {reason}")]
    InvalidOverlay { rule_id: RuleId, reason: String },

    #[error("Invalid amount {0}: must be finite and non-negative")]
    InvalidAmount(f64),

    #[error("No candidate values for dimension '{dimension}'")]
    NoCandidates { dimension: &'static str },

    #[error("Invalid capture delay '{0}'")]
    InvalidCaptureDelay(String),

    #[error("Invalid day of year {0}: expected 1..=365")]
    InvalidDayOfYear(u16),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
