//! SQLite export of the normalized analysis tables.
//!
//! RULE: only this module talks to the database. The engine itself
//! never sees SQL; the export exists for downstream ad-hoc analysis.
//!
//! Two tables are written:
//!   payments_enriched — payments joined with merchant attributes
//!     plus the derived month and intracountry columns.
//!   fees_normalized   — one row per (rule, account_type, mcc, aci)
//!     combination, wildcards spelled "*", with the rule's
//!     specificity score.

use anyhow::Result;
use feedesk_core::{rule::SetCriterion, snapshot::DeskSnapshot};
use rusqlite::{params, Connection};
use std::path::Path;

pub fn export(snapshot: &DeskSnapshot, path: &str) -> Result<()> {
    if Path::new(path).exists() {
        std::fs::remove_file(path)?;
    }
    let mut conn = Connection::open(path)?;

    conn.execute_batch(
        "CREATE TABLE payments_enriched (
            psp_reference          INTEGER NOT NULL,
            merchant               TEXT NOT NULL,
            card_scheme            TEXT NOT NULL,
            year                   INTEGER NOT NULL,
            month                  INTEGER NOT NULL,
            day_of_year            INTEGER NOT NULL,
            is_credit              INTEGER NOT NULL,
            eur_amount             REAL NOT NULL,
            aci                    TEXT NOT NULL,
            issuing_country        TEXT NOT NULL,
            acquirer_country       TEXT NOT NULL,
            intracountry           INTEGER NOT NULL,
            has_fraudulent_dispute INTEGER NOT NULL,
            account_type           TEXT,
            merchant_category_code INTEGER,
            capture_delay_bucket   TEXT
        );
        CREATE TABLE fees_normalized (
            id                     INTEGER NOT NULL,
            card_scheme            TEXT NOT NULL,
            account_type           TEXT NOT NULL,
            merchant_category_code TEXT NOT NULL,
            aci                    TEXT NOT NULL,
            capture_delay          TEXT NOT NULL,
            monthly_volume         TEXT NOT NULL,
            monthly_fraud_level    TEXT NOT NULL,
            is_credit              TEXT NOT NULL,
            intracountry           TEXT NOT NULL,
            fixed_amount           REAL NOT NULL,
            rate                   REAL NOT NULL,
            specificity_score      INTEGER NOT NULL
        );",
    )?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO payments_enriched VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )?;
        for txn in snapshot.transactions() {
            // Left join: payments for unknown merchants keep NULL
            // merchant attributes.
            let profile = snapshot.merchant(&txn.merchant).ok();
            stmt.execute(params![
                txn.psp_reference,
                txn.merchant,
                txn.card_scheme,
                txn.year,
                txn.month()?,
                txn.day_of_year,
                txn.is_credit,
                txn.eur_amount,
                txn.aci,
                txn.issuing_country,
                txn.acquirer_country,
                txn.intracountry(),
                txn.has_fraudulent_dispute,
                profile.map(|p| p.account_type.as_str()),
                profile.map(|p| p.merchant_category_code),
                profile.map(|p| p.capture_delay_bucket.as_label()),
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO fees_normalized VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )?;
        for rule in snapshot.rules() {
            for account_type in star_strings(&rule.account_type) {
                for mcc in star_numbers(&rule.merchant_category_code) {
                    for aci in star_strings(&rule.aci) {
                        stmt.execute(params![
                            rule.id,
                            rule.card_scheme,
                            account_type,
                            mcc,
                            aci,
                            star_label(rule.capture_delay.value()),
                            star_label(rule.monthly_volume.value()),
                            star_label(rule.monthly_fraud_level.value()),
                            rule.is_credit
                                .value()
                                .map(|b| b.to_string())
                                .unwrap_or_else(|| "*".to_string()),
                            rule.intracountry
                                .value()
                                .map(|b| b.to_string())
                                .unwrap_or_else(|| "*".to_string()),
                            rule.fixed_amount,
                            rule.rate,
                            rule.specificity(),
                        ])?;
                    }
                }
            }
        }
    }
    tx.commit()?;

    conn.execute_batch(
        "CREATE INDEX idx_pe_merchant_month ON payments_enriched(merchant, year, month);
         CREATE INDEX idx_pe_match ON payments_enriched(card_scheme, aci, is_credit, intracountry);
         CREATE INDEX idx_fn_match ON fees_normalized(card_scheme, aci, is_credit, intracountry);
         CREATE INDEX idx_fn_filters ON fees_normalized(account_type, merchant_category_code, capture_delay, monthly_volume, monthly_fraud_level);",
    )?;

    log::info!(
        "exported {} payments and {} fee rules to {path}",
        snapshot.transactions().len(),
        snapshot.rules().len()
    );
    Ok(())
}

/// Wildcard set criteria export as a single "*" row.
fn star_strings(criterion: &SetCriterion<String>) -> Vec<String> {
    match criterion.values() {
        Some(values) => values.iter().cloned().collect(),
        None => vec!["*".to_string()],
    }
}

fn star_numbers(criterion: &SetCriterion<u32>) -> Vec<String> {
    match criterion.values() {
        Some(values) => values.iter().map(|v| v.to_string()).collect(),
        None => vec!["*".to_string()],
    }
}

fn star_label(value: Option<&String>) -> String {
    value.cloned().unwrap_or_else(|| "*".to_string())
}
