//! fee-runner: headless query runner for the fee determination engine.
//!
//! Usage:
//!   fee-runner --data-dir ./data
//!   fee-runner --data-dir ./data --query '{"type":"total_fees","merchant":"Book_Nook","year":2023,"month":3}'
//!   fee-runner --data-dir ./data --ipc-mode
//!   fee-runner --data-dir ./data --export-db analysis.sqlite

mod datasource;

use anyhow::Result;
use feedesk_core::{
    overlay::RuleField,
    query::{Dimension, Objective, RuleFilter},
    snapshot::{DeskSnapshot, TimeWindow},
};
use std::env;
use std::io::{self, BufRead, Write};

/// The closed set of query intents the runner answers. Routing is a
/// tagged enum, never free-form pattern matching on question text.
#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum QueryIntent {
    ApplicableFeeIds {
        merchant: String,
        year: u16,
        #[serde(default)]
        month: Option<u8>,
        #[serde(default)]
        day: Option<u16>,
    },
    TotalFees {
        merchant: String,
        year: u16,
        #[serde(default)]
        month: Option<u8>,
        #[serde(default)]
        day: Option<u16>,
    },
    FeeDelta {
        merchant: String,
        year: u16,
        #[serde(default)]
        month: Option<u8>,
        rule_id: u32,
        field: String,
        new_value: f64,
    },
    SchemeSteering {
        merchant: String,
        year: u16,
        #[serde(default)]
        month: Option<u8>,
        objective: String,
    },
    AciIncentive {
        merchant: String,
        year: u16,
        #[serde(default)]
        month: Option<u8>,
        /// Restrict to transactions with a fraudulent dispute, the
        /// "move the fraudulent traffic" scenario.
        #[serde(default)]
        fraud_only: bool,
    },
    AffectedMerchants {
        rule_id: u32,
        #[serde(default)]
        account_type: Option<String>,
    },
    FeeIdsByCriteria {
        #[serde(default)]
        account_type: Option<String>,
        #[serde(default)]
        aci: Option<String>,
    },
    AverageRuleFee {
        #[serde(default)]
        card_scheme: Option<String>,
        #[serde(default)]
        account_type: Option<String>,
        #[serde(default)]
        merchant_category_code: Option<u32>,
        #[serde(default)]
        aci: Option<String>,
        #[serde(default)]
        is_credit: Option<bool>,
        amount: f64,
    },
    BestScheme {
        amount: f64,
        objective: String,
    },
    ExtremeMcc {
        amount: f64,
        objective: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");
    let export_db = args
        .windows(2)
        .find(|w| w[0] == "--export-db")
        .map(|w| w[1].as_str());
    let query = args
        .windows(2)
        .find(|w| w[0] == "--query")
        .map(|w| w[1].as_str());
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");

    let snapshot = feedesk_core::dataset::load_snapshot(data_dir)?;

    if let Some(path) = export_db {
        datasource::export(&snapshot, path)?;
        println!("Wrote {path}");
        return Ok(());
    }

    if let Some(intent_json) = query {
        let intent: QueryIntent = serde_json::from_str(intent_json)?;
        let answer = answer_intent(&snapshot, intent)?;
        println!("{}", serde_json::to_string(&answer)?);
        return Ok(());
    }

    if ipc_mode {
        return run_ipc_loop(&snapshot);
    }

    print_summary(&snapshot, data_dir);
    Ok(())
}

/// Line-based JSON loop: one QueryIntent per stdin line, one JSON
/// answer (or error object) per stdout line.
fn run_ipc_loop(snapshot: &DeskSnapshot) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<QueryIntent>(&buffer) {
            Ok(intent) => match answer_intent(snapshot, intent) {
                Ok(answer) => serde_json::json!({ "answer": answer }),
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn answer_intent(snapshot: &DeskSnapshot, intent: QueryIntent) -> Result<serde_json::Value> {
    match intent {
        QueryIntent::ApplicableFeeIds {
            merchant,
            year,
            month,
            day,
        } => {
            let txns = snapshot.merchant_transactions(&merchant, year, window(month, day))?;
            let ids = snapshot.applicable_rule_ids(&txns)?;
            Ok(serde_json::json!(ids))
        }
        QueryIntent::TotalFees {
            merchant,
            year,
            month,
            day,
        } => {
            let txns = snapshot.merchant_transactions(&merchant, year, window(month, day))?;
            let total = snapshot.total_fee(&txns)?;
            Ok(serde_json::json!(total))
        }
        QueryIntent::FeeDelta {
            merchant,
            year,
            month,
            rule_id,
            field,
            new_value,
        } => {
            let txns = snapshot.merchant_transactions(&merchant, year, window(month, None))?;
            let delta = snapshot.fee_delta(&txns, rule_id, parse_field(&field)?, new_value)?;
            Ok(serde_json::json!(delta))
        }
        QueryIntent::SchemeSteering {
            merchant,
            year,
            month,
            objective,
        } => {
            let txns = snapshot.merchant_transactions(&merchant, year, window(month, None))?;
            let (scheme, total) = snapshot.best_dimension_value(
                &txns,
                Dimension::CardScheme,
                parse_objective(&objective)?,
            )?;
            Ok(serde_json::json!({ "value": scheme, "total_fee": total }))
        }
        QueryIntent::AciIncentive {
            merchant,
            year,
            month,
            fraud_only,
        } => {
            let mut txns = snapshot.merchant_transactions(&merchant, year, window(month, None))?;
            if fraud_only {
                txns.retain(|txn| txn.has_fraudulent_dispute);
            }
            let (aci, total) =
                snapshot.best_dimension_value(&txns, Dimension::Aci, Objective::Cheapest)?;
            Ok(serde_json::json!({ "value": aci, "total_fee": total }))
        }
        QueryIntent::AffectedMerchants {
            rule_id,
            account_type,
        } => {
            let merchants = snapshot.affected_merchants(rule_id, account_type.as_deref())?;
            Ok(serde_json::json!(merchants))
        }
        QueryIntent::FeeIdsByCriteria { account_type, aci } => {
            let filter = RuleFilter {
                account_type,
                aci,
                ..RuleFilter::default()
            };
            Ok(serde_json::json!(snapshot.rule_ids_where(&filter)))
        }
        QueryIntent::AverageRuleFee {
            card_scheme,
            account_type,
            merchant_category_code,
            aci,
            is_credit,
            amount,
        } => {
            let filter = RuleFilter {
                card_scheme,
                account_type,
                merchant_category_code,
                aci,
                is_credit,
            };
            Ok(serde_json::json!(snapshot.average_rule_fee(&filter, amount)?))
        }
        QueryIntent::BestScheme { amount, objective } => {
            let (scheme, average) =
                snapshot.best_scheme_by_average_fee(amount, parse_objective(&objective)?)?;
            Ok(serde_json::json!({ "value": scheme, "average_fee": average }))
        }
        QueryIntent::ExtremeMcc { amount, objective } => {
            let mccs = snapshot.extreme_mcc_by_average_fee(amount, parse_objective(&objective)?)?;
            Ok(serde_json::json!(mccs))
        }
    }
}

/// Day beats month beats whole-year, matching how questions narrow.
fn window(month: Option<u8>, day: Option<u16>) -> TimeWindow {
    match (day, month) {
        (Some(day), _) => TimeWindow::Day(day),
        (None, Some(month)) => TimeWindow::Month(month),
        (None, None) => TimeWindow::Year,
    }
}

fn parse_field(field: &str) -> Result<RuleField> {
    match field {
        "rate" => Ok(RuleField::Rate),
        "fixed_amount" => Ok(RuleField::FixedAmount),
        other => anyhow::bail!("unknown rule field '{other}' (expected rate or fixed_amount)"),
    }
}

fn parse_objective(objective: &str) -> Result<Objective> {
    match objective {
        "cheapest" | "minimum" => Ok(Objective::Cheapest),
        "most_expensive" | "maximum" => Ok(Objective::MostExpensive),
        other => anyhow::bail!(
            "unknown objective '{other}' (expected cheapest or most_expensive)"
        ),
    }
}

fn print_summary(snapshot: &DeskSnapshot, data_dir: &str) {
    println!("fee-runner — dataset summary");
    println!("  data_dir:     {data_dir}");
    println!("  fee rules:    {}", snapshot.rules().len());
    println!("  merchants:    {}", snapshot.merchants().count());
    println!("  transactions: {}", snapshot.transactions().len());
    println!("  card schemes: {}", snapshot.card_schemes().join(", "));
    println!("  acis:         {}", snapshot.acis().join(", "));
}
