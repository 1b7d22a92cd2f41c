//! One-shot: fetch every family once and print the derived views as JSON.
//!
//! Usage: snapshot [week|month]

use anyhow::Result;
use serde_json::json;
use std::env;

use riskpulse::acquisition::{Acquisition, RefreshOutcome};
use riskpulse::compare::Period;
use riskpulse::config::Config;
use riskpulse::listing::{count_by_severity, distinct_sectors, risk_matrix};
use riskpulse::views::digest;

#[tokio::main]
async fn main() -> Result<()> {
    let period: Period = env::args()
        .nth(1)
        .unwrap_or_else(|| "week".to_string())
        .parse()?;
    let cfg = Config::from_env();
    let acq = Acquisition::http(&cfg)?;

    let outcomes: Vec<_> = acq
        .refresh_all()
        .await
        .into_iter()
        .map(|(family, outcome)| {
            let status = match outcome {
                RefreshOutcome::Applied => "live".to_string(),
                RefreshOutcome::Failed(e) => format!("fallback ({})", e),
                RefreshOutcome::Discarded => "discarded".to_string(),
            };
            json!({"family": family, "status": status})
        })
        .collect();

    let risks = acq.risks.snapshot();
    let out = json!({
        "families": outcomes,
        "digest": digest(&acq, period, &cfg),
        "risks": {
            "critical": count_by_severity(&risks.value, 5),
            "high": count_by_severity(&risks.value, 4),
            "sectors": distinct_sectors(&risks.value),
            "matrix": risk_matrix(&risks.value),
        },
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
