use anyhow::Result;
use serde_json::json;

use riskpulse::acquisition::Acquisition;
use riskpulse::compare::Period;
use riskpulse::config::Config;
use riskpulse::logging::{json_log, log, obj, v_num, v_str, Domain, Level};
use riskpulse::views::{digest, DashboardDigest};

fn log_digest(d: &DashboardDigest) {
    let categories: Vec<_> = d
        .categories
        .iter()
        .map(|c| json!({"category": c.category.as_str(), "value": c.value, "share": c.share}))
        .collect();
    json_log(
        "digest",
        obj(&[
            ("period", v_str(d.period.as_str())),
            ("freshness", json!(d.freshness)),
            ("using_fallback", json!(d.using_fallback)),
            ("risks", json!(d.totals.risks)),
            ("overall", v_str(&d.overall_display)),
            ("overall_percent", v_str(&d.overall.display_percent())),
            ("categories", json!(categories)),
            ("job_success_rate", v_num(d.job_success_rate)),
            ("activity_max_week", json!(d.activity.max_week_total)),
        ]),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("api_base_url", v_str(&cfg.api_base_url)),
            ("fetch_timeout_ms", json!(cfg.fetch_timeout_ms)),
            ("retry_budget", json!(cfg.retry_budget)),
            ("fast_poll_secs", json!(cfg.fast_poll_secs)),
            ("trend_poll_secs", json!(cfg.trend_poll_secs)),
            ("heat_thresholds", json!(cfg.heat().bounds())),
        ]),
    );

    let mut acq = Acquisition::http(&cfg)?;
    let mut summary_rx = acq.summary.subscribe();
    let mut categories_rx = acq.risk_categories.subscribe();
    let mut weekly_rx = acq.weekly.subscribe();
    let mut monthly_rx = acq.monthly.subscribe();
    acq.start();

    log_digest(&digest(&acq, Period::Week, &cfg));

    loop {
        let period = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Ok(()) = summary_rx.changed() => Period::Week,
            Ok(()) = categories_rx.changed() => Period::Week,
            Ok(()) = weekly_rx.changed() => Period::Week,
            Ok(()) = monthly_rx.changed() => Period::Month,
        };
        log_digest(&digest(&acq, period, &cfg));
    }

    log(Level::Info, Domain::System, "shutdown_requested", obj(&[]));
    acq.shutdown().await;
    Ok(())
}
