//! Acquisition end to end against an in-process scripted source.
//!
//! Time is paused, so timeouts and slow responses resolve deterministically.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

use riskpulse::acquisition::{Acquisition, DataOrigin, FetchError, MetricSource, RefreshOutcome};
use riskpulse::compare::{Freshness, Period};
use riskpulse::config::Config;
use riskpulse::trend::Trend;

struct Step {
    delay: Duration,
    result: Result<String, FetchError>,
}

/// Per-path queue of scripted responses. Unscripted paths fail as network
/// errors.
#[derive(Default)]
struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn push(&self, path: &str, delay_ms: u64, result: Result<&str, FetchError>) {
        let step = Step {
            delay: Duration::from_millis(delay_ms),
            result: result.map(str::to_string),
        };
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(step);
    }
}

#[async_trait]
impl MetricSource for ScriptedSource {
    async fn get(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|q| q.pop_front());
        match step {
            Some(step) => {
                sleep(step.delay).await;
                step.result.map(String::into_bytes)
            }
            None => Err(FetchError::Network(format!("unscripted path {}", path))),
        }
    }
}

fn setup() -> (Arc<ScriptedSource>, Acquisition) {
    let source = Arc::new(ScriptedSource::default());
    let cfg = Config { retry_budget: 0, ..Config::default() };
    let acq = Acquisition::new(&cfg, source.clone());
    (source, acq)
}

const WEEK: &str = "/dashboard/trends?period=week";

const FULL_TREND: &str = r#"{
    "period": "week",
    "severity": {
        "low": {"current": 120, "previous": 100},
        "medium": {"current": 80, "previous": 80},
        "high": {"current": 30, "previous": 40},
        "critical": {"current": 5, "previous": 0}
    },
    "categories": [
        {"category": "security_risk", "current": 60, "previous": 50},
        {"category": "strategic_risk", "current": 10, "previous": 12}
    ],
    "overall": {"current": 235, "previous": 220}
}"#;

#[tokio::test(start_paused = true)]
async fn test_timeout_keeps_sample_until_manual_refresh_succeeds() {
    let (source, acq) = setup();
    source.push("/dashboard/confidence", 10_000, Ok(r#"{"average": 10.0}"#));
    source.push("/dashboard/confidence", 0, Ok(r#"{"average": 92.1, "high": 40}"#));

    let outcome = acq.confidence.refresh().await;
    assert_eq!(outcome, RefreshOutcome::Failed(FetchError::Timeout(Duration::from_secs(3))));
    let state = acq.confidence.snapshot();
    assert!(state.using_fallback);
    assert_eq!(state.origin, DataOrigin::Sample);
    assert_eq!(state.value.average, 87.4);
    assert!(state.last_error.unwrap().contains("timed out"));

    assert_eq!(acq.confidence.refresh().await, RefreshOutcome::Applied);
    let state = acq.confidence.snapshot();
    assert!(!state.using_fallback);
    assert_eq!(state.value.average, 92.1);
    assert!(state.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_earlier_response_never_overwrites_newer_one() {
    let (source, acq) = setup();
    source.push("/dashboard/summary", 2_000, Ok(r#"{"totals": {"articles": 1, "risks": 1}}"#));
    source.push("/dashboard/summary", 10, Ok(r#"{"totals": {"articles": 2, "risks": 2}}"#));

    let family = acq.summary.clone();
    let (first, second) = tokio::join!(family.refresh(), async {
        sleep(Duration::from_millis(100)).await;
        family.refresh().await
    });

    assert_eq!(second, RefreshOutcome::Applied);
    assert_eq!(first, RefreshOutcome::Discarded);
    let state = acq.summary.snapshot();
    assert_eq!(state.value.totals.risks, 2);
    assert_eq!(state.ticket, 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_earlier_failure_never_flags_newer_success() {
    let (source, acq) = setup();
    source.push("/dashboard/industries", 2_000, Err(FetchError::Status(502)));
    source.push("/dashboard/industries", 10, Ok(r#"{"public": {"Defense & Military": 7}}"#));

    let family = acq.industries.clone();
    let (first, second) = tokio::join!(family.refresh(), async {
        sleep(Duration::from_millis(100)).await;
        family.refresh().await
    });

    assert_eq!(first, RefreshOutcome::Discarded);
    assert_eq!(second, RefreshOutcome::Applied);
    let state = acq.industries.snapshot();
    assert!(!state.using_fallback);
    assert_eq!(state.value.grand_total(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_partial_trend_payload_stays_stale() {
    let (source, acq) = setup();
    source.push(WEEK, 0, Ok(r#"{"severity": {}, "categories": []}"#));
    source.push(WEEK, 0, Ok(FULL_TREND));

    let weekly = acq.comparison(Period::Week);
    let outcome = weekly.refresh().await;
    assert!(matches!(outcome, RefreshOutcome::Failed(FetchError::Incomplete(_))));
    let state = weekly.snapshot();
    assert_eq!(state.freshness(), Freshness::Stale);
    assert_eq!(state.value.overall.current, 3892);

    assert_eq!(weekly.refresh().await, RefreshOutcome::Applied);
    let state = weekly.snapshot();
    assert_eq!(state.freshness(), Freshness::Fresh);
    let cmp = &state.value;
    assert_eq!(cmp.overall.change, 15);
    assert_eq!(cmp.severity.medium.trend, Trend::Stable);
    assert_eq!(cmp.severity.high.trend, Trend::Down);
    assert!(!cmp.severity.critical.percent_defined);
    assert_eq!(cmp.severity.critical.display_percent(), "N/A");
    // primary section absent: rolled up from the two tags
    assert_eq!(cmp.primary_categories.technical.current, 60);
    assert_eq!(cmp.primary_categories.business.current, 10);
    assert_eq!(cmp.primary_categories.operational.trend, Trend::Stable);

    // the other period is untouched
    assert_eq!(acq.comparison(Period::Month).snapshot().freshness(), Freshness::Stale);
}

#[tokio::test(start_paused = true)]
async fn test_families_fail_independently() {
    let (source, acq) = setup();
    source.push("/dashboard/risk-categories", 0, Ok(r#"{"secondary": {"data_risk": 9}}"#));

    let outcomes = acq.refresh_all().await;
    assert_eq!(outcomes.len(), 10);
    let applied: Vec<&str> = outcomes
        .iter()
        .filter(|(_, o)| *o == RefreshOutcome::Applied)
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(applied, vec!["risk_categories"]);

    assert!(!acq.risk_categories.snapshot().using_fallback);
    assert_eq!(acq.summary.snapshot().value.totals.articles, 10247);
    assert!(acq.is_using_fallback());
}

#[tokio::test(start_paused = true)]
async fn test_manual_refresh_supersedes_in_flight_poll() {
    let (source, mut acq) = setup();
    source.push("/dashboard/confidence", 2_000, Ok(r#"{"average": 1.0}"#));
    source.push("/dashboard/confidence", 10, Ok(r#"{"average": 2.0}"#));

    acq.start();
    sleep(Duration::from_millis(100)).await;
    acq.confidence.request_refresh();
    sleep(Duration::from_millis(50)).await;
    assert_eq!(acq.confidence.snapshot().value.average, 2.0);

    // the superseded slow response never lands
    sleep(Duration::from_secs(5)).await;
    assert_eq!(acq.confidence.snapshot().value.average, 2.0);

    acq.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_poll_loops_refetch_on_interval_and_stop() {
    let (source, mut acq) = setup();
    source.push("/dashboard/confidence", 0, Ok(r#"{"average": 50.0}"#));
    source.push("/dashboard/confidence", 0, Ok(r#"{"average": 60.0}"#));

    acq.start();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(acq.confidence.snapshot().value.average, 50.0);

    sleep(Duration::from_secs(61)).await;
    assert_eq!(acq.confidence.snapshot().value.average, 60.0);

    acq.shutdown().await;
    let calls = source.calls.load(Ordering::SeqCst);
    sleep(Duration::from_secs(600)).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), calls);
}
