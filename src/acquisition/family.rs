//! One independently refreshed metric family.
//!
//! Every refresh takes a ticket; a result is applied only while its ticket is
//! still the most recently issued one, so a slow response can never overwrite
//! a newer one. On failure the previous value stays in place and the family is
//! flagged as showing fallback data.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

use super::retry::{fetch_with_retry, FetchPolicy};
use super::samples::FallbackDataset;
use super::source::{FetchError, MetricSource};
use crate::compare::{assemble, Freshness, Period, TimePeriodComparison, TrendPayload};
use crate::logging::{log_fallback, log_fetch, v_str, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Sample,
    Live,
}

/// What a family currently exposes to readers.
#[derive(Debug)]
pub struct AcquisitionState<T> {
    pub value: Arc<T>,
    pub origin: DataOrigin,
    /// True until the first successful fetch, and again after any failure
    pub using_fallback: bool,
    pub last_error: Option<String>,
    /// Ticket of the refresh that last changed this state
    pub ticket: u64,
    pub updated_at: Option<DateTime<Utc>>,
    pub sample_version: &'static str,
}

impl<T> Clone for AcquisitionState<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            origin: self.origin,
            using_fallback: self.using_fallback,
            last_error: self.last_error.clone(),
            ticket: self.ticket,
            updated_at: self.updated_at,
            sample_version: self.sample_version,
        }
    }
}

impl<T> AcquisitionState<T> {
    fn sample(dataset: FallbackDataset<T>) -> Self {
        Self {
            value: Arc::new(dataset.value),
            origin: DataOrigin::Sample,
            using_fallback: true,
            last_error: None,
            ticket: 0,
            updated_at: None,
            sample_version: dataset.version,
        }
    }

    pub fn freshness(&self) -> Freshness {
        if self.using_fallback {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// Previous value retained
    Failed(FetchError),
    /// A newer refresh was issued while this one was in flight
    Discarded,
}

// =============================================================================
// Decoding
// =============================================================================

pub trait Decoder<T>: Send + Sync {
    fn decode(&self, body: &[u8]) -> Result<T, FetchError>;
}

pub struct JsonDecoder;

impl<T: DeserializeOwned> Decoder<T> for JsonDecoder {
    fn decode(&self, body: &[u8]) -> Result<T, FetchError> {
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Decodes a trend payload and assembles it whole, or rejects it.
pub struct ComparisonAssembler {
    pub period: Period,
}

impl Decoder<TimePeriodComparison> for ComparisonAssembler {
    fn decode(&self, body: &[u8]) -> Result<TimePeriodComparison, FetchError> {
        let payload: TrendPayload =
            serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;
        assemble(self.period, &payload).map_err(|e| FetchError::Incomplete(e.to_string()))
    }
}

// =============================================================================
// Family
// =============================================================================

pub struct Family<T> {
    name: String,
    path: String,
    source: Arc<dyn MetricSource>,
    policy: FetchPolicy,
    decoder: Box<dyn Decoder<T>>,
    interval: Duration,
    state: watch::Sender<AcquisitionState<T>>,
    issued: AtomicU64,
    manual: Notify,
}

impl<T: Send + Sync + 'static> Family<T> {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        source: Arc<dyn MetricSource>,
        policy: FetchPolicy,
        decoder: Box<dyn Decoder<T>>,
        interval: Duration,
        sample: FallbackDataset<T>,
    ) -> Self {
        let (state, _) = watch::channel(AcquisitionState::sample(sample));
        Self {
            name: name.into(),
            path: path.into(),
            source,
            policy,
            decoder,
            interval,
            state,
            issued: AtomicU64::new(0),
            manual: Notify::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn subscribe(&self) -> watch::Receiver<AcquisitionState<T>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AcquisitionState<T> {
        self.state.borrow().clone()
    }

    /// Ask the poll loop for an immediate refresh. Supersedes one in flight.
    pub fn request_refresh(&self) {
        self.manual.notify_one();
    }

    /// Fetch, decode and apply once.
    pub async fn refresh(&self) -> RefreshOutcome {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        log_fetch(Level::Debug, "fetch_start", &self.name, ticket, &[("path", v_str(&self.path))]);
        let started = Instant::now();

        let result = fetch_with_retry(&self.policy, &self.name, || async move {
            let body = self.source.get(&self.path).await?;
            self.decoder.decode(&body)
        })
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(value) => {
                let value = Arc::new(value);
                let applied = self.state.send_if_modified(|s| {
                    if !self.is_current(ticket, s) {
                        return false;
                    }
                    s.value = value;
                    s.origin = DataOrigin::Live;
                    s.using_fallback = false;
                    s.last_error = None;
                    s.ticket = ticket;
                    s.updated_at = Some(Utc::now());
                    true
                });
                if !applied {
                    return self.discarded(ticket);
                }
                log_fetch(Level::Info, "fetch_ok", &self.name, ticket, &[("elapsed_ms", json!(elapsed_ms))]);
                RefreshOutcome::Applied
            }
            Err(err) => {
                let message = err.to_string();
                let mut sample_version = "";
                let applied = self.state.send_if_modified(|s| {
                    if !self.is_current(ticket, s) {
                        return false;
                    }
                    s.using_fallback = true;
                    s.last_error = Some(message.clone());
                    s.ticket = ticket;
                    sample_version = s.sample_version;
                    true
                });
                if !applied {
                    return self.discarded(ticket);
                }
                log_fetch(
                    Level::Warn,
                    "fetch_failed",
                    &self.name,
                    ticket,
                    &[
                        ("kind", v_str(err.kind())),
                        ("error", v_str(&message)),
                        ("elapsed_ms", json!(elapsed_ms)),
                    ],
                );
                log_fallback(&self.name, ticket, &message, sample_version);
                RefreshOutcome::Failed(err)
            }
        }
    }

    fn is_current(&self, ticket: u64, state: &AcquisitionState<T>) -> bool {
        ticket == self.issued.load(Ordering::SeqCst) && ticket > state.ticket
    }

    fn discarded(&self, ticket: u64) -> RefreshOutcome {
        log_fetch(
            Level::Debug,
            "stale_response_discarded",
            &self.name,
            ticket,
            &[("latest", json!(self.issued.load(Ordering::SeqCst)))],
        );
        RefreshOutcome::Discarded
    }

    /// Poll until `shutdown` flips to true. Ticks that fall behind are
    /// delayed rather than bunched up.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        'poll: loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break 'poll;
                    }
                    continue 'poll;
                }
                _ = ticker.tick() => {}
                _ = self.manual.notified() => {}
            }

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break 'poll;
                        }
                    }
                    _ = self.manual.notified() => {
                        log_fetch(
                            Level::Debug,
                            "refresh_superseded",
                            &self.name,
                            self.issued.load(Ordering::SeqCst),
                            &[],
                        );
                        continue;
                    }
                    _ = self.refresh() => break,
                }
            }
        }

        log_fetch(
            Level::Info,
            "poll_loop_stopped",
            &self.name,
            self.issued.load(Ordering::SeqCst),
            &[],
        );
    }
}

/// Type-erased view of a family, so heterogeneous families can be driven
/// together.
#[async_trait]
pub trait PolledFamily: Send + Sync {
    fn name(&self) -> &str;
    fn using_fallback(&self) -> bool;
    fn request_refresh(&self);
    async fn refresh_once(&self) -> RefreshOutcome;
    fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()>;
}

#[async_trait]
impl<T: Send + Sync + 'static> PolledFamily for Family<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn using_fallback(&self) -> bool {
        self.state.borrow().using_fallback
    }

    fn request_refresh(&self) {
        Family::request_refresh(self);
    }

    async fn refresh_once(&self) -> RefreshOutcome {
        self.refresh().await
    }

    fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::samples;
    use crate::model::ConfidenceMetrics;

    struct StaticSource {
        body: Result<&'static str, FetchError>,
    }

    #[async_trait]
    impl MetricSource for StaticSource {
        async fn get(&self, _path: &str) -> Result<Vec<u8>, FetchError> {
            self.body.clone().map(|b| b.as_bytes().to_vec())
        }
    }

    fn policy() -> FetchPolicy {
        FetchPolicy { max_retries: 0, ..Default::default() }
    }

    fn confidence_family(body: Result<&'static str, FetchError>) -> Family<ConfidenceMetrics> {
        Family::new(
            "confidence",
            "/dashboard/confidence",
            Arc::new(StaticSource { body }),
            policy(),
            Box::new(JsonDecoder),
            Duration::from_secs(60),
            samples::confidence(),
        )
    }

    #[test]
    fn test_starts_on_sample_data() {
        let family = confidence_family(Ok("{}"));
        let state = family.snapshot();
        assert_eq!(state.origin, DataOrigin::Sample);
        assert!(state.using_fallback);
        assert_eq!(state.freshness(), Freshness::Stale);
        assert_eq!(state.value.average, 87.4);
    }

    #[tokio::test]
    async fn test_success_replaces_sample() {
        let family = confidence_family(Ok(r#"{"average": 91.5, "high": 3}"#));
        assert_eq!(family.refresh().await, RefreshOutcome::Applied);
        let state = family.snapshot();
        assert_eq!(state.origin, DataOrigin::Live);
        assert!(!state.using_fallback);
        assert_eq!(state.value.average, 91.5);
        assert_eq!(state.ticket, 1);
        assert!(state.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_value() {
        let family = confidence_family(Err(FetchError::Status(500)));
        let outcome = family.refresh().await;
        assert_eq!(outcome, RefreshOutcome::Failed(FetchError::Status(500)));
        let state = family.snapshot();
        assert!(state.using_fallback);
        assert_eq!(state.value.average, 87.4);
        assert_eq!(state.last_error.as_deref(), Some("unexpected status 500"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_a_failure() {
        let family = confidence_family(Ok("<html>"));
        assert!(matches!(family.refresh().await, RefreshOutcome::Failed(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_incomplete_trend_payload_is_rejected() {
        let family: Family<TimePeriodComparison> = Family::new(
            "trends:week",
            "/dashboard/trends?period=week",
            Arc::new(StaticSource { body: Ok(r#"{"severity": {}, "categories": []}"#) }),
            policy(),
            Box::new(ComparisonAssembler { period: Period::Week }),
            Duration::from_secs(120),
            samples::comparison(Period::Week),
        );
        let outcome = family.refresh().await;
        assert!(matches!(outcome, RefreshOutcome::Failed(FetchError::Incomplete(_))));
        assert_eq!(family.snapshot().freshness(), Freshness::Stale);
        assert_eq!(family.snapshot().value.overall.current, 3892);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let family = Arc::new(confidence_family(Ok(r#"{"average": 50.0}"#)));
        let (tx, rx) = watch::channel(false);
        let handle = family.clone().spawn(rx);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!family.snapshot().using_fallback);
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
