//! Acquisition of every dashboard metric family.
//!
//! Each family is fetched, validated and replaced independently; one failing
//! endpoint never blocks or blanks another.

pub mod family;
pub mod retry;
pub mod samples;
pub mod source;

use anyhow::Result;
use futures_util::future::join_all;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::compare::{Period, TimePeriodComparison};
use crate::config::Config;
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::{
    Article, ConfidenceMetrics, DashboardSummary, Extraction, IndustryDistribution, Job,
    JobsSummary, RiskCategoryDistribution,
};

pub use family::{
    AcquisitionState, ComparisonAssembler, DataOrigin, Decoder, Family, JsonDecoder,
    PolledFamily, RefreshOutcome,
};
pub use retry::FetchPolicy;
pub use samples::FallbackDataset;
pub use source::{FetchError, HttpSource, MetricSource};

pub fn trend_path(period: Period) -> String {
    format!("/dashboard/trends?period={}", period.as_str())
}

fn trend_family_name(period: Period) -> String {
    format!("trends:{}", period.as_str())
}

fn log_sample<T: serde::Serialize>(family: &str, dataset: &FallbackDataset<T>) {
    log(
        Level::Debug,
        Domain::Acquisition,
        "sample_loaded",
        obj(&[
            ("family", v_str(family)),
            ("sample_version", v_str(dataset.version)),
            ("fingerprint", v_str(&dataset.fingerprint())),
        ]),
    );
}

pub struct Acquisition {
    pub summary: Arc<Family<DashboardSummary>>,
    pub jobs_summary: Arc<Family<JobsSummary>>,
    pub risk_categories: Arc<Family<RiskCategoryDistribution>>,
    pub industries: Arc<Family<IndustryDistribution>>,
    pub confidence: Arc<Family<ConfidenceMetrics>>,
    pub weekly: Arc<Family<TimePeriodComparison>>,
    pub monthly: Arc<Family<TimePeriodComparison>>,
    pub jobs: Arc<Family<Vec<Job>>>,
    pub articles: Arc<Family<Vec<Article>>>,
    pub risks: Arc<Family<Vec<Extraction>>>,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Acquisition {
    pub fn new(cfg: &Config, source: Arc<dyn MetricSource>) -> Self {
        let policy = FetchPolicy::from_config(cfg);
        let fast = cfg.fast_poll_interval();
        let slow = cfg.trend_poll_interval();

        fn json_family<T>(
            name: &str,
            path: &str,
            source: &Arc<dyn MetricSource>,
            policy: &FetchPolicy,
            every: Duration,
            sample: FallbackDataset<T>,
        ) -> Arc<Family<T>>
        where
            T: serde::de::DeserializeOwned + serde::Serialize + Send + Sync + 'static,
        {
            log_sample(name, &sample);
            Arc::new(Family::new(
                name,
                path,
                Arc::clone(source),
                policy.clone(),
                Box::new(JsonDecoder),
                every,
                sample,
            ))
        }

        let trend_family = |period: Period| {
            let sample = samples::comparison(period);
            log_sample(&trend_family_name(period), &sample);
            Arc::new(Family::new(
                trend_family_name(period),
                trend_path(period),
                Arc::clone(&source),
                policy.clone(),
                Box::new(ComparisonAssembler { period }) as Box<dyn Decoder<TimePeriodComparison>>,
                slow,
                sample,
            ))
        };

        let (shutdown, _) = watch::channel(false);
        Self {
            summary: json_family("summary", "/dashboard/summary", &source, &policy, fast, samples::dashboard_summary()),
            jobs_summary: json_family("jobs_summary", "/dashboard/jobs/summary", &source, &policy, fast, samples::jobs_summary()),
            risk_categories: json_family("risk_categories", "/dashboard/risk-categories", &source, &policy, fast, samples::risk_categories()),
            industries: json_family("industries", "/dashboard/industries", &source, &policy, fast, samples::industries()),
            confidence: json_family("confidence", "/dashboard/confidence", &source, &policy, fast, samples::confidence()),
            weekly: trend_family(Period::Week),
            monthly: trend_family(Period::Month),
            jobs: json_family("jobs", "/dashboard/jobs", &source, &policy, fast, samples::jobs()),
            articles: json_family("articles", "/dashboard/articles", &source, &policy, fast, samples::articles()),
            risks: json_family("risks", "/dashboard/risks", &source, &policy, fast, samples::risks()),
            shutdown,
            handles: Vec::new(),
        }
    }

    /// Acquisition against the configured HTTP API.
    pub fn http(cfg: &Config) -> Result<Self> {
        let source = HttpSource::new(&cfg.api_base_url, cfg.fetch_timeout())?;
        Ok(Self::new(cfg, Arc::new(source)))
    }

    pub fn families(&self) -> Vec<Arc<dyn PolledFamily>> {
        let families: [Arc<dyn PolledFamily>; 10] = [
            self.summary.clone(),
            self.jobs_summary.clone(),
            self.risk_categories.clone(),
            self.industries.clone(),
            self.confidence.clone(),
            self.weekly.clone(),
            self.monthly.clone(),
            self.jobs.clone(),
            self.articles.clone(),
            self.risks.clone(),
        ];
        families.into()
    }

    pub fn comparison(&self, period: Period) -> &Arc<Family<TimePeriodComparison>> {
        match period {
            Period::Week => &self.weekly,
            Period::Month => &self.monthly,
        }
    }

    /// Spawn one poll loop per family. Calling twice is a no-op.
    pub fn start(&mut self) {
        if !self.handles.is_empty() {
            return;
        }
        let families = self.families();
        log(
            Level::Info,
            Domain::System,
            "acquisition_started",
            obj(&[("families", json!(families.len()))]),
        );
        self.handles = families
            .into_iter()
            .map(|f| f.spawn(self.shutdown.subscribe()))
            .collect();
    }

    /// Stop every poll loop and wait for them to exit. In-flight fetches
    /// are dropped and never applied.
    pub async fn shutdown(&mut self) {
        self.shutdown.send_replace(true);
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                log(
                    Level::Error,
                    Domain::System,
                    "poll_loop_panicked",
                    obj(&[("error", v_str(&e.to_string()))]),
                );
            }
        }
        log(Level::Info, Domain::System, "acquisition_stopped", obj(&[]));
    }

    /// Refresh every family concurrently and wait for all of them.
    pub async fn refresh_all(&self) -> Vec<(String, RefreshOutcome)> {
        let families = self.families();
        let outcomes = join_all(families.iter().map(|f| f.refresh_once())).await;
        families
            .iter()
            .map(|f| f.name().to_string())
            .zip(outcomes)
            .collect()
    }

    /// Ask every running poll loop for an immediate refresh.
    pub fn request_refresh_all(&self) {
        for family in self.families() {
            family.request_refresh();
        }
    }

    /// True while any family is showing sample or last-known data.
    pub fn is_using_fallback(&self) -> bool {
        self.families().iter().any(|f| f.using_fallback())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl MetricSource for Unreachable {
        async fn get(&self, _path: &str) -> std::result::Result<Vec<u8>, FetchError> {
            Err(FetchError::Network("connection refused".into()))
        }
    }

    fn offline() -> Acquisition {
        let cfg = Config { retry_budget: 0, ..Config::default() };
        Acquisition::new(&cfg, Arc::new(Unreachable))
    }

    #[test]
    fn test_trend_paths() {
        assert_eq!(trend_path(Period::Week), "/dashboard/trends?period=week");
        assert_eq!(trend_path(Period::Month), "/dashboard/trends?period=month");
    }

    #[test]
    fn test_starts_with_fallback_flag_set() {
        let acq = offline();
        assert!(acq.is_using_fallback());
        assert_eq!(acq.families().len(), 10);
        assert_eq!(acq.comparison(Period::Month).snapshot().value.period, Period::Month);
    }

    #[tokio::test]
    async fn test_refresh_all_failures_keep_samples() {
        let acq = offline();
        let outcomes = acq.refresh_all().await;
        assert_eq!(outcomes.len(), 10);
        assert!(outcomes
            .iter()
            .all(|(_, o)| matches!(o, RefreshOutcome::Failed(FetchError::Network(_)))));
        assert!(acq.is_using_fallback());
        assert_eq!(acq.summary.snapshot().value.totals.risks, 3892);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_shutdown() {
        let mut acq = offline();
        acq.start();
        acq.start();
        tokio::time::sleep(Duration::from_millis(5)).await;
        acq.shutdown().await;
        assert!(acq.is_using_fallback());
    }
}
