use std::time::Duration;

use crate::normalize::HeatThresholds;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub fetch_timeout_ms: u64,
    /// Extra attempts after the first one fails (0 or 1 in practice)
    pub retry_budget: u32,
    pub retry_base_ms: u64,
    /// Summary, jobs, categories, industries, confidence and listings
    pub fast_poll_secs: u64,
    /// Week-over-week and month-over-month comparisons
    pub trend_poll_secs: u64,
    pub heat_thresholds: [u64; 4],
    pub top_industries_per_sector: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            fetch_timeout_ms: 3000,
            retry_budget: 1,
            retry_base_ms: 200,
            fast_poll_secs: 60,
            trend_poll_secs: 120,
            heat_thresholds: [15, 25, 35, 45],
            top_industries_per_sector: 4,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(d.api_base_url),
            fetch_timeout_ms: env_or("FETCH_TIMEOUT_MS", d.fetch_timeout_ms),
            retry_budget: env_or("RETRY_BUDGET", d.retry_budget),
            retry_base_ms: env_or("RETRY_BASE_MS", d.retry_base_ms),
            fast_poll_secs: env_or("FAST_POLL_SECS", d.fast_poll_secs),
            trend_poll_secs: env_or("TREND_POLL_SECS", d.trend_poll_secs),
            heat_thresholds: [
                env_or("HEAT_T1", d.heat_thresholds[0]),
                env_or("HEAT_T2", d.heat_thresholds[1]),
                env_or("HEAT_T3", d.heat_thresholds[2]),
                env_or("HEAT_T4", d.heat_thresholds[3]),
            ],
            top_industries_per_sector: env_or(
                "TOP_INDUSTRIES_PER_SECTOR",
                d.top_industries_per_sector,
            ),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn fast_poll_interval(&self) -> Duration {
        Duration::from_secs(self.fast_poll_secs.max(1))
    }

    pub fn trend_poll_interval(&self) -> Duration {
        Duration::from_secs(self.trend_poll_secs.max(1))
    }

    pub fn heat(&self) -> HeatThresholds {
        HeatThresholds::new(self.heat_thresholds)
    }
}
