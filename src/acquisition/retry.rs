use rand::Rng;
use std::future::Future;
use tokio::time::{sleep, timeout, Duration};

use super::source::FetchError;
use crate::logging::{log, obj, v_str, Domain, Level};
use serde_json::json;

/// Per-family fetch policy: bounded attempt time plus a small retry budget.
#[derive(Clone, Debug)]
pub struct FetchPolicy {
    pub timeout: Duration,
    /// Extra attempts after the first failure
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            max_retries: 1,
            base_delay_ms: 200,
            max_delay_ms: 2000,
            jitter_factor: 0.3,
        }
    }
}

impl FetchPolicy {
    pub fn from_config(cfg: &crate::config::Config) -> Self {
        Self {
            timeout: cfg.fetch_timeout(),
            max_retries: cfg.retry_budget,
            base_delay_ms: cfg.retry_base_ms,
            ..Default::default()
        }
    }

    /// Exponential backoff with ±jitter_factor jitter
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms as f64 * 2.0_f64.powi(attempt as i32);
        let clamped = base.min(self.max_delay_ms as f64);

        let jitter_range = clamped * self.jitter_factor;
        let jitter: f64 = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };
        Duration::from_millis((clamped + jitter).max(0.0) as u64)
    }
}

/// Run `operation` under the policy's timeout, retrying transient failures
/// up to `max_retries` extra times.
pub async fn fetch_with_retry<F, Fut, T>(
    policy: &FetchPolicy,
    family: &str,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        let outcome = match timeout(policy.timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(policy.timeout)),
        };
        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries && e.is_retryable() => {
                let delay = policy.delay_for_attempt(attempt);
                log(
                    Level::Warn,
                    Domain::Acquisition,
                    "retry",
                    obj(&[
                        ("family", v_str(family)),
                        ("attempt", json!(attempt + 1)),
                        ("of", json!(policy.max_retries + 1)),
                        ("error", v_str(&e.to_string())),
                        ("delay_ms", json!(delay.as_millis() as u64)),
                    ]),
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
