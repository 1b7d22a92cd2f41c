use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Why a fetch produced no usable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Timeout(Duration),
    Network(String),
    Status(u16),
    Decode(String),
    /// Parsed, but a required section was absent
    Incomplete(String),
}

impl FetchError {
    /// Transient failures worth another attempt within the retry budget.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Network(_) => true,
            FetchError::Status(code) => is_retryable_http_status(*code),
            FetchError::Decode(_) | FetchError::Incomplete(_) => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "timeout",
            FetchError::Network(_) => "network",
            FetchError::Status(_) => "status",
            FetchError::Decode(_) => "decode",
            FetchError::Incomplete(_) => "incomplete",
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout(d) => write!(f, "timed out after {}ms", d.as_millis()),
            FetchError::Network(e) => write!(f, "network error: {}", e),
            FetchError::Status(code) => write!(f, "unexpected status {}", code),
            FetchError::Decode(e) => write!(f, "undecodable payload: {}", e),
            FetchError::Incomplete(e) => write!(f, "incomplete payload: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}

pub fn is_retryable_http_status(status: u16) -> bool {
    matches!(status,
        408 |   // Request Timeout
        429 |   // Too Many Requests
        500 |   // Internal Server Error
        502 |   // Bad Gateway
        503 |   // Service Unavailable
        504     // Gateway Timeout
    )
}

/// Read side of the dashboard API: raw body bytes for a path + query.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn get(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpSource {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        // Trailing slash so relative joins keep any path prefix on the base
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base: Url::parse(&normalized)?,
            timeout,
        })
    }

    pub fn url_for(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::Network(e.to_string()))
    }
}

fn classify_reqwest(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout)
    } else if let Some(status) = err.status() {
        FetchError::Status(status.as_u16())
    } else {
        FetchError::Network(err.to_string())
    }
}

#[async_trait]
impl MetricSource for HttpSource {
    async fn get(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(path)?;
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| classify_reqwest(e, self.timeout))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| classify_reqwest(e, self.timeout))?;
        Ok(body.to_vec())
    }
}
