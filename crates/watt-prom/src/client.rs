//! Metrics backend trait and implementations.
//!
//! The engine consumes exactly two read-only operations from the backend:
//! an instantaneous query and a range query. Both are idempotent and
//! side-effect free, so callers may issue them concurrently and retry
//! freely. [`HttpBackend`] talks to a real Prometheus-compatible server;
//! [`StaticBackend`] serves canned responses for tests and demos.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;
use url::Url;

use watt_engine::{RangeSeries, ScalarSample};

use crate::error::{PromError, Result};
use crate::wire;

/// Default per-request timeout for the HTTP backend.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A read-only metrics backend.
///
/// Expressions are opaque strings; the backend evaluates them and returns
/// decoded samples or series. Implementations must be cheap to share
/// across concurrently polling views.
pub trait MetricsBackend: Send + Sync {
    /// Evaluates an instantaneous query.
    ///
    /// A successful query with no matching series returns an empty vector,
    /// which is a normal "no data" state rather than an error.
    fn query(&self, expr: &str) -> impl Future<Output = Result<Vec<ScalarSample>>> + Send;

    /// Evaluates a range query over the trailing window ending at `end_ms`.
    ///
    /// The step is always computed internally as `window / sample_count`
    /// so that every simultaneously issued range query lands on the same
    /// timestamp axis; callers never supply their own step.
    fn query_range(
        &self,
        expr: &str,
        end_ms: i64,
        window_ms: i64,
        sample_count: u32,
    ) -> impl Future<Output = Result<Vec<RangeSeries>>> + Send;
}

/// HTTP client for a Prometheus-compatible query API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpBackend {
    /// Creates a backend for the server rooted at `endpoint`.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{path}", self.endpoint.as_str().trim_end_matches('/'));
        Url::parse(&raw).map_err(|e| PromError::Transport {
            reason: format!("bad query url: {e}"),
        })
    }

    async fn fetch(&self, url: Url, params: &[(&str, String)]) -> Result<wire::Envelope> {
        let response = self
            .client
            .get(url)
            .query(params)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PromError::Status {
                code: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| PromError::Decode {
            reason: e.to_string(),
        })
    }
}

/// Computes the `start`/`end`/`step` parameters for a range request.
///
/// Returned values are in float seconds, evenly spacing `sample_count`
/// samples across the window.
fn range_params(
    end_ms: i64,
    window_ms: i64,
    sample_count: u32,
) -> Result<[(&'static str, f64); 3]> {
    if window_ms <= 0 {
        return Err(PromError::InvalidRange {
            reason: format!("window must be positive, got {window_ms}ms"),
        });
    }
    if sample_count == 0 {
        return Err(PromError::InvalidRange {
            reason: "sample count must be positive".to_string(),
        });
    }

    let end = end_ms as f64 / 1000.0;
    let start = (end_ms - window_ms) as f64 / 1000.0;
    let step = window_ms as f64 / 1000.0 / f64::from(sample_count);
    Ok([("start", start), ("end", end), ("step", step)])
}

impl MetricsBackend for HttpBackend {
    fn query(&self, expr: &str) -> impl Future<Output = Result<Vec<ScalarSample>>> + Send {
        async move {
            debug!(%expr, "instant query");
            let url = self.api_url("api/v1/query")?;
            let envelope = self
                .fetch(url, &[("query", expr.to_string())])
                .await?;
            wire::decode_vector(envelope)
        }
    }

    fn query_range(
        &self,
        expr: &str,
        end_ms: i64,
        window_ms: i64,
        sample_count: u32,
    ) -> impl Future<Output = Result<Vec<RangeSeries>>> + Send {
        async move {
            debug!(%expr, window_ms, sample_count, "range query");
            let url = self.api_url("api/v1/query_range")?;
            let mut params = vec![("query", expr.to_string())];
            for (name, value) in range_params(end_ms, window_ms, sample_count)? {
                params.push((name, value.to_string()));
            }
            let envelope = self.fetch(url, &params).await?;
            wire::decode_matrix(envelope)
        }
    }
}

/// In-memory backend serving canned responses, keyed by expression.
///
/// Unknown expressions answer with empty results (the normal "no data"
/// state); expressions registered via [`StaticBackend::fail_with`] answer
/// with a transport error, for exercising per-view failure scoping.
#[derive(Debug, Default)]
pub struct StaticBackend {
    instant: RwLock<HashMap<String, Vec<ScalarSample>>>,
    range: RwLock<HashMap<String, Vec<RangeSeries>>>,
    failing: RwLock<HashSet<String>>,
}

impl StaticBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the instant-query response for an expression.
    pub fn set_instant(&self, expr: impl Into<String>, samples: Vec<ScalarSample>) {
        self.instant.write().insert(expr.into(), samples);
    }

    /// Registers the range-query response for an expression.
    pub fn set_range(&self, expr: impl Into<String>, series: Vec<RangeSeries>) {
        self.range.write().insert(expr.into(), series);
    }

    /// Makes both query kinds fail for an expression.
    pub fn fail_with(&self, expr: impl Into<String>) {
        self.failing.write().insert(expr.into());
    }

    fn check_failure(&self, expr: &str) -> Result<()> {
        if self.failing.read().contains(expr) {
            return Err(PromError::Transport {
                reason: format!("injected failure for {expr}"),
            });
        }
        Ok(())
    }
}

impl MetricsBackend for StaticBackend {
    fn query(&self, expr: &str) -> impl Future<Output = Result<Vec<ScalarSample>>> + Send {
        let result = self
            .check_failure(expr)
            .map(|()| self.instant.read().get(expr).cloned().unwrap_or_default());
        async move { result }
    }

    fn query_range(
        &self,
        expr: &str,
        _end_ms: i64,
        _window_ms: i64,
        _sample_count: u32,
    ) -> impl Future<Output = Result<Vec<RangeSeries>>> + Send {
        let result = self
            .check_failure(expr)
            .map(|()| self.range.read().get(expr).cloned().unwrap_or_default());
        async move { result }
    }
}
