//! Configuration for the power monitor views.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use watt_prom::HttpBackend;

use crate::error::{Result, ViewsError};

/// Configuration shared by every view.
///
/// The defaults reproduce the dashboard's built-in behavior: a five-minute
/// trend window at thirty samples, the top five nodes, the top ten
/// namespaces, and a ten-series chart cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Root URL of the Prometheus-compatible backend.
    pub endpoint: String,
    /// Scrape job carried by every power metric.
    pub job: String,
    /// Seconds between poll cycles for each view.
    pub poll_interval_secs: u64,
    /// Trailing window for trend charts, in seconds.
    pub trend_window_secs: u64,
    /// Evenly spaced samples per trend window.
    pub trend_samples: u32,
    /// How many nodes the node ranking returns.
    pub top_nodes: usize,
    /// How many namespaces the namespace ranking returns.
    pub top_namespaces: usize,
    /// Readability cap on simultaneously charted series.
    pub series_display_cap: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9090".to_string(),
            job: watt_prom::DEFAULT_JOB.to_string(),
            poll_interval_secs: 30,
            trend_window_secs: 300,
            trend_samples: 30,
            top_nodes: 5,
            top_namespaces: 10,
            series_display_cap: 10,
        }
    }
}

impl MonitorConfig {
    /// Checks that every field has a usable value.
    ///
    /// # Errors
    ///
    /// Returns `ViewsError::InvalidConfig` naming the first offending
    /// field.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.endpoint).map_err(|e| ViewsError::InvalidConfig {
            field: "endpoint".to_string(),
            reason: e.to_string(),
        })?;

        if self.job.is_empty() {
            return Err(invalid("job", "must not be empty"));
        }
        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs", "must be positive"));
        }
        if self.trend_window_secs == 0 {
            return Err(invalid("trend_window_secs", "must be positive"));
        }
        if self.trend_samples == 0 {
            return Err(invalid("trend_samples", "must be positive"));
        }
        if self.top_nodes == 0 {
            return Err(invalid("top_nodes", "must be positive"));
        }
        if self.top_namespaces == 0 {
            return Err(invalid("top_namespaces", "must be positive"));
        }
        if self.series_display_cap == 0 {
            return Err(invalid("series_display_cap", "must be positive"));
        }
        Ok(())
    }

    /// Builds an HTTP backend for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ViewsError::InvalidConfig` if the endpoint is not a valid
    /// URL.
    pub fn http_backend(&self) -> Result<HttpBackend> {
        let endpoint = Url::parse(&self.endpoint).map_err(|e| ViewsError::InvalidConfig {
            field: "endpoint".to_string(),
            reason: e.to_string(),
        })?;
        Ok(HttpBackend::new(endpoint))
    }

    /// Returns the poll interval as a duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Returns the trend window in milliseconds.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // Config windows are far below i64::MAX seconds
    pub const fn trend_window_ms(&self) -> i64 {
        (self.trend_window_secs * 1000) as i64
    }
}

fn invalid(field: &str, reason: &str) -> ViewsError {
    ViewsError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
