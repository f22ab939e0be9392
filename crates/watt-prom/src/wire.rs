//! Decoding of the Prometheus HTTP API v1 response envelope.
//!
//! Numeric values arrive as strings inside `[timestamp, "value"]` pairs.
//! A value that fails to parse, or parses to NaN/±Inf, is dropped at
//! sample/point granularity — one bad reading never discards the rest of
//! a result set. Timestamps arrive as float seconds and are converted to
//! integer milliseconds.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::warn;

use watt_engine::{LabelSet, RangeSeries, ScalarSample, SeriesPoint};

use crate::error::{PromError, Result};

/// Top-level response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub status: String,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The `data` object of a successful response.
#[derive(Debug, Deserialize)]
pub(crate) struct QueryData {
    #[serde(default)]
    pub result: Vec<ResultEntry>,
}

/// One vector sample or matrix series.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultEntry {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    /// Instant-vector `[timestamp, "value"]` pair.
    #[serde(default)]
    pub value: Option<(f64, String)>,
    /// Matrix `[[timestamp, "value"], ...]` pairs.
    #[serde(default)]
    pub values: Option<Vec<(f64, String)>>,
}

/// Decodes an instant-vector envelope into scalar samples.
///
/// An empty result is a success: it decodes to an empty vector.
pub(crate) fn decode_vector(envelope: Envelope) -> Result<Vec<ScalarSample>> {
    let data = success_data(envelope)?;

    let mut samples = Vec::new();
    for entry in data.result {
        let Some((ts, raw)) = entry.value else {
            continue;
        };
        let Some(value) = parse_value(&raw) else {
            warn!(value = %raw, "dropping malformed sample value");
            continue;
        };
        samples.push(ScalarSample::new(
            labels_from(entry.metric),
            value,
            millis(ts),
        ));
    }
    Ok(samples)
}

/// Decodes a matrix envelope into range series.
///
/// Malformed points are dropped individually; a series whose points all
/// fail to parse decodes to an empty series, which is still valid
/// ("no data in window").
pub(crate) fn decode_matrix(envelope: Envelope) -> Result<Vec<RangeSeries>> {
    let data = success_data(envelope)?;

    let mut series = Vec::new();
    for entry in data.result {
        let labels = labels_from(entry.metric);
        let points: Vec<SeriesPoint> = entry
            .values
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(ts, raw)| {
                let value = parse_value(&raw);
                if value.is_none() {
                    warn!(value = %raw, "dropping malformed series point");
                }
                value.map(|v| SeriesPoint::new(millis(ts), v))
            })
            .collect();
        series.push(RangeSeries::from_points(labels, points));
    }
    Ok(series)
}

fn success_data(envelope: Envelope) -> Result<QueryData> {
    if envelope.status != "success" {
        return Err(PromError::Rejected {
            message: envelope.error.unwrap_or_else(|| envelope.status.clone()),
        });
    }
    envelope.data.ok_or_else(|| PromError::Decode {
        reason: "success response without data".to_string(),
    })
}

fn labels_from(metric: BTreeMap<String, String>) -> LabelSet {
    metric.into_iter().collect()
}

/// Parses a wire value string, rejecting non-finite readings.
fn parse_value(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn millis(ts_seconds: f64) -> i64 {
    (ts_seconds * 1000.0).round() as i64
}
