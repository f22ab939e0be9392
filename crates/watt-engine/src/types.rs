//! Core types for the power monitoring engine.
//!
//! This module provides the fundamental types used throughout the watt-engine crate:
//! - [`LabelSet`]: a dimensional label mapping with explicit presence semantics
//! - [`ScalarSample`]: a single instantaneous reading
//! - [`RangeSeries`]: a time-indexed series of readings
//! - [`PowerZone`]: the power-domain label (psys/package/dram)
//! - [`ResolvedNodePower`] / [`ResolvedPodPower`]: precedence-applied power values
//! - [`AggregateRow`] / [`NamedSeries`]: aggregation and charting outputs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known label names as they appear on the wire.
pub mod label {
    /// Node name label on node-level metrics.
    pub const NODE: &str = "node_name";
    /// Power-domain (zone) label.
    pub const ZONE: &str = "zone";
    /// Namespace label on pod-level metrics.
    pub const NAMESPACE: &str = "pod_namespace";
    /// Pod name label on pod-level metrics.
    pub const POD: &str = "pod_name";
    /// Scrape instance label.
    pub const INSTANCE: &str = "instance";
    /// CPU model label on inventory metrics.
    pub const MODEL: &str = "model_name";
}

/// Sentinel value used when a requested label is absent from a sample.
pub const UNKNOWN: &str = "unknown";

/// A set of dimensional labels attached to a sample or series.
///
/// Backed by an ordered map so that derived group keys and serialized
/// output are deterministic. Absence of a label is distinct from an
/// empty-string value: [`LabelSet::get`] returns `None` only for absent
/// keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// Creates an empty label set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a label and returns self for chaining.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Inserts a label, replacing any existing value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns the value of a label, or `None` if the label is absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns the value of a label, or the [`UNKNOWN`] sentinel if absent.
    #[must_use]
    pub fn value_or_unknown(&self, name: &str) -> &str {
        self.get(name).unwrap_or(UNKNOWN)
    }

    /// Returns true if the label is present (even with an empty value).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns the number of labels in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set holds no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over labels in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses the zone label into a [`PowerZone`], if present.
    #[must_use]
    pub fn zone(&self) -> Option<PowerZone> {
        self.get(label::ZONE).map(PowerZone::from)
    }
}

impl FromIterator<(String, String)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A power-domain label value.
///
/// `Psys` and `Package` are mutually exclusive per node for the purpose of
/// the SoC power total; `Dram` is always additive. Any other zone string is
/// preserved opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PowerZone {
    /// Whole-system power rail; preferred when available.
    Psys,
    /// CPU package power rail; fallback when psys is absent.
    Package,
    /// Memory power rail; always additive.
    Dram,
    /// Any other power domain, preserved as-is.
    Other(String),
}

impl PowerZone {
    /// Returns the wire representation of this zone.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Psys => "psys",
            Self::Package => "package",
            Self::Dram => "dram",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for PowerZone {
    fn from(s: &str) -> Self {
        match s {
            "psys" => Self::Psys,
            "package" => Self::Package,
            "dram" => Self::Dram,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for PowerZone {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<PowerZone> for String {
    fn from(zone: PowerZone) -> Self {
        zone.as_str().to_string()
    }
}

impl std::fmt::Display for PowerZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single scalar reading at an instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarSample {
    /// Dimensional labels for this reading.
    pub labels: LabelSet,
    /// The measured value in watts (or metric-specific units).
    pub value: f64,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
}

impl ScalarSample {
    /// Creates a new sample.
    #[must_use]
    pub const fn new(labels: LabelSet, value: f64, timestamp: i64) -> Self {
        Self {
            labels,
            value,
            timestamp,
        }
    }

    /// Returns the value if it is finite, `None` otherwise.
    ///
    /// NaN and infinite readings from upstream are treated as missing
    /// data, never as zero.
    #[must_use]
    pub fn finite_value(&self) -> Option<f64> {
        self.value.is_finite().then_some(self.value)
    }

    /// Returns the current Unix timestamp in milliseconds.
    #[must_use]
    pub fn now_timestamp() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A single point in a range series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    /// The measured value.
    pub value: f64,
}

impl SeriesPoint {
    /// Creates a new series point.
    #[must_use]
    pub const fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// A time-indexed series of readings tagged with a label set.
///
/// Points are kept strictly increasing in timestamp. A series with zero
/// points is valid and represents "no data in window", which is distinct
/// from an absent series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSeries {
    /// Dimensional labels for this series.
    pub labels: LabelSet,
    points: Vec<SeriesPoint>,
}

impl RangeSeries {
    /// Creates an empty series with the given labels.
    #[must_use]
    pub const fn new(labels: LabelSet) -> Self {
        Self {
            labels,
            points: Vec::new(),
        }
    }

    /// Creates a series from unordered points.
    ///
    /// Points are sorted by timestamp; when two points share a timestamp
    /// the first occurrence wins, keeping the sequence strictly increasing.
    #[must_use]
    pub fn from_points(labels: LabelSet, mut points: Vec<SeriesPoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        points.dedup_by_key(|p| p.timestamp);
        Self { labels, points }
    }

    /// Returns the points in timestamp order.
    #[must_use]
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Returns the number of points in this series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the series holds no points ("no data in window").
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The precedence-applied power value for one node.
///
/// Derived on every aggregation pass from current samples; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedNodePower {
    /// The node this value belongs to.
    pub node: String,
    /// SoC power in watts: the psys reading when present, else package.
    pub soc_watts: f64,
    /// Memory-rail power in watts, independent of the SoC branch.
    pub dram_watts: f64,
}

impl ResolvedNodePower {
    /// Returns the node's total power contribution in watts.
    #[must_use]
    pub fn total_watts(&self) -> f64 {
        self.soc_watts + self.dram_watts
    }
}

/// The precedence-applied power attribution for one pod on one node.
///
/// The psys/package branch is discriminated by the *hosting node's* psys
/// availability, not the pod's own readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPodPower {
    /// Namespace the pod runs in.
    pub namespace: String,
    /// Pod name.
    pub pod: String,
    /// Node hosting the pod.
    pub node: String,
    /// SoC power attribution in watts.
    pub soc_watts: f64,
    /// Memory-rail power attribution in watts.
    pub dram_watts: f64,
}

impl ResolvedPodPower {
    /// Returns the pod's total power attribution in watts.
    #[must_use]
    pub fn total_watts(&self) -> f64 {
        self.soc_watts + self.dram_watts
    }
}

/// One output row of a grouped aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// The grouping label values, in the order they were requested.
    pub group_key: Vec<String>,
    /// Summed watts for this group.
    pub watts: f64,
}

impl AggregateRow {
    /// Creates a new aggregate row.
    #[must_use]
    pub const fn new(group_key: Vec<String>, watts: f64) -> Self {
        Self { group_key, watts }
    }
}

/// A named, charting-ready series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    /// Display name derived from the source series' labels.
    pub name: String,
    /// Points in timestamp order.
    pub points: Vec<SeriesPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod label_set_tests {
        use super::*;

        #[test]
        fn absent_label_is_distinct_from_empty_value() {
            let labels = LabelSet::new().with(label::ZONE, "");

            assert_eq!(labels.get(label::ZONE), Some(""));
            assert!(labels.contains(label::ZONE));
            assert_eq!(labels.get(label::NODE), None);
            assert!(!labels.contains(label::NODE));
        }

        #[test]
        fn value_or_unknown_falls_back_only_when_absent() {
            let labels = LabelSet::new().with(label::NODE, "n1");

            assert_eq!(labels.value_or_unknown(label::NODE), "n1");
            assert_eq!(labels.value_or_unknown(label::POD), UNKNOWN);
        }

        #[test]
        fn iteration_is_name_ordered() {
            let labels = LabelSet::new()
                .with("zone", "psys")
                .with("instance", "i1")
                .with("node_name", "n1");

            let names: Vec<&str> = labels.iter().map(|(k, _)| k).collect();
            assert_eq!(names, vec!["instance", "node_name", "zone"]);
        }

        #[test]
        fn zone_parses_known_and_other_values() {
            let psys = LabelSet::new().with(label::ZONE, "psys");
            assert_eq!(psys.zone(), Some(PowerZone::Psys));

            let exotic = LabelSet::new().with(label::ZONE, "uncore");
            assert_eq!(exotic.zone(), Some(PowerZone::Other("uncore".to_string())));

            assert_eq!(LabelSet::new().zone(), None);
        }

        #[test]
        fn label_set_serialization_roundtrip() {
            let original = LabelSet::new()
                .with(label::NODE, "n1")
                .with(label::ZONE, "package");

            let json = serde_json::to_string(&original).unwrap();
            let parsed: LabelSet = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, original);
        }
    }

    mod power_zone_tests {
        use super::*;
        use test_case::test_case;

        #[test_case("psys", PowerZone::Psys ; "psys")]
        #[test_case("package", PowerZone::Package ; "package")]
        #[test_case("dram", PowerZone::Dram ; "dram")]
        #[test_case("core", PowerZone::Other("core".to_string()) ; "opaque zone")]
        fn zone_string_roundtrip(s: &str, zone: PowerZone) {
            assert_eq!(PowerZone::from(s), zone);
            assert_eq!(zone.as_str(), s);
            assert_eq!(zone.to_string(), s);
        }

        #[test]
        fn zone_serializes_as_plain_string() {
            let json = serde_json::to_string(&PowerZone::Psys).unwrap();
            assert_eq!(json, "\"psys\"");

            let parsed: PowerZone = serde_json::from_str("\"dram\"").unwrap();
            assert_eq!(parsed, PowerZone::Dram);
        }
    }

    mod scalar_sample_tests {
        use super::*;

        #[test]
        fn finite_value_passes_through() {
            let sample = ScalarSample::new(LabelSet::new(), 42.5, 1000);
            assert_eq!(sample.finite_value(), Some(42.5));
        }

        #[test]
        fn non_finite_values_are_missing() {
            let nan = ScalarSample::new(LabelSet::new(), f64::NAN, 1000);
            assert_eq!(nan.finite_value(), None);

            let inf = ScalarSample::new(LabelSet::new(), f64::INFINITY, 1000);
            assert_eq!(inf.finite_value(), None);

            let neg_inf = ScalarSample::new(LabelSet::new(), f64::NEG_INFINITY, 1000);
            assert_eq!(neg_inf.finite_value(), None);
        }

        #[test]
        fn now_timestamp_is_monotonic_enough() {
            let before = ScalarSample::now_timestamp();
            let after = ScalarSample::now_timestamp();
            assert!(after >= before);
        }
    }

    mod range_series_tests {
        use super::*;

        #[test]
        fn from_points_sorts_by_timestamp() {
            let series = RangeSeries::from_points(
                LabelSet::new(),
                vec![
                    SeriesPoint::new(3000, 3.0),
                    SeriesPoint::new(1000, 1.0),
                    SeriesPoint::new(2000, 2.0),
                ],
            );

            let timestamps: Vec<i64> = series.points().iter().map(|p| p.timestamp).collect();
            assert_eq!(timestamps, vec![1000, 2000, 3000]);
        }

        #[test]
        fn from_points_keeps_first_of_duplicate_timestamps() {
            let series = RangeSeries::from_points(
                LabelSet::new(),
                vec![SeriesPoint::new(1000, 1.0), SeriesPoint::new(1000, 9.0)],
            );

            assert_eq!(series.len(), 1);
            assert!((series.points()[0].value - 1.0).abs() < f64::EPSILON);
        }

        #[test]
        fn empty_series_is_valid() {
            let series = RangeSeries::new(LabelSet::new().with(label::ZONE, "psys"));
            assert!(series.is_empty());
            assert_eq!(series.len(), 0);
        }
    }

    mod resolved_power_tests {
        use super::*;

        #[test]
        fn node_total_is_soc_plus_dram() {
            let resolved = ResolvedNodePower {
                node: "n1".to_string(),
                soc_watts: 50.0,
                dram_watts: 10.0,
            };
            assert!((resolved.total_watts() - 60.0).abs() < f64::EPSILON);
        }

        #[test]
        fn pod_total_is_soc_plus_dram() {
            let resolved = ResolvedPodPower {
                namespace: "default".to_string(),
                pod: "web-0".to_string(),
                node: "n1".to_string(),
                soc_watts: 3.0,
                dram_watts: 0.5,
            };
            assert!((resolved.total_watts() - 3.5).abs() < f64::EPSILON);
        }
    }
}
