//! Query-expression builders for the power metrics.
//!
//! Expressions are opaque strings as far as this crate is concerned: they
//! are assembled here and handed to the backend verbatim, never parsed.
//! Selector fragments produced by the filter state (each carrying its own
//! leading comma, or empty for "no restriction") are spliced directly
//! into the brace block.

use serde::{Deserialize, Serialize};

/// Scrape job that all power metrics carry.
pub const DEFAULT_JOB: &str = "power-monitor";

/// Metric names exported by the power agent.
pub mod metric {
    /// Per-node, per-zone power draw in watts.
    pub const NODE_WATTS: &str = "kepler_node_cpu_watts";
    /// Per-node, per-zone active (non-idle) power draw in watts.
    pub const NODE_ACTIVE_WATTS: &str = "kepler_node_cpu_active_watts";
    /// Per-node, per-zone idle power draw in watts.
    pub const NODE_IDLE_WATTS: &str = "kepler_node_cpu_idle_watts";
    /// Per-pod, per-zone attributed power draw in watts.
    pub const POD_WATTS: &str = "kepler_pod_cpu_watts";
    /// Static per-core CPU inventory.
    pub const NODE_CPU_INFO: &str = "kepler_node_cpu_info";
}

/// Which power reading a view is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerKind {
    /// Total power draw.
    Total,
    /// Active (load-attributed) power draw.
    Active,
    /// Idle power draw.
    Idle,
}

impl PowerKind {
    /// Returns the node-level metric name for this kind.
    #[must_use]
    pub const fn node_metric(self) -> &'static str {
        match self {
            Self::Total => metric::NODE_WATTS,
            Self::Active => metric::NODE_ACTIVE_WATTS,
            Self::Idle => metric::NODE_IDLE_WATTS,
        }
    }
}

impl std::fmt::Display for PowerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Total => write!(f, "total"),
            Self::Active => write!(f, "active"),
            Self::Idle => write!(f, "idle"),
        }
    }
}

/// Raw node power samples, all zones, with optional selector fragments.
#[must_use]
pub fn node_power(job: &str, kind: PowerKind, fragments: &[&str]) -> String {
    selector(kind.node_metric(), job, fragments)
}

/// Raw pod power samples, all zones, with optional selector fragments.
#[must_use]
pub fn pod_power(job: &str, fragments: &[&str]) -> String {
    selector(metric::POD_WATTS, job, fragments)
}

/// Per-zone, per-node sums for the exhaustive zone tables.
#[must_use]
pub fn zone_table(job: &str, kind: PowerKind, fragments: &[&str]) -> String {
    format!(
        "sum by (zone,node_name) ({})",
        selector(kind.node_metric(), job, fragments)
    )
}

/// Per-zone sums for the zone trend chart.
#[must_use]
pub fn zone_trend(job: &str, fragments: &[&str]) -> String {
    format!(
        "sum by (zone) ({})",
        selector(metric::NODE_WATTS, job, fragments)
    )
}

/// Core counts per instance and CPU model for the inventory table.
#[must_use]
pub fn cpu_info_count(job: &str) -> String {
    format!(
        "count by (instance, model_name)({})",
        selector(metric::NODE_CPU_INFO, job, &[])
    )
}

/// Raw CPU inventory samples (node filter vocabulary).
#[must_use]
pub fn cpu_info(job: &str) -> String {
    selector(metric::NODE_CPU_INFO, job, &[])
}

fn selector(name: &str, job: &str, fragments: &[&str]) -> String {
    format!("{name}{{job=\"{job}\"{}}}", fragments.concat())
}
