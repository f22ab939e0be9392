//! Power-domain resolution and aggregation engine.
#![forbid(unsafe_code)]
//!
//! `watt-engine` turns raw per-zone power samples from a metrics backend
//! into cluster-, node-, namespace-, and pod-level summaries under the
//! psys/package precedence rule: a whole-system (`psys`) rail reading
//! supersedes the CPU package (`package`) reading for the same host, and
//! memory-rail (`dram`) power always adds independently.
//!
//! All functions here are pure and total over well-typed input: they
//! operate on snapshots, hold no cross-call state, and never fail on
//! empty or partial data. Querying the backend is the caller's concern.
//!
//! # Example
//!
//! ```rust
//! use watt_engine::{LabelSet, ScalarSample, aggregate, label, resolve_node_power, top_k};
//!
//! let samples = vec![
//!     ScalarSample::new(
//!         LabelSet::new().with(label::NODE, "n1").with(label::ZONE, "psys"),
//!         50.0,
//!         1_000,
//!     ),
//!     ScalarSample::new(
//!         LabelSet::new().with(label::NODE, "n1").with(label::ZONE, "package"),
//!         80.0,
//!         1_000,
//!     ),
//! ];
//!
//! // psys wins; the package reading is discarded, not added.
//! let resolved = resolve_node_power(&samples);
//! let rows = aggregate(&resolved, &[label::NODE]);
//! let top = top_k(rows, 5).unwrap();
//! assert!((top[0].watts - 50.0).abs() < f64::EPSILON);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod aggregate;
pub mod error;
pub mod rank;
pub mod reshape;
pub mod resolve;
pub mod types;

// Re-export main types at crate root
pub use aggregate::{PowerContribution, aggregate, aggregate_samples};
pub use error::{EngineError, Result};
pub use rank::top_k;
pub use reshape::{reshape, reshape_with_cap, zone_instance_name, zone_pod_name, zone_trend_name};
pub use resolve::{psys_nodes, resolve_node_power, resolve_pod_power};
pub use types::{
    AggregateRow, LabelSet, NamedSeries, PowerZone, RangeSeries, ResolvedNodePower,
    ResolvedPodPower, ScalarSample, SeriesPoint, UNKNOWN, label,
};
