//! Filter state, per-view computation, and poll scheduling.
#![forbid(unsafe_code)]
//!
//! `watt-views` ties the pure aggregation engine to the metrics backend:
//! it owns the zone/namespace/pod/node filter state, derives the selector
//! vocabularies from live data, computes each displayed view (cluster
//! gauges, top-N rankings, zone tables, trend series, inventories), and
//! schedules one poll task per view.
//!
//! Views are independent by construction: each polls on its own task,
//! each failure is scoped to its own snapshot, and in-flight results
//! belonging to a superseded filter generation are discarded on arrival.
//!
//! # Example
//!
//! ```rust
//! use watt_views::{FilterHandle, MonitorConfig, Selection};
//!
//! let config = MonitorConfig::default();
//! config.validate().unwrap();
//!
//! let filters = FilterHandle::new();
//! filters.set_namespace(Selection::Value("payments".to_string()));
//! filters.set_pod(Selection::Value("api-0".to_string())).unwrap();
//!
//! // Changing namespace resets the pod selection.
//! filters.set_namespace(Selection::All);
//! assert!(filters.snapshot().pod().is_all());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod filter;
pub mod poll;
pub mod views;
pub mod vocab;

// Re-export main types at crate root
pub use config::MonitorConfig;
pub use error::{Result, ViewError, ViewsError};
pub use filter::{FilterField, FilterHandle, FilterState, Selection};
pub use poll::{SnapshotReceiver, ViewSnapshot, spawn_view_poller};
pub use views::{
    ClusterPowerSummary, CpuInfoRow, NamespaceRow, NodeRow, RaplInfoRow, ViewResult, ZoneRow,
    cluster_power, cluster_power_summary, cpu_inventory, filter_vocabulary, node_power_series,
    pod_power_series, rapl_inventory, top_namespaces, top_nodes, zone_table, zone_trend,
};
pub use vocab::FilterVocabulary;
