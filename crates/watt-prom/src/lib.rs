//! Prometheus collaborator client for the cluster power monitor.
#![forbid(unsafe_code)]
//!
//! `watt-prom` is the engine's only external interface: a read-only
//! metrics backend exposing an instantaneous query and a range query.
//! Expressions are opaque strings assembled by [`expr`] and evaluated by
//! a [`MetricsBackend`] implementation — [`HttpBackend`] for a live
//! Prometheus-compatible server, [`StaticBackend`] for tests.
//!
//! Decoding is lossy by design at the finest granularity: a malformed or
//! non-finite value drops that one sample or point, never the result set
//! (the engine treats missing readings as absent, not zero).
//!
//! # Example
//!
//! ```rust
//! use watt_engine::{LabelSet, ScalarSample, label};
//! use watt_prom::{DEFAULT_JOB, MetricsBackend, PowerKind, StaticBackend, expr};
//!
//! let backend = StaticBackend::new();
//! let expr = expr::node_power(DEFAULT_JOB, PowerKind::Total, &[]);
//! backend.set_instant(
//!     &expr,
//!     vec![ScalarSample::new(
//!         LabelSet::new().with(label::NODE, "n1").with(label::ZONE, "psys"),
//!         50.0,
//!         1_000,
//!     )],
//! );
//!
//! let samples = tokio::runtime::Runtime::new()
//!     .unwrap()
//!     .block_on(backend.query(&expr))
//!     .unwrap();
//! assert_eq!(samples.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod error;
pub mod expr;
mod wire;

// Re-export main types at crate root
pub use client::{DEFAULT_TIMEOUT, HttpBackend, MetricsBackend, StaticBackend};
pub use error::{PromError, Result};
pub use expr::{DEFAULT_JOB, PowerKind};
