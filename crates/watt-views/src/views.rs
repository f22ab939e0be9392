//! Per-view computation over the metrics backend.
//!
//! One function per displayed view. Each builds its query expressions
//! from a filter-state snapshot, hands them to the backend, and reduces
//! the raw results with the pure engine functions. Failures are scoped:
//! the returned error names the view, and no view's failure affects any
//! other view's computation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use watt_engine::{
    NamedSeries, UNKNOWN, aggregate, aggregate_samples, label, psys_nodes, resolve_node_power,
    resolve_pod_power, reshape, reshape_with_cap, top_k, zone_instance_name, zone_pod_name,
    zone_trend_name,
};
use watt_prom::{MetricsBackend, PowerKind, expr};

use crate::config::MonitorConfig;
use crate::error::ViewError;
use crate::filter::{FilterField, FilterState};
use crate::vocab::FilterVocabulary;

/// Result type for view computations.
pub type ViewResult<T> = std::result::Result<T, ViewError>;

/// The three cluster gauges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterPowerSummary {
    /// Resolved total cluster draw in watts.
    pub total_watts: f64,
    /// Resolved active cluster draw in watts.
    pub active_watts: f64,
    /// Resolved idle cluster draw in watts.
    pub idle_watts: f64,
}

/// One row of the node ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    /// Node name.
    pub node: String,
    /// Resolved watts for the node.
    pub watts: f64,
}

/// One row of the namespace ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceRow {
    /// Namespace.
    pub namespace: String,
    /// Node the attribution came from.
    pub node: String,
    /// Resolved watts for the (namespace, node) pair.
    pub watts: f64,
}

/// One row of an exhaustive by-zone table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRow {
    /// Power-domain zone.
    pub zone: String,
    /// Node name.
    pub node: String,
    /// Raw summed watts, no precedence applied.
    pub watts: f64,
}

/// One row of the CPU inventory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuInfoRow {
    /// Scrape instance of the node.
    pub node: String,
    /// CPU model name.
    pub model: String,
    /// Core count.
    pub cores: u64,
}

/// One row of the RAPL inventory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaplInfoRow {
    /// Node name.
    pub node: String,
    /// Power zones the node exposes, sorted.
    pub zones: Vec<String>,
}

/// Resolved cluster draw for one power kind.
///
/// Applies the psys/package precedence in-engine over the raw per-zone
/// node samples; an empty result is a 0-watt cluster, not an error.
pub async fn cluster_power<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
    kind: PowerKind,
) -> ViewResult<f64> {
    const VIEW: &str = "cluster_power";

    let expr = expr::node_power(&config.job, kind, &[]);
    let samples = backend
        .query(&expr)
        .await
        .map_err(|e| ViewError::new(VIEW, e))?;

    let resolved = resolve_node_power(&samples);
    let rows = aggregate(&resolved, &[]);
    let watts = rows.first().map_or(0.0, |row| row.watts);

    debug!(%kind, watts, "computed cluster power");
    Ok(watts)
}

/// All three cluster gauges, queried concurrently.
pub async fn cluster_power_summary<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
) -> ViewResult<ClusterPowerSummary> {
    let (total_watts, active_watts, idle_watts) = tokio::try_join!(
        cluster_power(backend, config, PowerKind::Total),
        cluster_power(backend, config, PowerKind::Active),
        cluster_power(backend, config, PowerKind::Idle),
    )?;

    Ok(ClusterPowerSummary {
        total_watts,
        active_watts,
        idle_watts,
    })
}

/// The highest-consuming nodes, resolved and ranked.
pub async fn top_nodes<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
) -> ViewResult<Vec<NodeRow>> {
    const VIEW: &str = "top_nodes";

    let expr = expr::node_power(&config.job, PowerKind::Total, &[]);
    let samples = backend
        .query(&expr)
        .await
        .map_err(|e| ViewError::new(VIEW, e))?;

    let resolved = resolve_node_power(&samples);
    let rows = aggregate(&resolved, &[label::NODE]);
    let ranked = top_k(rows, config.top_nodes).map_err(|e| ViewError::new(VIEW, e))?;

    Ok(ranked
        .into_iter()
        .map(|row| {
            let mut key = row.group_key.into_iter();
            NodeRow {
                node: key.next().unwrap_or_else(|| UNKNOWN.to_string()),
                watts: row.watts,
            }
        })
        .collect())
}

/// The highest-consuming namespaces, attributed per hosting node.
///
/// Pod attributions follow the hosting node's psys availability: the node
/// query runs unfiltered alongside the (namespace-filtered) pod query so
/// the discriminator always covers every node.
pub async fn top_namespaces<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
    filters: &FilterState,
) -> ViewResult<Vec<NamespaceRow>> {
    const VIEW: &str = "top_namespaces";

    let namespace_fragment = filters.selector_fragment(FilterField::Namespace);
    let pod_expr = expr::pod_power(&config.job, &[namespace_fragment.as_str()]);
    let node_expr = expr::node_power(&config.job, PowerKind::Total, &[]);

    let (pod_samples, node_samples) =
        tokio::try_join!(backend.query(&pod_expr), backend.query(&node_expr))
            .map_err(|e| ViewError::new(VIEW, e))?;

    let discriminator = psys_nodes(&node_samples);
    let resolved = resolve_pod_power(&pod_samples, &discriminator);
    let rows = aggregate(&resolved, &[label::NAMESPACE, label::NODE]);
    let ranked = top_k(rows, config.top_namespaces).map_err(|e| ViewError::new(VIEW, e))?;

    Ok(ranked
        .into_iter()
        .map(|row| {
            let mut key = row.group_key.into_iter();
            NamespaceRow {
                namespace: key.next().unwrap_or_else(|| UNKNOWN.to_string()),
                node: key.next().unwrap_or_else(|| UNKNOWN.to_string()),
                watts: row.watts,
            }
        })
        .collect())
}

/// Exhaustive per-zone, per-node sums for one power kind.
///
/// No precedence rule here: psys and package rows appear side by side,
/// and zero-watt rows are retained.
pub async fn zone_table<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
    kind: PowerKind,
    filters: &FilterState,
) -> ViewResult<Vec<ZoneRow>> {
    const VIEW: &str = "zone_table";

    let zone_fragment = filters.selector_fragment(FilterField::Zone);
    let expr = expr::zone_table(&config.job, kind, &[zone_fragment.as_str()]);
    let samples = backend
        .query(&expr)
        .await
        .map_err(|e| ViewError::new(VIEW, e))?;

    let rows = aggregate_samples(&samples, &[label::ZONE, label::NODE]);
    Ok(rows
        .into_iter()
        .map(|row| {
            let mut key = row.group_key.into_iter();
            ZoneRow {
                zone: key.next().unwrap_or_else(|| UNKNOWN.to_string()),
                node: key.next().unwrap_or_else(|| UNKNOWN.to_string()),
                watts: row.watts,
            }
        })
        .collect())
}

/// Per-zone total power trend over the trailing window.
pub async fn zone_trend<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
    filters: &FilterState,
) -> ViewResult<Vec<NamedSeries>> {
    const VIEW: &str = "zone_trend";

    let zone_fragment = filters.selector_fragment(FilterField::Zone);
    let expr = expr::zone_trend(&config.job, &[zone_fragment.as_str()]);
    let series = query_range(backend, config, VIEW, &expr).await?;

    Ok(reshape(&series, zone_trend_name))
}

/// Per-node, per-zone power series for one power kind, display-capped.
pub async fn node_power_series<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
    kind: PowerKind,
    filters: &FilterState,
) -> ViewResult<Vec<NamedSeries>> {
    const VIEW: &str = "node_power_series";

    let node_fragment = filters.selector_fragment(FilterField::Node);
    let zone_fragment = filters.selector_fragment(FilterField::Zone);
    let expr = expr::node_power(
        &config.job,
        kind,
        &[node_fragment.as_str(), zone_fragment.as_str()],
    );
    let series = query_range(backend, config, VIEW, &expr).await?;

    Ok(reshape_with_cap(
        &series,
        zone_instance_name,
        config.series_display_cap,
    ))
}

/// Per-pod, per-zone power series, display-capped.
pub async fn pod_power_series<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
    filters: &FilterState,
) -> ViewResult<Vec<NamedSeries>> {
    const VIEW: &str = "pod_power_series";

    let namespace_fragment = filters.selector_fragment(FilterField::Namespace);
    let pod_fragment = filters.selector_fragment(FilterField::Pod);
    let zone_fragment = filters.selector_fragment(FilterField::Zone);
    let expr = expr::pod_power(
        &config.job,
        &[
            namespace_fragment.as_str(),
            pod_fragment.as_str(),
            zone_fragment.as_str(),
        ],
    );
    let series = query_range(backend, config, VIEW, &expr).await?;

    Ok(reshape_with_cap(
        &series,
        zone_pod_name,
        config.series_display_cap,
    ))
}

/// Static CPU inventory: instance, model, and core count per node.
pub async fn cpu_inventory<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
) -> ViewResult<Vec<CpuInfoRow>> {
    const VIEW: &str = "cpu_inventory";

    let expr = expr::cpu_info_count(&config.job);
    let samples = backend
        .query(&expr)
        .await
        .map_err(|e| ViewError::new(VIEW, e))?;

    let mut rows: Vec<CpuInfoRow> = samples
        .iter()
        .filter_map(|sample| {
            let cores = sample.finite_value()?;
            Some(CpuInfoRow {
                node: sample.labels.value_or_unknown(label::INSTANCE).to_string(),
                model: sample.labels.value_or_unknown(label::MODEL).to_string(),
                cores: cores.round().max(0.0) as u64,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.node.cmp(&b.node));

    Ok(rows)
}

/// Static RAPL inventory: which power zones each node exposes.
pub async fn rapl_inventory<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
) -> ViewResult<Vec<RaplInfoRow>> {
    const VIEW: &str = "rapl_inventory";

    let expr = expr::node_power(&config.job, PowerKind::Total, &[]);
    let samples = backend
        .query(&expr)
        .await
        .map_err(|e| ViewError::new(VIEW, e))?;

    let mut zones_by_node: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for sample in &samples {
        // Inventory rows need both labels; partial samples are skipped.
        if let (Some(node), Some(zone)) = (
            sample.labels.get(label::NODE),
            sample.labels.get(label::ZONE),
        ) {
            zones_by_node.entry(node).or_default().insert(zone);
        }
    }

    Ok(zones_by_node
        .into_iter()
        .map(|(node, zones)| RaplInfoRow {
            node: node.to_string(),
            zones: zones.into_iter().map(ToString::to_string).collect(),
        })
        .collect())
}

/// The selectable filter values, derived from live data.
///
/// The pod list is narrowed by the current namespace selection, matching
/// the selector dependency in the toolbar.
pub async fn filter_vocabulary<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
    filters: &FilterState,
) -> ViewResult<FilterVocabulary> {
    const VIEW: &str = "filter_vocabulary";

    let node_expr = expr::node_power(&config.job, PowerKind::Total, &[]);
    let namespace_fragment = filters.selector_fragment(FilterField::Namespace);
    let pod_expr = expr::pod_power(&config.job, &[namespace_fragment.as_str()]);
    let info_expr = expr::cpu_info(&config.job);

    let (node_samples, pod_samples, info_samples) = tokio::try_join!(
        backend.query(&node_expr),
        backend.query(&pod_expr),
        backend.query(&info_expr),
    )
    .map_err(|e| ViewError::new(VIEW, e))?;

    Ok(FilterVocabulary::from_samples(
        &node_samples,
        &pod_samples,
        &info_samples,
    ))
}

async fn query_range<B: MetricsBackend>(
    backend: &B,
    config: &MonitorConfig,
    view: &str,
    expr: &str,
) -> ViewResult<Vec<watt_engine::RangeSeries>> {
    backend
        .query_range(
            expr,
            watt_engine::ScalarSample::now_timestamp(),
            config.trend_window_ms(),
            config.trend_samples,
        )
        .await
        .map_err(|e| ViewError::new(view, e))
}
