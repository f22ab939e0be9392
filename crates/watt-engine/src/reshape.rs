//! Reshaping of range-query results into chart-ready named series.

use crate::types::{LabelSet, NamedSeries, RangeSeries, label};

/// Converts grouped range series into named series for charting.
///
/// Each input series keeps its points in order; points whose value is not
/// finite are dropped individually, never the whole series. Derived name
/// collisions are preserved as distinct output entries — two series from
/// different namespaces may legitimately render the same name, and merging
/// them would corrupt both lines.
#[must_use]
pub fn reshape<F>(series: &[RangeSeries], name_fn: F) -> Vec<NamedSeries>
where
    F: Fn(&LabelSet) -> String,
{
    series
        .iter()
        .map(|s| NamedSeries {
            name: name_fn(&s.labels),
            points: s
                .points()
                .iter()
                .copied()
                .filter(|p| p.value.is_finite())
                .collect(),
        })
        .collect()
}

/// Like [`reshape`], truncated to the first `cap` series in input order.
///
/// This is a readability cap, deliberately not magnitude-based: the caller
/// wants "the first N" exactly as the backend returned them, in contrast
/// to the ranker's top-K.
#[must_use]
pub fn reshape_with_cap<F>(series: &[RangeSeries], name_fn: F, cap: usize) -> Vec<NamedSeries>
where
    F: Fn(&LabelSet) -> String,
{
    reshape(&series[..series.len().min(cap)], name_fn)
}

/// Names a pod series `"{zone} - {pod}"`.
#[must_use]
pub fn zone_pod_name(labels: &LabelSet) -> String {
    format!(
        "{} - {}",
        labels.value_or_unknown(label::ZONE),
        labels.value_or_unknown(label::POD)
    )
}

/// Names a node series `"{zone} - {instance}"`, falling back to the node
/// name when the scrape instance label is absent.
#[must_use]
pub fn zone_instance_name(labels: &LabelSet) -> String {
    let entity = labels
        .get(label::INSTANCE)
        .or_else(|| labels.get(label::NODE))
        .unwrap_or(crate::types::UNKNOWN);
    format!("{} - {}", labels.value_or_unknown(label::ZONE), entity)
}

/// Names a zone trend series `"Zone - {zone}"`.
#[must_use]
pub fn zone_trend_name(labels: &LabelSet) -> String {
    format!("Zone - {}", labels.value_or_unknown(label::ZONE))
}
