//! Grouped power aggregation.
//!
//! Two reductions live here:
//! - [`aggregate`] sums resolved (precedence-applied) power contributions
//!   by an arbitrary grouping key — the only correct way to compute
//!   cluster, node, and namespace totals.
//! - [`aggregate_samples`] sums raw samples by label, with no precedence
//!   applied, for the exhaustive by-zone tables where psys and package
//!   rows are shown side by side.

use std::collections::BTreeMap;

use crate::types::{
    AggregateRow, ResolvedNodePower, ResolvedPodPower, ScalarSample, UNKNOWN, label,
};

/// A resolved power value that can participate in grouped aggregation.
pub trait PowerContribution {
    /// Looks up a grouping label value on this contribution.
    fn label(&self, name: &str) -> Option<&str>;

    /// Total watts contributed (SoC plus dram).
    fn watts(&self) -> f64;
}

impl PowerContribution for ResolvedNodePower {
    fn label(&self, name: &str) -> Option<&str> {
        (name == label::NODE).then_some(self.node.as_str())
    }

    fn watts(&self) -> f64 {
        self.total_watts()
    }
}

impl PowerContribution for ResolvedPodPower {
    fn label(&self, name: &str) -> Option<&str> {
        match name {
            label::NAMESPACE => Some(self.namespace.as_str()),
            label::POD => Some(self.pod.as_str()),
            label::NODE => Some(self.node.as_str()),
            _ => None,
        }
    }

    fn watts(&self) -> f64 {
        self.total_watts()
    }
}

/// Sums resolved power contributions by the requested grouping labels.
///
/// The group key is the tuple of label values in `group_by` order, with
/// the `"unknown"` sentinel standing in for missing labels. Rows are
/// returned in ascending group-key order.
///
/// An empty `group_by` is the cluster scope: it always yields exactly one
/// row, with zero watts for empty input — callers render `0 W`, not
/// "no data". A non-empty `group_by` over empty input yields no rows.
/// Rows with non-positive watts are retained; excluding them is the
/// ranker's concern.
#[must_use]
pub fn aggregate<T: PowerContribution>(items: &[T], group_by: &[&str]) -> Vec<AggregateRow> {
    sum_rows(
        items
            .iter()
            .map(|item| (group_key(item, group_by), item.watts())),
        group_by.is_empty(),
    )
}

/// Sums raw samples by the requested grouping labels, no precedence rule.
///
/// Non-finite sample values are skipped. Key, ordering, and empty-input
/// behavior match [`aggregate`].
#[must_use]
pub fn aggregate_samples(samples: &[ScalarSample], group_by: &[&str]) -> Vec<AggregateRow> {
    sum_rows(
        samples.iter().filter_map(|sample| {
            let value = sample.finite_value()?;
            let key = group_by
                .iter()
                .map(|name| sample.labels.value_or_unknown(name).to_string())
                .collect();
            Some((key, value))
        }),
        group_by.is_empty(),
    )
}

fn group_key<T: PowerContribution>(item: &T, group_by: &[&str]) -> Vec<String> {
    group_by
        .iter()
        .map(|name| item.label(name).unwrap_or(UNKNOWN).to_string())
        .collect()
}

fn sum_rows(
    pairs: impl Iterator<Item = (Vec<String>, f64)>,
    cluster_scope: bool,
) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<Vec<String>, f64> = BTreeMap::new();
    for (key, watts) in pairs {
        *groups.entry(key).or_insert(0.0) += watts;
    }

    if cluster_scope && groups.is_empty() {
        return vec![AggregateRow::new(Vec::new(), 0.0)];
    }

    groups
        .into_iter()
        .map(|(key, watts)| AggregateRow::new(key, watts))
        .collect()
}
