//! Power-domain resolution: the psys/package precedence rule.
//!
//! Nodes may expose a whole-system power rail (`psys`), a CPU package rail
//! (`package`), or both. When both are present, `psys` is the accurate
//! reading and the `package` reading must be discarded entirely — summing
//! them would double count. The memory rail (`dram`) is independent of
//! that choice and always adds.
//!
//! Every aggregation in this crate (cluster totals, per-node rankings,
//! namespace attribution) is a reduction over the resolved values produced
//! here, never a naive sum across raw per-zone samples.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::types::{
    LabelSet, PowerZone, ResolvedNodePower, ResolvedPodPower, ScalarSample, label,
};

/// Per-entity zone sums accumulated from raw samples.
///
/// `None` means the entity had no finite reading for the zone, which is
/// distinct from a zero-valued reading.
#[derive(Debug, Default)]
struct ZoneSums {
    psys: Option<f64>,
    package: Option<f64>,
    dram: Option<f64>,
}

impl ZoneSums {
    fn add(&mut self, zone: &PowerZone, value: f64) {
        let slot = match zone {
            PowerZone::Psys => &mut self.psys,
            PowerZone::Package => &mut self.package,
            PowerZone::Dram => &mut self.dram,
            PowerZone::Other(_) => return,
        };
        *slot = Some(slot.unwrap_or(0.0) + value);
    }

    fn is_empty(&self) -> bool {
        self.psys.is_none() && self.package.is_none() && self.dram.is_none()
    }

    /// Applies the precedence rule: psys wins, package is the fallback,
    /// and a node with neither contributes zero SoC watts.
    fn soc_watts(&self) -> f64 {
        self.psys.or(self.package).unwrap_or(0.0)
    }

    fn dram_watts(&self) -> f64 {
        self.dram.unwrap_or(0.0)
    }
}

/// Resolves raw per-zone node samples into one power value per node.
///
/// For each node appearing in any of the psys/package/dram sample sets:
/// - `soc_watts` is the sum of the node's psys samples when at least one
///   exists; otherwise the sum of its package samples; otherwise zero.
///   A node's package samples are never added once psys is present.
/// - `dram_watts` is the sum of the node's dram samples regardless of the
///   SoC branch taken; a dram-only node still contributes its dram watts.
///
/// Samples with non-finite values and zones outside psys/package/dram are
/// ignored. Output is sorted by node name.
#[must_use]
pub fn resolve_node_power(samples: &[ScalarSample]) -> Vec<ResolvedNodePower> {
    let mut by_node: BTreeMap<&str, ZoneSums> = BTreeMap::new();

    for sample in samples {
        let Some(value) = sample.finite_value() else {
            continue;
        };
        let Some(zone) = sample.labels.zone() else {
            continue;
        };
        by_node
            .entry(sample.labels.value_or_unknown(label::NODE))
            .or_default()
            .add(&zone, value);
    }

    let resolved: Vec<ResolvedNodePower> = by_node
        .into_iter()
        .filter(|(_, sums)| !sums.is_empty())
        .map(|(node, sums)| ResolvedNodePower {
            node: node.to_string(),
            soc_watts: sums.soc_watts(),
            dram_watts: sums.dram_watts(),
        })
        .collect();

    debug!(
        samples = samples.len(),
        nodes = resolved.len(),
        "resolved node power"
    );

    resolved
}

/// Returns the set of nodes with at least one finite psys sample.
///
/// This set is the discriminator for pod-level attribution: a pod's
/// psys/package branch follows its hosting node, not the pod's own zone
/// readings.
#[must_use]
pub fn psys_nodes(samples: &[ScalarSample]) -> BTreeSet<String> {
    samples
        .iter()
        .filter(|s| s.finite_value().is_some())
        .filter(|s| s.labels.zone() == Some(PowerZone::Psys))
        .map(|s| s.labels.value_or_unknown(label::NODE).to_string())
        .collect()
}

/// Resolves raw per-zone pod samples into one attribution per pod.
///
/// Attribution is keyed by (namespace, pod, node). The psys/package choice
/// is made per hosting node via `psys_nodes`: on a psys node only the
/// pod's psys readings count toward SoC watts (its package readings are
/// discarded); on a non-psys node only its package readings count. Dram
/// readings always add, independent of the discriminator.
///
/// Missing namespace/pod/node labels fall back to the `"unknown"`
/// sentinel. Output is sorted by (namespace, pod, node).
#[must_use]
pub fn resolve_pod_power(
    pod_samples: &[ScalarSample],
    psys_nodes: &BTreeSet<String>,
) -> Vec<ResolvedPodPower> {
    let mut by_pod: BTreeMap<(&str, &str, &str), ZoneSums> = BTreeMap::new();

    for sample in pod_samples {
        let Some(value) = sample.finite_value() else {
            continue;
        };
        let Some(zone) = sample.labels.zone() else {
            continue;
        };
        let key = pod_key(&sample.labels);
        by_pod.entry(key).or_default().add(&zone, value);
    }

    let resolved: Vec<ResolvedPodPower> = by_pod
        .into_iter()
        .filter(|(_, sums)| !sums.is_empty())
        .map(|((namespace, pod, node), sums)| {
            let soc_watts = if psys_nodes.contains(node) {
                sums.psys.unwrap_or(0.0)
            } else {
                sums.package.unwrap_or(0.0)
            };
            ResolvedPodPower {
                namespace: namespace.to_string(),
                pod: pod.to_string(),
                node: node.to_string(),
                soc_watts,
                dram_watts: sums.dram_watts(),
            }
        })
        .collect();

    debug!(
        samples = pod_samples.len(),
        pods = resolved.len(),
        "resolved pod power"
    );

    resolved
}

fn pod_key(labels: &LabelSet) -> (&str, &str, &str) {
    (
        labels.value_or_unknown(label::NAMESPACE),
        labels.value_or_unknown(label::POD),
        labels.value_or_unknown(label::NODE),
    )
}
