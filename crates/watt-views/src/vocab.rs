//! Filter vocabularies derived from live data.
//!
//! The selectable zones, namespaces, pods, and nodes are recomputed from
//! the latest successful query results on every cycle. Keeping them pure
//! derivations (rather than cached mutable globals) means the lists can
//! never go stale relative to the data that produced them.

use serde::{Deserialize, Serialize};

use watt_engine::{ScalarSample, label};

/// The selectable values for each filter field, sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterVocabulary {
    /// Power-domain zones observed on node metrics.
    pub zones: Vec<String>,
    /// Namespaces observed on pod metrics.
    pub namespaces: Vec<String>,
    /// Pod names observed on pod metrics (already namespace-narrowed by
    /// the caller's query).
    pub pods: Vec<String>,
    /// Scrape instances observed on the CPU inventory metric.
    pub nodes: Vec<String>,
}

impl FilterVocabulary {
    /// Derives the full vocabulary from one set of query results.
    #[must_use]
    pub fn from_samples(
        node_samples: &[ScalarSample],
        pod_samples: &[ScalarSample],
        info_samples: &[ScalarSample],
    ) -> Self {
        Self {
            zones: zones_from(node_samples),
            namespaces: namespaces_from(pod_samples),
            pods: pods_from(pod_samples),
            nodes: nodes_from(info_samples),
        }
    }
}

/// Unique zones present on the given samples.
#[must_use]
pub fn zones_from(samples: &[ScalarSample]) -> Vec<String> {
    unique_label_values(samples, label::ZONE)
}

/// Unique namespaces present on the given samples.
#[must_use]
pub fn namespaces_from(samples: &[ScalarSample]) -> Vec<String> {
    unique_label_values(samples, label::NAMESPACE)
}

/// Unique pod names present on the given samples.
#[must_use]
pub fn pods_from(samples: &[ScalarSample]) -> Vec<String> {
    unique_label_values(samples, label::POD)
}

/// Unique scrape instances present on the given samples.
#[must_use]
pub fn nodes_from(samples: &[ScalarSample]) -> Vec<String> {
    unique_label_values(samples, label::INSTANCE)
}

fn unique_label_values(samples: &[ScalarSample], name: &str) -> Vec<String> {
    let mut values: Vec<String> = samples
        .iter()
        .filter_map(|s| s.labels.get(name))
        .map(ToString::to_string)
        .collect();
    values.sort();
    values.dedup();
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use watt_engine::LabelSet;

    fn sample(pairs: &[(&str, &str)]) -> ScalarSample {
        let mut labels = LabelSet::new();
        for (k, v) in pairs {
            labels.insert(*k, *v);
        }
        ScalarSample::new(labels, 1.0, 1_000)
    }

    #[test]
    fn values_are_sorted_and_deduplicated() {
        let samples = vec![
            sample(&[(label::ZONE, "psys")]),
            sample(&[(label::ZONE, "dram")]),
            sample(&[(label::ZONE, "psys")]),
            sample(&[(label::ZONE, "package")]),
        ];

        assert_eq!(zones_from(&samples), vec!["dram", "package", "psys"]);
    }

    #[test]
    fn samples_without_the_label_are_skipped() {
        let samples = vec![
            sample(&[(label::NAMESPACE, "ns1")]),
            sample(&[(label::ZONE, "psys")]),
        ];

        assert_eq!(namespaces_from(&samples), vec!["ns1"]);
    }

    #[test]
    fn empty_input_derives_empty_vocabulary() {
        let vocab = FilterVocabulary::from_samples(&[], &[], &[]);
        assert!(vocab.zones.is_empty());
        assert!(vocab.namespaces.is_empty());
        assert!(vocab.pods.is_empty());
        assert!(vocab.nodes.is_empty());
    }

    #[test]
    fn vocabulary_pulls_each_field_from_its_source() {
        let node_samples = vec![sample(&[(label::ZONE, "package")])];
        let pod_samples = vec![sample(&[
            (label::NAMESPACE, "ns1"),
            (label::POD, "web-0"),
        ])];
        let info_samples = vec![sample(&[(label::INSTANCE, "10.0.0.1:9100")])];

        let vocab = FilterVocabulary::from_samples(&node_samples, &pod_samples, &info_samples);
        assert_eq!(vocab.zones, vec!["package"]);
        assert_eq!(vocab.namespaces, vec!["ns1"]);
        assert_eq!(vocab.pods, vec!["web-0"]);
        assert_eq!(vocab.nodes, vec!["10.0.0.1:9100"]);
    }
}
