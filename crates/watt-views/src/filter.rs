//! Selection state for the zone/namespace/pod/node filters.
//!
//! The filter state is the only mutable structure in the system. It is
//! mutated solely by explicit user selection events and read by the
//! pollers as immutable snapshots. Every successful mutation bumps a
//! generation counter; in-flight query results tagged with an older
//! generation are discarded on arrival rather than published.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Result, ViewsError};

/// A selector value: a concrete label value, or no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// No restriction: the selector emits no matcher fragment.
    #[default]
    All,
    /// Restrict to one concrete label value.
    Value(String),
}

impl Selection {
    /// Returns the concrete value, or `None` for [`Selection::All`].
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Value(v) => Some(v),
        }
    }

    /// Returns true when no restriction is selected.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        if value == "All" {
            Self::All
        } else {
            Self::Value(value.to_string())
        }
    }
}

/// The four filterable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    /// Power-domain zone.
    Zone,
    /// Pod namespace.
    Namespace,
    /// Pod name.
    Pod,
    /// Node (scrape instance).
    Node,
}

/// The current selections plus a generation counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    zone: Selection,
    namespace: Selection,
    pod: Selection,
    node: Selection,
    generation: u64,
}

impl FilterState {
    /// Creates a state with every selector on `All`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the generation of the last successful mutation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the zone selection.
    #[must_use]
    pub const fn zone(&self) -> &Selection {
        &self.zone
    }

    /// Returns the namespace selection.
    #[must_use]
    pub const fn namespace(&self) -> &Selection {
        &self.namespace
    }

    /// Returns the pod selection.
    #[must_use]
    pub const fn pod(&self) -> &Selection {
        &self.pod
    }

    /// Returns the node selection.
    #[must_use]
    pub const fn node(&self) -> &Selection {
        &self.node
    }

    /// Selects a zone.
    pub fn set_zone(&mut self, selection: Selection) {
        self.zone = selection;
        self.generation += 1;
    }

    /// Selects a namespace.
    ///
    /// Always resets the pod selection to `All`: a pod selection is only
    /// meaningful within its namespace, and carrying one across a
    /// namespace change would silently filter on a stale pod.
    pub fn set_namespace(&mut self, selection: Selection) {
        self.namespace = selection;
        self.pod = Selection::All;
        self.generation += 1;
    }

    /// Selects a pod.
    ///
    /// # Errors
    ///
    /// Returns `ViewsError::InvalidFilterTransition` when a concrete pod
    /// is selected while the namespace filter is `All`; the state is left
    /// unchanged.
    pub fn set_pod(&mut self, selection: Selection) -> Result<()> {
        if !selection.is_all() && self.namespace.is_all() {
            return Err(ViewsError::InvalidFilterTransition {
                reason: "pod filter requires a namespace selection".to_string(),
            });
        }
        self.pod = selection;
        self.generation += 1;
        Ok(())
    }

    /// Selects a node.
    pub fn set_node(&mut self, selection: Selection) {
        self.node = selection;
        self.generation += 1;
    }

    /// Renders the label-matcher fragment for one field.
    ///
    /// `All` maps to the empty fragment (no restriction emitted); concrete
    /// values render with a leading comma, ready to splice into a query's
    /// brace block. Pod and node use regex matchers, matching the queries
    /// the original selectors feed.
    #[must_use]
    pub fn selector_fragment(&self, field: FilterField) -> String {
        let (selection, template): (&Selection, fn(&str) -> String) = match field {
            FilterField::Zone => (&self.zone, |v| format!(",zone=\"{v}\"")),
            FilterField::Namespace => (&self.namespace, |v| format!(",pod_namespace=\"{v}\"")),
            FilterField::Pod => (&self.pod, |v| format!(",pod_name=~\"{v}\"")),
            FilterField::Node => (&self.node, |v| format!(",instance=~\"{v}\"")),
        };
        selection.value().map(template).unwrap_or_default()
    }
}

/// Shared, cheaply clonable handle to the filter state.
///
/// Reads take a snapshot; mutations go through the same rule-checking
/// methods as [`FilterState`] and additionally publish the new generation
/// to subscribed pollers.
#[derive(Debug, Clone)]
pub struct FilterHandle {
    inner: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    state: RwLock<FilterState>,
    generation_tx: watch::Sender<u64>,
}

impl FilterHandle {
    /// Creates a handle over a fresh all-`All` state.
    #[must_use]
    pub fn new() -> Self {
        let (generation_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(Shared {
                state: RwLock::new(FilterState::new()),
                generation_tx,
            }),
        }
    }

    /// Returns an immutable snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> FilterState {
        self.inner.state.read().clone()
    }

    /// Returns the current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.state.read().generation()
    }

    /// Subscribes to generation changes, for poll wakeups.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.generation_tx.subscribe()
    }

    /// Selects a zone.
    pub fn set_zone(&self, selection: Selection) {
        let mut state = self.inner.state.write();
        state.set_zone(selection);
        self.publish(&state);
    }

    /// Selects a namespace, resetting the pod selection.
    pub fn set_namespace(&self, selection: Selection) {
        let mut state = self.inner.state.write();
        state.set_namespace(selection);
        self.publish(&state);
    }

    /// Selects a pod.
    ///
    /// # Errors
    ///
    /// Returns `ViewsError::InvalidFilterTransition` when the namespace
    /// filter is `All`; the state is left unchanged.
    pub fn set_pod(&self, selection: Selection) -> Result<()> {
        let mut state = self.inner.state.write();
        state.set_pod(selection)?;
        self.publish(&state);
        Ok(())
    }

    /// Selects a node.
    pub fn set_node(&self, selection: Selection) {
        let mut state = self.inner.state.write();
        state.set_node(selection);
        self.publish(&state);
    }

    fn publish(&self, state: &FilterState) {
        self.inner.generation_tx.send_replace(state.generation());
    }
}

impl Default for FilterHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(v: &str) -> Selection {
        Selection::Value(v.to_string())
    }

    mod selection_tests {
        use super::*;

        #[test]
        fn all_has_no_value() {
            assert_eq!(Selection::All.value(), None);
            assert!(Selection::All.is_all());
        }

        #[test]
        fn from_str_maps_the_all_sentinel() {
            assert_eq!(Selection::from("All"), Selection::All);
            assert_eq!(Selection::from("ns1"), value("ns1"));
        }

        #[test]
        fn display_matches_selector_text() {
            assert_eq!(Selection::All.to_string(), "All");
            assert_eq!(value("psys").to_string(), "psys");
        }
    }

    mod transition_tests {
        use super::*;

        #[test]
        fn namespace_change_resets_pod() {
            let mut state = FilterState::new();
            state.set_namespace(value("ns1"));
            state.set_pod(value("web-0")).unwrap();
            assert_eq!(state.pod(), &value("web-0"));

            state.set_namespace(value("ns2"));
            assert_eq!(state.pod(), &Selection::All);
        }

        #[test]
        fn namespace_reset_to_all_also_clears_pod() {
            let mut state = FilterState::new();
            state.set_namespace(value("ns1"));
            state.set_pod(value("web-0")).unwrap();

            state.set_namespace(Selection::All);
            assert_eq!(state.pod(), &Selection::All);
        }

        #[test]
        fn pod_selection_without_namespace_is_rejected() {
            let mut state = FilterState::new();

            let result = state.set_pod(value("web-0"));
            assert!(matches!(
                result,
                Err(ViewsError::InvalidFilterTransition { .. })
            ));
            // State, including the generation, is unchanged.
            assert_eq!(state.pod(), &Selection::All);
            assert_eq!(state.generation(), 0);
        }

        #[test]
        fn clearing_pod_is_always_allowed() {
            let mut state = FilterState::new();
            assert!(state.set_pod(Selection::All).is_ok());
        }

        #[test]
        fn every_successful_mutation_bumps_the_generation() {
            let mut state = FilterState::new();
            assert_eq!(state.generation(), 0);

            state.set_zone(value("psys"));
            assert_eq!(state.generation(), 1);
            state.set_namespace(value("ns1"));
            assert_eq!(state.generation(), 2);
            state.set_pod(value("web-0")).unwrap();
            assert_eq!(state.generation(), 3);
            state.set_node(value("n1"));
            assert_eq!(state.generation(), 4);
        }
    }

    mod fragment_tests {
        use super::*;
        use test_case::test_case;

        #[test_case(FilterField::Zone ; "zone")]
        #[test_case(FilterField::Namespace ; "namespace")]
        #[test_case(FilterField::Pod ; "pod")]
        #[test_case(FilterField::Node ; "node")]
        fn all_emits_no_restriction(field: FilterField) {
            let state = FilterState::new();
            assert_eq!(state.selector_fragment(field), "");
        }

        #[test]
        fn concrete_selections_render_matchers() {
            let mut state = FilterState::new();
            state.set_zone(value("psys"));
            state.set_namespace(value("ns1"));
            state.set_pod(value("web-0")).unwrap();
            state.set_node(value("10.0.0.1:9100"));

            assert_eq!(state.selector_fragment(FilterField::Zone), ",zone=\"psys\"");
            assert_eq!(
                state.selector_fragment(FilterField::Namespace),
                ",pod_namespace=\"ns1\""
            );
            assert_eq!(
                state.selector_fragment(FilterField::Pod),
                ",pod_name=~\"web-0\""
            );
            assert_eq!(
                state.selector_fragment(FilterField::Node),
                ",instance=~\"10.0.0.1:9100\""
            );
        }
    }

    mod handle_tests {
        use super::*;

        #[test]
        fn snapshot_is_isolated_from_later_mutations() {
            let handle = FilterHandle::new();
            handle.set_zone(value("psys"));

            let snapshot = handle.snapshot();
            handle.set_zone(value("dram"));

            assert_eq!(snapshot.zone(), &value("psys"));
            assert_eq!(handle.snapshot().zone(), &value("dram"));
        }

        #[test]
        fn subscribers_see_generation_updates() {
            let handle = FilterHandle::new();
            let rx = handle.subscribe();
            assert_eq!(*rx.borrow(), 0);

            handle.set_node(value("n1"));
            assert_eq!(*rx.borrow(), 1);
        }

        #[test]
        fn rejected_pod_mutation_publishes_nothing() {
            let handle = FilterHandle::new();
            let rx = handle.subscribe();

            assert!(handle.set_pod(value("web-0")).is_err());
            assert_eq!(*rx.borrow(), 0);
            assert_eq!(handle.generation(), 0);
        }
    }
}
