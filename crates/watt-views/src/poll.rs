//! Per-view poll scheduling.
//!
//! Every displayed view runs its own task: tick on a fixed interval, wake
//! early when the filter generation changes, recompute from a fresh
//! filter snapshot, and publish over a watch channel (last-write-wins).
//! A result computed against an old filter generation is discarded on
//! arrival instead of published, so a stale in-flight query can never
//! overwrite the state a newer selection produced. One view's failure is
//! published as that view's error snapshot; no other task is affected.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use watt_prom::MetricsBackend;

use crate::filter::{FilterHandle, FilterState};
use crate::views::ViewResult;

/// One published result of a view poll.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot<T> {
    /// Filter generation the computation used.
    pub generation: u64,
    /// When the poll completed.
    pub completed_at: DateTime<Utc>,
    /// The view's rows or series, or its scoped error.
    pub outcome: ViewResult<T>,
}

impl<T> ViewSnapshot<T> {
    /// Returns true if this snapshot carries data rather than an error.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Receiver side of a view poller.
///
/// Holds `None` until the first poll completes.
pub type SnapshotReceiver<T> = watch::Receiver<Option<ViewSnapshot<T>>>;

/// Spawns the poll task for one view.
///
/// `view_fn` is the view's pure computation: it receives the shared
/// backend and an owned filter snapshot and produces the view's result.
/// The task re-polls on every interval tick and immediately on filter
/// changes, and exits when every receiver is dropped.
pub fn spawn_view_poller<B, T, F, Fut>(
    view: &'static str,
    interval: Duration,
    backend: Arc<B>,
    filters: FilterHandle,
    view_fn: F,
) -> (SnapshotReceiver<T>, JoinHandle<()>)
where
    B: MetricsBackend + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(Arc<B>, FilterState) -> Fut + Send + 'static,
    Fut: Future<Output = ViewResult<T>> + Send,
{
    let (tx, rx) = watch::channel(None);

    let handle = tokio::spawn(async move {
        let mut generation_rx = filters.subscribe();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the loop
        // body performs the initial poll exactly once.
        ticker.tick().await;
        generation_rx.mark_unchanged();

        loop {
            let snapshot = filters.snapshot();
            let generation = snapshot.generation();
            let outcome = view_fn(Arc::clone(&backend), snapshot).await;

            if let Err(error) = &outcome {
                warn!(view, %error, "view poll failed");
            }

            // Discard-on-arrival: a newer selection has been made while
            // this poll was in flight, and its own poll is already queued.
            if filters.generation() == generation {
                let published = tx.send(Some(ViewSnapshot {
                    generation,
                    completed_at: Utc::now(),
                    outcome,
                }));
                if published.is_err() {
                    debug!(view, "all receivers dropped, stopping poller");
                    break;
                }
            } else {
                debug!(
                    view,
                    stale = generation,
                    current = filters.generation(),
                    "discarding stale view result"
                );
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = generation_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewError;
    use crate::filter::Selection;
    use watt_prom::StaticBackend;

    async fn next_snapshot<T: Clone>(rx: &mut SnapshotReceiver<T>) -> ViewSnapshot<T> {
        loop {
            rx.changed().await.expect("poller dropped its sender");
            if let Some(snapshot) = rx.borrow_and_update().clone() {
                return snapshot;
            }
        }
    }

    #[tokio::test]
    async fn publishes_initial_snapshot() {
        let filters = FilterHandle::new();
        let backend = Arc::new(StaticBackend::new());

        let (mut rx, handle) = spawn_view_poller(
            "test_view",
            Duration::from_secs(3600),
            backend,
            filters,
            |_backend, _state| async { Ok(42_u64) },
        );

        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.outcome, Ok(42));
        assert_eq!(snapshot.generation, 0);
        handle.abort();
    }

    #[tokio::test]
    async fn filter_change_triggers_an_early_poll() {
        let filters = FilterHandle::new();
        let backend = Arc::new(StaticBackend::new());

        // Hour-long interval: any second snapshot must come from the
        // generation wakeup, not the ticker.
        let (mut rx, handle) = spawn_view_poller(
            "test_view",
            Duration::from_secs(3600),
            backend,
            filters.clone(),
            |_backend, state| async move { Ok(state.generation()) },
        );

        let first = next_snapshot(&mut rx).await;
        assert_eq!(first.generation, 0);

        filters.set_zone(Selection::Value("psys".to_string()));

        let second = next_snapshot(&mut rx).await;
        assert_eq!(second.generation, 1);
        assert_eq!(second.outcome, Ok(1));
        handle.abort();
    }

    #[tokio::test]
    async fn error_outcomes_are_published_per_view() {
        let filters = FilterHandle::new();
        let backend = Arc::new(StaticBackend::new());

        let (mut rx, handle) = spawn_view_poller(
            "failing_view",
            Duration::from_secs(3600),
            backend,
            filters,
            |_backend, _state| async {
                Err::<u64, _>(ViewError::new("failing_view", "injected"))
            },
        );

        let snapshot = next_snapshot(&mut rx).await;
        assert!(!snapshot.is_ok());
        assert_eq!(
            snapshot.outcome.unwrap_err().view,
            "failing_view".to_string()
        );
        handle.abort();
    }

    #[tokio::test]
    async fn stale_results_are_discarded_on_arrival() {
        let filters = FilterHandle::new();
        let backend = Arc::new(StaticBackend::new());
        let gate = Arc::new(tokio::sync::Semaphore::new(0));

        let gate_for_view = Arc::clone(&gate);
        let (mut rx, handle) = spawn_view_poller(
            "slow_view",
            Duration::from_secs(3600),
            backend,
            filters.clone(),
            move |_backend, state| {
                let gate = Arc::clone(&gate_for_view);
                async move {
                    // Hold the poll in flight until the test releases it.
                    let permit = gate.acquire().await.map_err(|e| {
                        ViewError::new("slow_view", e)
                    })?;
                    permit.forget();
                    Ok(state.generation())
                }
            },
        );

        // Invalidate generation 0 while its poll is still in flight,
        // then release both polls.
        filters.set_zone(Selection::Value("psys".to_string()));
        gate.add_permits(2);

        // The only published snapshot is the generation-1 recompute; the
        // stale generation-0 result was dropped on arrival.
        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.outcome, Ok(1));
        handle.abort();
    }
}
