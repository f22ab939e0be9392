//! Top-K ranking of aggregate rows.

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::types::AggregateRow;

/// Selects the `k` highest-consuming rows, descending by watts.
///
/// Rows with non-positive watts are excluded — an entity that resolves to
/// zero draw has nothing to rank. Ties are broken by ascending group key
/// so that output is deterministic across runs and reproducible in
/// snapshots. `k` greater than the row count returns all qualifying rows.
///
/// # Errors
///
/// Returns `EngineError::InvalidTopK` when `k` is zero.
pub fn top_k(rows: Vec<AggregateRow>, k: usize) -> Result<Vec<AggregateRow>> {
    if k == 0 {
        return Err(EngineError::InvalidTopK { k });
    }

    let mut ranked: Vec<AggregateRow> = rows.into_iter().filter(|r| r.watts > 0.0).collect();
    ranked.sort_by(|a, b| {
        b.watts
            .total_cmp(&a.watts)
            .then_with(|| a.group_key.cmp(&b.group_key))
    });
    ranked.truncate(k);

    debug!(k, returned = ranked.len(), "ranked aggregate rows");
    Ok(ranked)
}
