//! Progressive fetch engine.
//!
//! The keyword filter cannot be pushed to the store, so the number of raw records
//! needed to produce N matches is unknown up front. The engine pulls fixed-size
//! chunks one after another, filters each locally, and stops when it has enough
//! matches, when the store runs dry, or when the per-call chunk cap is reached.
//!
//! The cursor tracks the store position, not the filtered position: it always moves
//! to the last record of the most recent chunk, even when scanning of that chunk
//! stopped early because the target count was reached.

use super::cursor::Cursor;
use super::planner::ServerConstraints;
use crate::catalog::{Record, RecordStore};
use crate::config::FetchLimits;
use crate::error::Result;
use tracing::{debug, warn};

/// Continuation state between calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchPosition {
    pub cursor: Cursor,
    /// The store returned a short or empty chunk; nothing further to try.
    pub store_exhausted: bool,
}

/// Result of one [`fetch_batch`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBatch {
    pub records: Vec<Record>,
    pub position: FetchPosition,
    pub chunks_fetched: usize,
}

/// Collect up to `limits.target_count()` records passing `predicate`, starting after
/// `position.cursor`.
///
/// Chunks are requested strictly in sequence since each request starts at the end of
/// the previous one. Any store error aborts the call; the caller keeps its previous
/// position, so nothing from the failed call is committed.
pub async fn fetch_batch<S, P>(
    store: &S,
    constraints: &ServerConstraints,
    predicate: P,
    position: FetchPosition,
    limits: &FetchLimits,
) -> Result<FetchedBatch>
where
    S: RecordStore + ?Sized,
    P: Fn(&Record) -> bool,
{
    let target = limits.target_count();
    let chunk_size = limits.chunk_size();

    let FetchPosition {
        mut cursor,
        mut store_exhausted,
    } = position;
    let mut accumulated = Vec::new();
    let mut chunks_fetched = 0;

    while accumulated.len() < target
        && !store_exhausted
        && chunks_fetched < limits.max_chunks_per_call()
    {
        let chunk = store
            .fetch_chunk(constraints, &cursor, chunk_size)
            .await
            .inspect_err(|e| warn!("Chunk fetch failed after {} chunk(s): {}", chunks_fetched, e))?;

        let Some(last) = chunk.last() else {
            store_exhausted = true;
            chunks_fetched += 1;
            debug!("Empty chunk after {:?}; store exhausted", cursor);
            break;
        };

        cursor = Cursor::after(last, &constraints.sort);
        if chunk.len() < chunk_size {
            store_exhausted = true;
        }

        let before = accumulated.len();
        for record in chunk.iter() {
            if predicate(record) {
                accumulated.push(record.clone());
                if accumulated.len() == target {
                    break;
                }
            }
        }
        chunks_fetched += 1;

        debug!(
            "Chunk {}: {} raw, {} matched, {} total, exhausted={}",
            chunks_fetched,
            chunk.len(),
            accumulated.len() - before,
            accumulated.len(),
            store_exhausted
        );
    }

    Ok(FetchedBatch {
        records: accumulated,
        position: FetchPosition {
            cursor,
            store_exhausted,
        },
        chunks_fetched,
    })
}
