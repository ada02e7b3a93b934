//! The record store boundary used by progressive search.

use super::record::Record;
use crate::error::Result;
use crate::search::{Cursor, ServerConstraints};
use async_trait::async_trait;

/// A queryable, ordered source of catalog records.
///
/// Implementations return up to `limit` records strictly after `cursor`, ordered by
/// `constraints.sort` ascending with ties broken by record id, after applying every
/// filter in `constraints` as a logical AND. No transactional guarantee spans calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_chunk(
        &self,
        constraints: &ServerConstraints,
        cursor: &Cursor,
        limit: usize,
    ) -> Result<Vec<Record>>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    async fn fetch_chunk(
        &self,
        constraints: &ServerConstraints,
        cursor: &Cursor,
        limit: usize,
    ) -> Result<Vec<Record>> {
        (**self).fetch_chunk(constraints, cursor, limit).await
    }
}
