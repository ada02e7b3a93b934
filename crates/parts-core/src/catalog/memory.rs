//! In-memory record store.
//!
//! Evaluates constraints with the same comparison rules as the SQLite store. Also
//! records every cursor it is asked for and can be told to fail or stall, which the
//! search tests rely on.

use super::record::{FieldValue, Record};
use super::store::RecordStore;
use crate::error::{PartsError, Result};
use crate::search::{Cursor, FilterOp, ServerConstraints, ServerFilter};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
    requested: Mutex<Vec<Cursor>>,
    fetches: AtomicUsize,
    /// 1-based call number that fails, with its message.
    fail_on: Mutex<Option<(usize, String)>>,
    delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    pub fn insert(&self, record: Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }

    /// Number of `fetch_chunk` calls so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(AtomicOrdering::SeqCst)
    }

    /// Cursors passed to `fetch_chunk`, in call order.
    pub fn requested_cursors(&self) -> Vec<Cursor> {
        self.requested.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Make the `call`-th fetch (counting from 1, across the store's lifetime) fail.
    pub fn fail_on_call(&self, call: usize, message: impl Into<String>) {
        if let Ok(mut fail_on) = self.fail_on.lock() {
            *fail_on = Some((call, message.into()));
        }
    }

    /// Sleep this long inside every fetch.
    pub fn set_delay(&self, delay: Duration) {
        if let Ok(mut d) = self.delay.lock() {
            *d = Some(delay);
        }
    }

    fn filter_matches(record: &Record, filter: &ServerFilter) -> bool {
        let value = record.sort_value(&filter.field);
        // Comparisons against NULL are never true
        if value.is_null() {
            return false;
        }
        let ord = value.sql_cmp(&FieldValue::Text(filter.value.clone()));
        match filter.op {
            FilterOp::Eq => ord == Ordering::Equal,
            FilterOp::Gte => ord != Ordering::Less,
            FilterOp::Lte => ord != Ordering::Greater,
            FilterOp::Gt => ord == Ordering::Greater,
            FilterOp::Lt => ord == Ordering::Less,
        }
    }

    fn position_cmp(a: (&FieldValue, i64), b: (&FieldValue, i64)) -> Ordering {
        a.0.sql_cmp(b.0).then(a.1.cmp(&b.1))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_chunk(
        &self,
        constraints: &ServerConstraints,
        cursor: &Cursor,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let call = self.fetches.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(cursor.clone());
        }

        let delay = self.delay.lock().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .fail_on
            .lock()
            .ok()
            .and_then(|f| f.as_ref().filter(|(n, _)| *n == call).map(|(_, m)| m.clone()));
        if let Some(message) = failure {
            return Err(PartsError::StoreFetch { message });
        }

        let sort_field = &constraints.sort.field;
        let records = self.records.lock().map_err(|_| PartsError::StoreFetch {
            message: "Failed to acquire record lock".to_string(),
        })?;

        let mut matching: Vec<(FieldValue, &Record)> = records
            .iter()
            .filter(|r| constraints.filters.iter().all(|f| Self::filter_matches(r, f)))
            .map(|r| (r.sort_value(sort_field), r))
            .filter(|(value, r)| match cursor {
                Cursor::Start => true,
                Cursor::After { sort_value, id } => {
                    Self::position_cmp((value, r.id), (sort_value, *id)) == Ordering::Greater
                }
            })
            .collect();

        matching.sort_by(|(va, a), (vb, b)| Self::position_cmp((va, a.id), (vb, b.id)));

        Ok(matching
            .into_iter()
            .take(limit)
            .map(|(_, r)| r.clone())
            .collect())
    }
}
