//! Keyset position within a store's ordered record stream.

use super::planner::SortSpec;
use crate::catalog::{FieldValue, Record};
use serde::Serialize;

/// Where the next chunk starts. Records are ordered by (sort field, id), so the
/// pair of the last record seen identifies a unique position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cursor {
    #[default]
    Start,
    After { sort_value: FieldValue, id: i64 },
}

impl Cursor {
    /// Position immediately after `record` under `sort`.
    pub fn after(record: &Record, sort: &SortSpec) -> Self {
        Cursor::After {
            sort_value: record.sort_value(&sort.field),
            id: record.id,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, Cursor::Start)
    }
}
