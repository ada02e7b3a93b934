//! Progressive catalog search.
//!
//! This module provides:
//! - Per-part-type search configurations
//! - Query planning (store constraints vs. local predicate)
//! - Chunked progressive fetching with keyset cursors
//! - Result sessions with a single-flight guard

mod cursor;
mod fetch;
mod part_types;
mod planner;
mod predicate;
mod session;

pub use cursor::Cursor;
pub use fetch::{fetch_batch, FetchPosition, FetchedBatch};
pub use part_types::{part_type_keys, search_config_for};
pub use planner::{plan, ClientPredicate, PlannedQuery, ServerConstraints, SortSpec};
pub use predicate::{case_insensitive_contains, FilterOp, SearchConfig, ServerFilter};
pub use session::{IgnoreReason, SearchSession, SessionOutcome, SessionSnapshot};
