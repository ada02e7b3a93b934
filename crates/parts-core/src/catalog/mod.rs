//! Catalog records and the stores that hold them.

mod import;
mod memory;
mod record;
mod sqlite;
mod store;

pub use import::{map_import_payload, map_imported_part, map_new_part, ImportSummary, PartDraft};
pub use memory::MemoryStore;
pub use record::{FieldValue, Record, NAME_FIELD};
pub use sqlite::{SqliteStore, SqliteStoreOptions};
pub use store::RecordStore;
