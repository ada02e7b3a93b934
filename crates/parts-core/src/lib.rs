//! Parts Core - Headless library for the sign/decal parts catalog.
//!
//! This crate stores catalog parts in SQLite and searches them progressively:
//! store-side filters narrow the scan, a local keyword and name filter picks the
//! matches, and results arrive in batches that a session can keep extending.
//! The calculator module computes material figures from calculator form inputs.
//! It can be used programmatically without any HTTP/RPC layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use parts_core::PartsApi;
//!
//! #[tokio::main]
//! async fn main() -> parts_core::Result<()> {
//!     let api = PartsApi::new("/path/to/parts").await?;
//!
//!     let session = api.new_session();
//!     let outcome = session.search_part_type("acm_sign", "3mmx12").await;
//!     println!("Found {} parts", outcome.snapshot().results.len());
//!
//!     Ok(())
//! }
//! ```

pub mod calculator;
pub mod catalog;
pub mod config;
pub mod error;
pub mod part_number;
pub mod search;

mod api;

// Re-export commonly used types
pub use calculator::{calculate, CalcLine, CalcValue, Calculation, CalculatorInputs};
pub use catalog::{
    FieldValue, ImportSummary, MemoryStore, Record, RecordStore, SqliteStore, SqliteStoreOptions,
    NAME_FIELD,
};
pub use config::FetchLimits;
pub use error::{PartsError, Result};
pub use part_number::{generate_prefix, PrefixInputs};
pub use search::{
    IgnoreReason, SearchConfig, SearchSession, SessionOutcome, SessionSnapshot,
};

// Re-export builder from api module
pub use api::PartsApiBuilder;

use std::path::{Path, PathBuf};

/// Main API struct for catalog operations.
///
/// Owns the parts store and hands out search sessions bound to it. Each UI view
/// should hold its own session; sessions never share continuation state.
pub struct PartsApi {
    data_root: PathBuf,
    store: SqliteStore,
    limits: FetchLimits,
}

impl PartsApi {
    /// Create a builder for PartsApi.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let api = PartsApi::builder("./parts")
    ///     .auto_create_dirs(true)
    ///     .require_field_indexes(true)
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder(data_root: impl Into<PathBuf>) -> PartsApiBuilder {
        PartsApiBuilder::new(data_root)
    }

    /// Create a new PartsApi with default options. The data root must exist.
    pub async fn new(data_root: impl Into<PathBuf>) -> Result<Self> {
        PartsApiBuilder::new(data_root).build().await
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Path of the parts database.
    pub fn database_path(&self) -> &Path {
        self.store.db_path()
    }

    pub fn fetch_limits(&self) -> &FetchLimits {
        &self.limits
    }

    /// Direct access to the underlying store.
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }
}
