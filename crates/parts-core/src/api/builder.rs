//! Builder for configuring PartsApi initialization.

use std::path::{Path, PathBuf};

use crate::catalog::{SqliteStore, SqliteStoreOptions};
use crate::config::{FetchLimits, PathsConfig};
use crate::error::{PartsError, Result};
use crate::PartsApi;

/// Builder for configuring PartsApi initialization.
///
/// # Example
///
/// ```rust,ignore
/// use parts_core::{FetchLimits, PartsApi};
///
/// let api = PartsApi::builder("./parts")
///     .auto_create_dirs(true)
///     .fetch_limits(FetchLimits::new(50, 200, 5)?)
///     .build()
///     .await?;
/// ```
pub struct PartsApiBuilder {
    data_root: PathBuf,
    auto_create_dirs: bool,
    fetch_limits: FetchLimits,
    require_field_indexes: bool,
}

impl PartsApiBuilder {
    /// Create a new builder with the data root directory.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            auto_create_dirs: false,
            fetch_limits: FetchLimits::default(),
            require_field_indexes: false,
        }
    }

    /// Auto-create the data root and `data/` directory if they don't exist.
    ///
    /// Default: `false` (the data root must exist)
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// Limits used by every session this API creates.
    ///
    /// Default: [`FetchLimits::default`]
    pub fn fetch_limits(mut self, limits: FetchLimits) -> Self {
        self.fetch_limits = limits;
        self
    }

    /// Fail queries that sort or range-filter on an unindexed data field.
    ///
    /// Default: `false`
    pub fn require_field_indexes(mut self, enable: bool) -> Self {
        self.require_field_indexes = enable;
        self
    }

    fn create_dir(dir: &Path) -> Result<()> {
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| PartsError::Io {
                message: format!("Failed to create directory: {}", dir.display()),
                path: Some(dir.to_path_buf()),
                source: Some(e),
            })?;
        }
        Ok(())
    }

    /// Build the PartsApi instance.
    pub async fn build(self) -> Result<PartsApi> {
        let data_dir = self.data_root.join(PathsConfig::DATA_DIR_NAME);

        if self.auto_create_dirs {
            Self::create_dir(&self.data_root)?;
            Self::create_dir(&data_dir)?;
        } else if !self.data_root.exists() {
            return Err(PartsError::Config {
                message: format!("Data root does not exist: {}", self.data_root.display()),
            });
        }

        let db_path = data_dir.join(PathsConfig::DATABASE_FILENAME);
        let options = SqliteStoreOptions {
            require_field_indexes: self.require_field_indexes,
        };
        let store = tokio::task::spawn_blocking(move || SqliteStore::open(db_path, options))
            .await
            .map_err(|e| PartsError::Other(format!("Store open task failed: {}", e)))??;

        tracing::info!(
            "Parts API ready at {} (target={}, chunk={}, max_chunks={}, strict_indexes={})",
            self.data_root.display(),
            self.fetch_limits.target_count(),
            self.fetch_limits.chunk_size(),
            self.fetch_limits.max_chunks_per_call(),
            self.require_field_indexes
        );

        Ok(PartsApi {
            data_root: self.data_root,
            store,
            limits: self.fetch_limits,
        })
    }
}
