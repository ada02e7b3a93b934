//! Centralized configuration for the parts catalog.
//!
//! Constants for search paging, the local server, and on-disk layout. Values that
//! callers may override at runtime (fetch limits) have a validated value type.

use crate::error::{PartsError, Result};

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "Parts Desk";
}

/// Defaults for progressive search.
pub struct SearchDefaults;

impl SearchDefaults {
    /// Filtered results to produce per search / load-more call.
    pub const TARGET_COUNT: usize = 100;
    /// Raw records requested from the store per round-trip.
    pub const CHUNK_SIZE: usize = 100;
    /// Round-trips allowed per call before returning a partial batch.
    pub const MAX_CHUNKS_PER_CALL: usize = 10;
}

/// Local server configuration.
pub struct ServerConfig;

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 3000;
    pub const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024; // 50MB, bulk imports
}

/// Shared directory and path configurations.
pub struct PathsConfig;

impl PathsConfig {
    pub const DATA_DIR_NAME: &'static str = "data";
    pub const DATABASE_FILENAME: &'static str = "parts.db";
}

/// Per-call limits for the progressive fetch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    target_count: usize,
    chunk_size: usize,
    max_chunks_per_call: usize,
}

impl FetchLimits {
    /// Build limits, rejecting zeros (a zero chunk size would never advance the cursor).
    pub fn new(target_count: usize, chunk_size: usize, max_chunks_per_call: usize) -> Result<Self> {
        for (field, value) in [
            ("target_count", target_count),
            ("chunk_size", chunk_size),
            ("max_chunks_per_call", max_chunks_per_call),
        ] {
            if value == 0 {
                return Err(PartsError::validation(field, format!("{} must be greater than zero", field)));
            }
        }

        Ok(Self {
            target_count,
            chunk_size,
            max_chunks_per_call,
        })
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn max_chunks_per_call(&self) -> usize {
        self.max_chunks_per_call
    }
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            target_count: SearchDefaults::TARGET_COUNT,
            chunk_size: SearchDefaults::CHUNK_SIZE,
            max_chunks_per_call: SearchDefaults::MAX_CHUNKS_PER_CALL,
        }
    }
}
