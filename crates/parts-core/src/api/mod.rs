//! API implementation submodules.
//!
//! Each submodule contains `impl PartsApi` blocks that extend the public API
//! with domain-specific methods. The struct definition remains in `lib.rs`.

mod builder;
mod parts;
mod search;

pub use builder::PartsApiBuilder;
