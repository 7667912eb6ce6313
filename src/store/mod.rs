//! File access and the per-epoch cache owned by [`crate::Assets`].
//!
//! Reading is split from caching so the resolver can decide per call whether a freshly
//! parsed value is kept for the rest of the epoch or discarded.

mod cache;
mod files;

pub use cache::CacheStore;
pub use files::{read_bytes, read_file, read_json, read_json_if_exists};
