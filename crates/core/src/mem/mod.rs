//! Memory hierarchy: backing store and data cache.

/// Set-associative, metadata-only data cache.
pub mod cache;

/// Byte-addressable backing store.
pub mod memory;
