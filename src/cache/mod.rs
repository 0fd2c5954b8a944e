//! In-memory read-through cache keyed by caller-supplied strings.
//!
//! This module provides the shared-cache side of the crate:
//! - A process-local store mapping cache keys to decoded payloads
//! - An explicit absence marker distinguishing "fetch failed" from a value
//! - Read-through coordination: hits skip the transport entirely, misses
//!   fetch and write the outcome back

mod cached;
mod store;

pub use cached::CachedRequest;
pub use store::{CacheEntry, CacheStore};
