//! Read-through coordination between a request state and the cache store.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use super::store::{CacheEntry, CacheStore};
use crate::cell::Cell;
use crate::error::FetchError;
use crate::request::RequestState;
use crate::transport::Response;

/// A request whose result reads through a shared [`CacheStore`] slot.
///
/// On a hit the transport is never invoked and `data()` is served from the
/// slot. On a miss the underlying fetch is auto-started and its outcome is
/// written back: decoded data on success, the absence marker on any failure,
/// even when an older value was cached.
///
/// The slot read is live: `data()` re-reads the shared slot on every call,
/// so a later `set` or `clear` under the same key is visible through a
/// `CachedRequest` created earlier.
///
/// Concurrent misses under one key are not coalesced; each runs its own
/// transport call and the slot keeps whichever settles last.
pub struct CachedRequest<T> {
  state: RequestState<T>,
  store: Arc<CacheStore>,
  slot: Cell<CacheEntry>,
  key: String,
}

impl<T> Clone for CachedRequest<T> {
  fn clone(&self) -> Self {
    Self {
      state: self.state.clone(),
      store: Arc::clone(&self.store),
      slot: self.slot.clone(),
      key: self.key.clone(),
    }
  }
}

impl<T> CachedRequest<T>
where
  T: Clone + DeserializeOwned + Serialize + Send + Sync + 'static,
{
  /// Wire an unstarted state to the slot for `key`, then auto-start a fetch
  /// unless the slot already holds a value.
  pub(crate) fn new(store: Arc<CacheStore>, key: impl Into<String>, state: RequestState<T>) -> Self {
    let key = key.into();
    let slot = store.slot(&key);
    let cached = Self {
      state,
      store,
      slot,
      key,
    };

    match cached.slot.get() {
      CacheEntry::Value(_) => {
        debug!(key = %cached.key, "cache hit");
      }
      CacheEntry::Cleared => {
        debug!(key = %cached.key, "cache miss");
        cached.start();
      }
    }

    cached
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  /// Decoded payload as currently visible through the cache slot.
  pub fn data(&self) -> Option<T> {
    match self.slot.get() {
      CacheEntry::Value(value) => serde_json::from_value(value).ok(),
      CacheEntry::Cleared => None,
    }
  }

  /// Raw response of this request's own last settled call. Served-from-cache
  /// hits have none.
  pub fn response(&self) -> Option<Response> {
    self.state.response()
  }

  pub fn error(&self) -> Option<FetchError> {
    self.state.error()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// The underlying per-request state, for field-level subscriptions.
  pub fn state(&self) -> &RequestState<T> {
    &self.state
  }

  /// Subscribe to slot changes: repopulations and clears under this key.
  pub fn subscribe(&self) -> watch::Receiver<CacheEntry> {
    self.slot.subscribe()
  }

  /// Spawn a cache-populating fetch and return immediately.
  pub fn start(&self) {
    // Raise the flag here so it is observable before the task is polled.
    self.state.loading_cell().set(true);
    let this = self.clone();
    tokio::spawn(async move {
      this.fetch().await;
    });
  }

  /// Run one fetch to settlement and reconcile the slot with the outcome.
  pub async fn fetch(&self) {
    self.state.fetch().await;

    let payload = match (self.state.error(), self.state.data()) {
      (None, Some(data)) => serde_json::to_value(&data).ok(),
      _ => None,
    };

    match payload {
      Some(value) => self.store.set(&self.key, value),
      None => self.store.clear(&self.key),
    }
  }

  /// Manual invalidation: record the absence marker for this key.
  pub fn clear(&self) {
    self.store.clear(&self.key);
  }
}

impl<T: std::fmt::Debug + Clone> std::fmt::Debug for CachedRequest<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CachedRequest")
      .field("key", &self.key)
      .field("slot", &self.slot.get())
      .field("state", &self.state)
      .finish()
  }
}
