//! Shared key-to-payload mapping with an explicit absence marker.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::debug;

use crate::cell::Cell;

/// One cache slot.
///
/// `Cleared` records "a fetch under this key failed": a known-empty state,
/// distinct from the key never having been stored. The store itself answers
/// `None` for both; only read-through control flow tells them apart.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
  Cleared,
  Value(Value),
}

impl CacheEntry {
  pub fn value(&self) -> Option<&Value> {
    match self {
      CacheEntry::Value(value) => Some(value),
      CacheEntry::Cleared => None,
    }
  }
}

/// In-memory store shared by every cached request holding a handle to it.
///
/// Slots are observable cells, so a reader wired to a slot sees later writes
/// under the same key. Entries never expire; they persist until overwritten
/// or cleared.
#[derive(Debug, Default)]
pub struct CacheStore {
  slots: Mutex<HashMap<String, Cell<CacheEntry>>>,
}

impl CacheStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Current payload under `key`, if a successful fetch stored one.
  /// `None` for never-stored and cleared keys alike. No side effects.
  pub fn get(&self, key: &str) -> Option<Value> {
    let slots = self.lock();
    slots.get(key).and_then(|slot| slot.get().value().cloned())
  }

  /// Store `value` under `key`, overwriting unconditionally.
  pub fn set(&self, key: &str, value: Value) {
    debug!(key, "cache set");
    self.slot(key).set(CacheEntry::Value(value));
  }

  /// Record the absence marker under `key`.
  pub fn clear(&self, key: &str) {
    debug!(key, "cache clear");
    self.slot(key).set(CacheEntry::Cleared);
  }

  /// The observable slot for `key`, created as `Cleared` when absent.
  pub(crate) fn slot(&self, key: &str) -> Cell<CacheEntry> {
    let mut slots = self.lock();
    slots
      .entry(key.to_string())
      .or_insert_with(|| Cell::new(CacheEntry::Cleared))
      .clone()
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, Cell<CacheEntry>>> {
    // A poisoned lock only means another writer panicked between map
    // operations; the map itself is still usable.
    self.slots.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
