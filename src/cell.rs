//! Observable value cell backed by a tokio watch channel.
//!
//! This is the minimal get/set/subscribe contract the request state needs:
//! callers snapshot the current value with [`Cell::get`], or call
//! [`Cell::subscribe`] and await changes from another task.

use std::sync::Arc;
use tokio::sync::watch;

/// A shared, observable value.
///
/// Cloning a `Cell` produces another handle to the same value; a write
/// through any handle is visible to every handle and wakes subscribers.
pub struct Cell<T> {
  tx: Arc<watch::Sender<T>>,
}

impl<T: Clone> Cell<T> {
  /// Create a new cell holding `initial`.
  pub fn new(initial: T) -> Self {
    let (tx, _rx) = watch::channel(initial);
    Self { tx: Arc::new(tx) }
  }

  /// Snapshot the current value.
  pub fn get(&self) -> T {
    self.tx.borrow().clone()
  }

  /// Replace the value, notifying subscribers.
  pub fn set(&self, value: T) {
    self.tx.send_replace(value);
  }

  /// Subscribe to changes. The receiver sees the value as of subscription
  /// time and every subsequent write.
  pub fn subscribe(&self) -> watch::Receiver<T> {
    self.tx.subscribe()
  }
}

impl<T> Clone for Cell<T> {
  fn clone(&self) -> Self {
    Self {
      tx: Arc::clone(&self.tx),
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Cell<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Cell({:?})", *self.tx.borrow())
  }
}
