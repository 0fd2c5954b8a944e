//! Observable HTTP request state with an in-memory read-through cache.
//!
//! Every request is represented by a [`RequestState`]: four observable
//! cells (`response`, `data`, `error`, `loading`) that settle when the
//! fetch does. Failures never propagate as `Err`; callers observe the
//! `error` cell after `loading` drops.
//!
//! [`CacheStore`] adds an explicitly constructed, shared key-to-payload
//! map. [`FetchClient::cached`] serves hits without touching the network,
//! populates the store on success, and records an absence marker on
//! failure so a failed refresh never leaves a stale value behind.
//!
//! # Example
//!
//! ```ignore
//! use refetch::{CacheStore, FetchClient, RequestOptions};
//! use serde_json::Value;
//! use std::sync::Arc;
//!
//! let client = FetchClient::new();
//! let store = Arc::new(CacheStore::new());
//!
//! let user = client.cached::<Value>(
//!   &store,
//!   "user:1",
//!   "https://api.example.com/users/1",
//!   RequestOptions::new(),
//! );
//!
//! // Later, after `user.is_loading()` drops:
//! match (user.data(), user.error()) {
//!   (Some(data), _) => render(data),
//!   (_, Some(err)) => render_error(err),
//!   _ => unreachable!("settled requests hold exactly one of data/error"),
//! }
//! ```

pub mod cache;
mod cell;
mod client;
mod error;
mod request;
mod transport;

pub use cache::{CacheEntry, CacheStore, CachedRequest};
pub use cell::Cell;
pub use client::FetchClient;
pub use error::{FetchError, TransportError};
pub use request::RequestState;
pub use transport::{HttpTransport, RequestOptions, Response, Transport};
