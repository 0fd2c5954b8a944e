//! Entry points: construct request states bound to a shared transport.

use std::sync::Arc;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{CacheStore, CachedRequest};
use crate::error::FetchError;
use crate::request::RequestState;
use crate::transport::{HttpTransport, RequestOptions, Transport};

/// Shared handle for issuing requests. Clones share the transport.
#[derive(Clone)]
pub struct FetchClient {
  transport: Arc<dyn Transport>,
}

impl FetchClient {
  /// Client backed by a default reqwest transport.
  pub fn new() -> Self {
    Self {
      transport: Arc::new(HttpTransport::new()),
    }
  }

  /// Client over a caller-configured reqwest client (shared pool, custom
  /// TLS, timeouts).
  pub fn with_client(client: reqwest::Client) -> Self {
    Self {
      transport: Arc::new(HttpTransport::with_client(client)),
    }
  }

  /// Client over any transport implementation. Tests use this to stay off
  /// the network.
  pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
    Self { transport }
  }

  /// Build a request state without starting it ("skip" mode). No field is
  /// touched until `fetch()` is called.
  pub fn request<T>(&self, url: impl Into<String>, options: RequestOptions) -> RequestState<T>
  where
    T: Clone + DeserializeOwned + Send + Sync + 'static,
  {
    RequestState::new(Arc::clone(&self.transport), url, options)
  }

  /// Build a request state and start fetching immediately.
  pub fn fetch<T>(&self, url: impl Into<String>, options: RequestOptions) -> RequestState<T>
  where
    T: Clone + DeserializeOwned + Send + Sync + 'static,
  {
    let state = self.request(url, options);
    state.start();
    state
  }

  /// POST `payload` as JSON and start fetching. A payload that fails to
  /// serialize settles into the state's error field; no call is made.
  pub fn post<T, P>(&self, url: impl Into<String>, options: RequestOptions, payload: &P) -> RequestState<T>
  where
    T: Clone + DeserializeOwned + Send + Sync + 'static,
    P: Serialize + ?Sized,
  {
    self.send_json(url, options, Method::POST, payload)
  }

  /// PUT `payload` as JSON and start fetching.
  pub fn put<T, P>(&self, url: impl Into<String>, options: RequestOptions, payload: &P) -> RequestState<T>
  where
    T: Clone + DeserializeOwned + Send + Sync + 'static,
    P: Serialize + ?Sized,
  {
    self.send_json(url, options, Method::PUT, payload)
  }

  fn send_json<T, P>(
    &self,
    url: impl Into<String>,
    options: RequestOptions,
    method: Method,
    payload: &P,
  ) -> RequestState<T>
  where
    T: Clone + DeserializeOwned + Send + Sync + 'static,
    P: Serialize + ?Sized,
  {
    match serde_json::to_vec(payload) {
      Ok(body) => {
        let options = options
          .method(method)
          .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
          .body(body);
        self.fetch(url, options)
      }
      Err(err) => {
        let state = self.request(url, options.method(method));
        state
          .error_cell()
          .set(Some(FetchError::BodyEncode(err.to_string())));
        state
      }
    }
  }

  /// Cache-first read-through request against `store` under `key`. Slot
  /// semantics are documented on [`CachedRequest`].
  pub fn cached<T>(
    &self,
    store: &Arc<CacheStore>,
    key: impl Into<String>,
    url: impl Into<String>,
    options: RequestOptions,
  ) -> CachedRequest<T>
  where
    T: Clone + DeserializeOwned + Serialize + Send + Sync + 'static,
  {
    let state = self.request(url, options);
    CachedRequest::new(Arc::clone(store), key, state)
  }
}

impl Default for FetchClient {
  fn default() -> Self {
    Self::new()
  }
}
