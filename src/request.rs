//! Per-request observable state and the fetch routine that settles it.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cell::Cell;
use crate::error::FetchError;
use crate::transport::{RequestOptions, Response, Transport};

/// Observable outcome of one logical request.
///
/// All four fields are shared cells: clones of a `RequestState` observe the
/// same underlying values, which is what lets an auto-started fetch run on a
/// spawned task while the caller keeps watching.
///
/// Starting a new call does not reset the outcome fields; they keep the
/// previous call's result until the new call settles. After settlement
/// exactly one of `data`/`error` holds a value.
pub struct RequestState<T> {
  response: Cell<Option<Response>>,
  data: Cell<Option<T>>,
  error: Cell<Option<FetchError>>,
  loading: Cell<bool>,
  url: String,
  options: RequestOptions,
  transport: Arc<dyn Transport>,
}

impl<T> Clone for RequestState<T> {
  fn clone(&self) -> Self {
    Self {
      response: self.response.clone(),
      data: self.data.clone(),
      error: self.error.clone(),
      loading: self.loading.clone(),
      url: self.url.clone(),
      options: self.options.clone(),
      transport: Arc::clone(&self.transport),
    }
  }
}

impl<T> RequestState<T>
where
  T: Clone + DeserializeOwned + Send + Sync + 'static,
{
  pub(crate) fn new(
    transport: Arc<dyn Transport>,
    url: impl Into<String>,
    options: RequestOptions,
  ) -> Self {
    Self {
      response: Cell::new(None),
      data: Cell::new(None),
      error: Cell::new(None),
      loading: Cell::new(false),
      url: url.into(),
      options,
      transport,
    }
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  /// Raw response of the last settled call, if one arrived.
  pub fn response(&self) -> Option<Response> {
    self.response.get()
  }

  /// Decoded body of the last successful call.
  pub fn data(&self) -> Option<T> {
    self.data.get()
  }

  /// Failure cause of the last failed call.
  pub fn error(&self) -> Option<FetchError> {
    self.error.get()
  }

  /// True strictly while a call is in flight.
  pub fn is_loading(&self) -> bool {
    self.loading.get()
  }

  /// The underlying cells, for subscribers that await changes.
  pub fn response_cell(&self) -> &Cell<Option<Response>> {
    &self.response
  }

  pub fn data_cell(&self) -> &Cell<Option<T>> {
    &self.data
  }

  pub fn error_cell(&self) -> &Cell<Option<FetchError>> {
    &self.error
  }

  pub fn loading_cell(&self) -> &Cell<bool> {
    &self.loading
  }

  /// Run one call to settlement.
  ///
  /// Never returns an error: every failure is classified into the `error`
  /// cell. `loading` is raised before the first await and dropped on every
  /// exit path by the guard.
  pub async fn fetch(&self) {
    let _loading = LoadingGuard::raise(&self.loading);
    debug!(url = %self.url, "fetch start");

    match self.execute().await {
      Ok(data) => {
        debug!(url = %self.url, "fetch ok");
        self.data.set(Some(data));
        self.error.set(None);
      }
      Err(err) => {
        debug!(url = %self.url, error = %err, "fetch failed");
        self.error.set(Some(err));
        self.data.set(None);
      }
    }
  }

  /// Spawn the fetch on the runtime and return immediately.
  pub fn start(&self) {
    // Raise the flag here so it is observable before the task is polled.
    self.loading.set(true);
    let state = self.clone();
    tokio::spawn(async move {
      state.fetch().await;
    });
  }

  /// One transport call, classified in order: transport failure, non-2xx
  /// status, decode failure, success. A non-2xx response is never decoded.
  async fn execute(&self) -> Result<T, FetchError> {
    let response = self.transport.send(&self.url, &self.options).await?;
    self.response.set(Some(response.clone()));

    if !response.ok() {
      return Err(FetchError::Status {
        code: response.status,
        reason: response.status_text.clone(),
      });
    }

    response
      .json::<T>()
      .map_err(|err| FetchError::Decode(err.to_string()))
  }
}

impl<T: std::fmt::Debug + Clone> std::fmt::Debug for RequestState<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RequestState")
      .field("url", &self.url)
      .field("loading", &self.loading.get())
      .field("data", &self.data.get())
      .field("error", &self.error.get())
      .finish_non_exhaustive()
  }
}

/// Drop guard that keeps `loading` true for exactly the span of one call.
struct LoadingGuard {
  loading: Cell<bool>,
}

impl LoadingGuard {
  fn raise(loading: &Cell<bool>) -> Self {
    loading.set(true);
    Self {
      loading: loading.clone(),
    }
  }
}

impl Drop for LoadingGuard {
  fn drop(&mut self) {
    self.loading.set(false);
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use serde::Deserialize;
  use serde_json::Value;

  use super::*;
  use crate::transport::mock::MockTransport;

  #[derive(Debug, Clone, PartialEq, Deserialize)]
  struct User {
    id: u64,
    name: String,
  }

  fn state_with<T>(transport: Arc<MockTransport>) -> RequestState<T>
  where
    T: Clone + DeserializeOwned + Send + Sync + 'static,
  {
    RequestState::new(transport, "http://example.test/users/1", RequestOptions::new())
  }

  #[tokio::test]
  async fn test_fetch_success() {
    let transport = MockTransport::ok_json(r#"{"id":1,"name":"Ann"}"#);
    let state: RequestState<User> = state_with(transport);

    assert!(!state.is_loading());
    state.fetch().await;

    assert!(!state.is_loading());
    assert_eq!(
      state.data(),
      Some(User {
        id: 1,
        name: "Ann".to_string()
      })
    );
    assert_eq!(state.error(), None);
    assert!(state.response().unwrap().ok());
  }

  #[tokio::test]
  async fn test_fetch_http_error() {
    let transport = MockTransport::status(404, "Not Found");
    let state: RequestState<User> = state_with(transport);

    state.fetch().await;

    assert_eq!(state.data(), None);
    let err = state.error().unwrap();
    assert_eq!(err.to_string(), "Not Found");
    assert_eq!(err.status(), Some(404));
    // The raw response is still recorded.
    assert_eq!(state.response().unwrap().status, 404);
  }

  #[tokio::test]
  async fn test_http_error_body_not_decoded() {
    // A 500 with a body that would also fail to decode must classify as a
    // status error, not a decode error.
    let transport = MockTransport::scripted(vec![crate::transport::mock::Canned {
      outcome: Ok((500, "Internal Server Error", "<html>oops</html>")),
      delay: Duration::ZERO,
    }]);
    let state: RequestState<User> = state_with(transport);

    state.fetch().await;

    assert!(matches!(
      state.error(),
      Some(FetchError::Status { code: 500, .. })
    ));
  }

  #[tokio::test]
  async fn test_fetch_transport_error() {
    let transport = MockTransport::failing("connection refused");
    let state: RequestState<User> = state_with(transport);

    state.fetch().await;

    assert_eq!(state.data(), None);
    assert!(matches!(state.error(), Some(FetchError::Transport(_))));
    // Nothing arrived, so no response is recorded.
    assert!(state.response().is_none());
  }

  #[tokio::test]
  async fn test_fetch_decode_error() {
    let transport = MockTransport::ok_json("not json");
    let state: RequestState<User> = state_with(transport);

    state.fetch().await;

    assert_eq!(state.data(), None);
    assert!(matches!(state.error(), Some(FetchError::Decode(_))));
    assert!(state.response().unwrap().ok());
  }

  #[tokio::test]
  async fn test_loading_bracket() {
    let transport = MockTransport::scripted(vec![crate::transport::mock::Canned {
      outcome: Ok((200, "OK", "1")),
      delay: Duration::from_millis(50),
    }]);
    let state: RequestState<Value> = state_with(transport);

    let mut loading = state.loading_cell().subscribe();
    let watcher = state.clone();
    let observed = tokio::spawn(async move {
      loading.changed().await.unwrap();
      let during = *loading.borrow_and_update();
      (during, watcher.is_loading())
    });

    state.fetch().await;
    assert!(!state.is_loading());

    let (during, _) = observed.await.unwrap();
    assert!(during);
  }

  #[tokio::test]
  async fn test_loading_drops_on_every_failure_path() {
    for transport in [
      MockTransport::failing("down"),
      MockTransport::status(503, "Service Unavailable"),
      MockTransport::ok_json("{broken"),
    ] {
      let state: RequestState<Value> = state_with(transport);
      state.fetch().await;
      assert!(!state.is_loading());
    }
  }

  #[tokio::test]
  async fn test_settlement_overwrites_previous_outcome() {
    let transport = MockTransport::scripted(vec![
      crate::transport::mock::Canned {
        outcome: Ok((500, "Internal Server Error", "")),
        delay: Duration::ZERO,
      },
      crate::transport::mock::Canned {
        outcome: Ok((200, "OK", "42")),
        delay: Duration::ZERO,
      },
    ]);
    let state: RequestState<Value> = state_with(transport);

    state.fetch().await;
    assert!(state.error().is_some());
    assert!(state.data().is_none());

    state.fetch().await;
    assert_eq!(state.data(), Some(Value::from(42)));
    assert_eq!(state.error(), None);
  }

  #[tokio::test]
  async fn test_outcome_kept_while_next_call_in_flight() {
    let transport = MockTransport::scripted(vec![
      crate::transport::mock::Canned {
        outcome: Ok((200, "OK", "1")),
        delay: Duration::ZERO,
      },
      crate::transport::mock::Canned {
        outcome: Ok((200, "OK", "2")),
        delay: Duration::from_millis(50),
      },
    ]);
    let state: RequestState<Value> = state_with(transport);

    state.fetch().await;
    assert_eq!(state.data(), Some(Value::from(1)));

    state.start();
    tokio::time::sleep(Duration::from_millis(10)).await;
    // In flight: previous data still visible.
    assert!(state.is_loading());
    assert_eq!(state.data(), Some(Value::from(1)));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!state.is_loading());
    assert_eq!(state.data(), Some(Value::from(2)));
  }

  #[tokio::test]
  async fn test_skip_mode_touches_nothing() {
    let transport = MockTransport::ok_json("1");
    let state: RequestState<Value> = state_with(transport.clone());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(!state.is_loading());
    assert!(state.data().is_none());
    assert!(state.error().is_none());
    assert!(state.response().is_none());
    assert_eq!(transport.calls(), 0);
  }
}
