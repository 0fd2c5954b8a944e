//! The network-facing seam: request options, fully buffered responses, and
//! the [`Transport`] trait with its reqwest-backed implementation.
//!
//! Transports classify nothing. They either produce a [`Response`] (whatever
//! its status) or fail with a [`TransportError`]; sorting success from
//! application error from decode error is the request state's job.

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::Method;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::TransportError;

/// Options captured per request: method, headers, and an optional raw body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
  pub method: Method,
  pub headers: HeaderMap,
  pub body: Option<Vec<u8>>,
}

impl Default for RequestOptions {
  fn default() -> Self {
    Self {
      method: Method::GET,
      headers: HeaderMap::new(),
      body: None,
    }
  }
}

impl RequestOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn method(mut self, method: Method) -> Self {
    self.method = method;
    self
  }

  pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
    self.headers.insert(name, value);
    self
  }

  pub fn body(mut self, body: Vec<u8>) -> Self {
    self.body = Some(body);
    self
  }
}

/// A fully buffered HTTP response: status code + reason, headers, raw body.
#[derive(Debug, Clone)]
pub struct Response {
  /// Numeric status code (e.g. `200`, `404`).
  pub status: u16,
  /// Human-readable reason phrase (e.g. `"OK"`, `"Not Found"`).
  pub status_text: String,
  /// Response headers, case-insensitive by name.
  pub headers: HeaderMap,
  /// Raw body bytes.
  pub body: Vec<u8>,
}

impl Response {
  /// Whether the status is in the 2xx range.
  pub fn ok(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Decode the body as JSON.
  pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
    serde_json::from_slice(&self.body)
  }
}

/// One HTTP call.
pub trait Transport: Send + Sync {
  fn send<'a>(
    &'a self,
    url: &'a str,
    options: &'a RequestOptions,
  ) -> BoxFuture<'a, Result<Response, TransportError>>;
}

/// reqwest-backed transport. Requests through clones of the same inner
/// client share its connection pool.
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new() -> Self {
    Self {
      client: reqwest::Client::new(),
    }
  }

  /// Wrap a caller-configured client (custom TLS, proxies, timeouts).
  pub fn with_client(client: reqwest::Client) -> Self {
    Self { client }
  }
}

impl Default for HttpTransport {
  fn default() -> Self {
    Self::new()
  }
}

impl Transport for HttpTransport {
  fn send<'a>(
    &'a self,
    url: &'a str,
    options: &'a RequestOptions,
  ) -> BoxFuture<'a, Result<Response, TransportError>> {
    Box::pin(async move {
      let url = Url::parse(url)?;

      let mut request = self
        .client
        .request(options.method.clone(), url)
        .headers(options.headers.clone());
      if let Some(body) = &options.body {
        request = request.body(body.clone());
      }

      let res = request.send().await?;

      let status = res.status().as_u16();
      let status_text = res
        .status()
        .canonical_reason()
        .unwrap_or("Unknown")
        .to_string();
      let headers = res.headers().clone();
      // No streaming; the body is buffered in full before decode.
      let body = res.bytes().await?.to_vec();

      Ok(Response {
        status,
        status_text,
        headers,
        body,
      })
    })
  }
}
