//! Error taxonomy for settled requests.

use thiserror::Error;

/// Why a request settled without data.
///
/// These are never returned from `fetch()` itself; they are written into the
/// request state's `error` cell and observed there after `loading` drops.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  /// The network call itself could not complete (DNS failure, connection
  /// refused, invalid URL).
  #[error("transport error: {0}")]
  Transport(String),

  /// The call completed but the status was outside the success range.
  /// The body is not decoded on this path.
  #[error("{reason}")]
  Status { code: u16, reason: String },

  /// The response was ok but its body could not be decoded.
  #[error("decode error: {0}")]
  Decode(String),

  /// A POST/PUT payload could not be serialized; no network call was made.
  #[error("body encode error: {0}")]
  BodyEncode(String),
}

impl FetchError {
  /// Status code for application-level failures, if this is one.
  pub fn status(&self) -> Option<u16> {
    match self {
      FetchError::Status { code, .. } => Some(*code),
      _ => None,
    }
  }
}

/// Failure raised by a [`Transport`](crate::Transport) implementation before
/// any response exists. Collapsed into [`FetchError::Transport`] when a
/// request settles.
#[derive(Debug, Error)]
pub enum TransportError {
  #[error("invalid url: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),

  /// Transport implementations other than reqwest report failures here.
  #[error("{0}")]
  Connection(String),
}

impl From<TransportError> for FetchError {
  fn from(err: TransportError) -> Self {
    FetchError::Transport(err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_error_displays_reason_only() {
    let err = FetchError::Status {
      code: 404,
      reason: "Not Found".to_string(),
    };
    assert_eq!(err.to_string(), "Not Found");
    assert_eq!(err.status(), Some(404));
  }

  #[test]
  fn test_transport_error_collapses() {
    let err: FetchError = TransportError::Connection("connection refused".to_string()).into();
    assert_eq!(
      err,
      FetchError::Transport("connection refused".to_string())
    );
    assert_eq!(err.status(), None);
  }
}
