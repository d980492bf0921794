//! API error type and [`axum::response::IntoResponse`] implementation.

use std::any::Any;

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::envelope::error_response;

/// An error returned by a dispatcher operation.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No route matches the method and path.
  #[error("no route for request")]
  RouteNotFound,

  #[error("patient {0} not found")]
  PatientNotFound(String),

  /// Only raised when strict JSON parsing is enabled.
  #[error("malformed request body: {0}")]
  MalformedBody(String),

  #[error("invalid If-Match header: {0:?}")]
  InvalidIfMatch(String),

  #[error("version mismatch: expected {expected}, stored {current}")]
  VersionMismatch { expected: u64, current: u64 },

  #[error("request body too large")]
  PayloadTooLarge,

  /// The body stream failed before the limit was reached.
  #[error("failed to read request body: {0}")]
  BodyRead(#[source] axum::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("handler panicked: {0}")]
  Panic(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::RouteNotFound | ApiError::PatientNotFound(_) => StatusCode::NOT_FOUND,
      ApiError::MalformedBody(_) | ApiError::InvalidIfMatch(_) | ApiError::BodyRead(_) => {
        StatusCode::BAD_REQUEST
      }
      ApiError::VersionMismatch { .. } => StatusCode::PRECONDITION_FAILED,
      ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
      ApiError::Store(_) | ApiError::Panic(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// The text placed in the `error` field. Internal detail never leaves the
  /// process.
  fn public_message(&self) -> &'static str {
    match self {
      ApiError::RouteNotFound => "Not Found",
      ApiError::PatientNotFound(_) => "Patient not found",
      ApiError::MalformedBody(_) => "Malformed request body",
      ApiError::InvalidIfMatch(_) => "Invalid If-Match header",
      ApiError::VersionMismatch { .. } => "Version mismatch",
      ApiError::PayloadTooLarge => "Payload Too Large",
      ApiError::BodyRead(_) => "Bad Request",
      ApiError::Store(_) | ApiError::Panic(_) => "Internal Server Error",
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    } else {
      tracing::debug!(error = %self, %status, "request rejected");
    }
    error_response(status, self.public_message())
  }
}

/// Renders a caught handler panic as the internal-error envelope.
pub(crate) fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
  let detail = if let Some(s) = err.downcast_ref::<String>() {
    s.clone()
  } else if let Some(s) = err.downcast_ref::<&str>() {
    (*s).to_owned()
  } else {
    "unknown panic payload".to_owned()
  };
  ApiError::Panic(detail).into_response()
}
