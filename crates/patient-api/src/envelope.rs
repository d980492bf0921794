//! The uniform JSON envelope every response is rendered into.
//!
//! Success bodies are `{"data": ...}`, failures `{"error": "..."}`. Both carry
//! `Content-Type: application/json` and a permissive CORS origin.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Serialize;

/// A successful response payload.
#[derive(Debug)]
pub struct Envelope<T> {
  status: StatusCode,
  data:   T,
}

impl<T: Serialize> Envelope<T> {
  /// `200 OK`
  pub fn ok(data: T) -> Self { Self { status: StatusCode::OK, data } }

  /// `201 Created`
  pub fn created(data: T) -> Self { Self { status: StatusCode::CREATED, data } }
}

#[derive(Serialize)]
struct DataBody<T> {
  data: T,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
  error: &'a str,
}

impl<T: Serialize> IntoResponse for Envelope<T> {
  fn into_response(self) -> Response {
    with_cors((self.status, Json(DataBody { data: self.data })).into_response())
  }
}

/// Render `{"error": message}` with `status`.
pub fn error_response(status: StatusCode, message: &str) -> Response {
  with_cors((status, Json(ErrorBody { error: message })).into_response())
}

fn with_cors(mut res: Response) -> Response {
  res.headers_mut().insert(
    header::ACCESS_CONTROL_ALLOW_ORIGIN,
    HeaderValue::from_static("*"),
  );
  res
}
