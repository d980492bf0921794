//! JSON HTTP API for the patient-record service.
//!
//! Exposes an axum [`Router`] backed by any [`RecordStore`] and
//! [`AuditSink`]. Authentication happens in front of this service; TLS and
//! transport are the caller's responsibility.
//!
//! Every request is audited before it is routed. Unmatched routes and
//! unsupported methods both answer 404, and nothing escapes as a raw fault:
//! store errors and handler panics become the 500 envelope.

pub mod audit;
pub mod envelope;
pub mod error;
pub mod patients;

pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  extract::{Path, Request, State, rejection::PathRejection},
  http::Method,
  middleware,
  response::{IntoResponse, Response},
  routing::any,
};
use bytes::Bytes;
use patient_core::{
  audit::AuditSink,
  provider::{Clock, IdGenerator, SystemClock, UuidGenerator},
  store::RecordStore,
};
use tower::ServiceBuilder;
use tower_http::{
  catch_panic::CatchPanicLayer,
  request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
  trace::TraceLayer,
};

/// Upper bound on request bodies.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

// ─── Settings ────────────────────────────────────────────────────────────────

/// Behavioural switches for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
  /// Reject unparseable bodies with 400 instead of treating them as `{}`.
  pub strict_json:         bool,
  /// Ceiling applied to the `limit` query parameter of list.
  pub max_list_limit:      usize,
  /// Take the audited source address from `X-Forwarded-For` rather than the
  /// socket peer. Only enable behind a proxy that sets the header.
  pub trust_forwarded_for: bool,
}

impl Default for DispatchSettings {
  fn default() -> Self {
    Self {
      strict_json:         false,
      max_list_limit:      1000,
      trust_forwarded_for: false,
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Dependencies threaded through every handler. Holds no per-request state.
pub struct AppState<S, A> {
  pub store:    Arc<S>,
  pub audit:    Arc<A>,
  pub clock:    Arc<dyn Clock>,
  pub ids:      Arc<dyn IdGenerator>,
  pub settings: Arc<DispatchSettings>,
}

impl<S, A> Clone for AppState<S, A> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      audit:    self.audit.clone(),
      clock:    self.clock.clone(),
      ids:      self.ids.clone(),
      settings: self.settings.clone(),
    }
  }
}

impl<S, A> AppState<S, A> {
  /// State using the system clock, UUID identifiers and default settings.
  pub fn new(store: Arc<S>, audit: Arc<A>) -> Self {
    Self {
      store,
      audit,
      clock: Arc::new(SystemClock),
      ids: Arc::new(UuidGenerator),
      settings: Arc::new(DispatchSettings::default()),
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
    self.ids = ids;
    self
  }

  pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
    self.settings = Arc::new(settings);
    self
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the service router.
///
/// Layer order, outermost first: request-id assignment, tracing, request-id
/// propagation, audit, panic capture.
pub fn router<S, A>(state: AppState<S, A>) -> Router
where
  S: RecordStore + 'static,
  A: AuditSink + 'static,
{
  Router::new()
    .route("/patients", any(collection_handler::<S, A>))
    .route("/patients/{patient_id}", any(resource_handler::<S, A>))
    .fallback(route_not_found)
    .layer(
      ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(middleware::from_fn_with_state(
          state.clone(),
          audit::record_request::<S, A>,
        ))
        .layer(CatchPanicLayer::custom(error::panic_response)),
    )
    .with_state(state)
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

async fn collect_body(req: Request<Body>) -> Result<Bytes, ApiError> {
  axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
    .await
    .map_err(body_error)
}

/// Only an exceeded length limit is a 413; anything else is a failed read.
fn body_error(err: axum::Error) -> ApiError {
  let over_limit = std::error::Error::source(&err)
    .is_some_and(|inner| inner.is::<http_body_util::LengthLimitError>());
  if over_limit {
    ApiError::PayloadTooLarge
  } else {
    ApiError::BodyRead(err)
  }
}

/// `/patients`
async fn collection_handler<S, A>(
  State(state): State<AppState<S, A>>,
  req: Request<Body>,
) -> Response
where
  S: RecordStore + 'static,
  A: AuditSink + 'static,
{
  let method = req.method().clone();
  match method {
    Method::GET => {
      let uri = req.uri().clone();
      patients::list(&state, &uri).await.into_response()
    }
    Method::POST => {
      let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return e.into_response(),
      };
      patients::create(&state, body).await.into_response()
    }
    _ => ApiError::RouteNotFound.into_response(),
  }
}

/// `/patients/{patient_id}`
async fn resource_handler<S, A>(
  State(state): State<AppState<S, A>>,
  path: Result<Path<String>, PathRejection>,
  req: Request<Body>,
) -> Response
where
  S: RecordStore + 'static,
  A: AuditSink + 'static,
{
  // An undecodable segment (e.g. `%FF`) cannot name a patient.
  let patient_id = match path {
    Ok(Path(id)) => id,
    Err(rejection) => {
      tracing::debug!(error = %rejection, "unusable patient id in path");
      return ApiError::RouteNotFound.into_response();
    }
  };
  let method = req.method().clone();
  match method {
    Method::GET => patients::get_one(&state, patient_id).await.into_response(),
    Method::PUT => {
      let headers = req.headers().clone();
      let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return e.into_response(),
      };
      patients::update(&state, patient_id, &headers, body)
        .await
        .into_response()
    }
    Method::DELETE => patients::delete(&state, patient_id).await.into_response(),
    _ => ApiError::RouteNotFound.into_response(),
  }
}

async fn route_not_found() -> ApiError { ApiError::RouteNotFound }

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use axum::http::{StatusCode, header};
  use patient_core::{PATIENT_INFO, audit::AuditEntry};
  use patient_store_sqlite::{SqliteStore, TableNames};
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  async fn make_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory(TableNames::default()).await.unwrap())
  }

  async fn make_state() -> AppState<SqliteStore, SqliteStore> {
    let store = make_store().await;
    AppState::new(store.clone(), store)
  }

  async fn send<S, A>(
    state: AppState<S, A>,
    method: &str,
    uri: &str,
    headers: Vec<(header::HeaderName, &str)>,
    body: &str,
  ) -> (StatusCode, axum::http::HeaderMap, Value)
  where
    S: RecordStore + 'static,
    A: AuditSink + 'static,
  {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    let res = router(state).oneshot(req).await.unwrap();

    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
  }

  async fn create(state: &AppState<SqliteStore, SqliteStore>, body: Value) -> String {
    let (status, _, json) =
      send(state.clone(), "POST", "/patients", vec![], &body.to_string()).await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"]["patientId"].as_str().unwrap().to_owned()
  }

  fn ada() -> Value {
    json!({
      "firstName": "Ada",
      "lastName": "Lovelace",
      "dateOfBirth": "1815-12-10",
      "email": "ada@example.com",
      "phone": "+44 20 7946 0000"
    })
  }

  // ── Create / get ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_then_get_round_trips() {
    let state = make_state().await;
    let (status, _, created) =
      send(state.clone(), "POST", "/patients", vec![], &ada().to_string()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["message"], "Patient created successfully");
    let id = created["data"]["patientId"].as_str().unwrap();

    let (status, headers, got) =
      send(state, "GET", &format!("/patients/{id}"), vec![], "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ETAG], "\"1\"");

    let rec = &got["data"];
    assert_eq!(rec["patientId"], id);
    assert_eq!(rec["recordType"], PATIENT_INFO);
    assert_eq!(rec["version"], 1);
    assert_eq!(rec["firstName"], "Ada");
    assert_eq!(rec["lastName"], "Lovelace");
    assert_eq!(rec["dateOfBirth"], "1815-12-10");
    assert_eq!(rec["email"], "ada@example.com");
    assert_eq!(rec["phone"], "+44 20 7946 0000");
    assert_eq!(rec["createdAt"], created["data"]["createdAt"]);
    assert_eq!(rec["createdAt"], rec["updatedAt"]);
  }

  #[tokio::test]
  async fn create_with_malformed_body_stores_empty_record() {
    let state = make_state().await;
    let (status, _, created) =
      send(state.clone(), "POST", "/patients", vec![], "{not json").await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["patientId"].as_str().unwrap();

    let (_, _, got) = send(state, "GET", &format!("/patients/{id}"), vec![], "").await;
    assert_eq!(got["data"]["version"], 1);
    assert!(got["data"].get("firstName").is_none());
  }

  #[tokio::test]
  async fn strict_json_rejects_malformed_body() {
    let state = make_state().await.with_settings(DispatchSettings {
      strict_json: true,
      ..Default::default()
    });
    let (status, _, json) = send(state, "POST", "/patients", vec![], "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Malformed request body");
  }

  #[tokio::test]
  async fn get_missing_returns_404() {
    let state = make_state().await;
    let (status, headers, json) =
      send(state, "GET", "/patients/does-not-exist", vec![], "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({ "error": "Patient not found" }));
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
  }

  // ── List ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_returns_every_created_record() {
    let state = make_state().await;
    for _ in 0..4 {
      create(&state, ada()).await;
    }

    let (status, _, json) = send(state, "GET", "/patients?limit=10", vec![], "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["count"], 4);
    let patients = json["data"]["patients"].as_array().unwrap();
    assert_eq!(patients.len(), 4);
    assert!(patients.iter().all(|p| p["recordType"] == PATIENT_INFO));
  }

  #[tokio::test]
  async fn list_honours_limit_and_ignores_garbage() {
    let state = make_state().await;
    for _ in 0..3 {
      create(&state, ada()).await;
    }

    let (_, _, json) = send(state.clone(), "GET", "/patients?limit=2", vec![], "").await;
    assert_eq!(json["data"]["count"], 2);

    let (status, _, json) = send(state, "GET", "/patients?limit=lots", vec![], "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["count"], 3);
  }

  // ── Update ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn update_bumps_version_and_timestamp() {
    let state = make_state().await;
    let id = create(&state, ada()).await;
    let uri = format!("/patients/{id}");

    let (_, _, before) = send(state.clone(), "GET", &uri, vec![], "").await;

    let body = json!({ "firstName": "Augusta", "lastName": "King", "email": "ak@example.com" });
    let (status, headers, json) =
      send(state.clone(), "PUT", &uri, vec![], &body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["message"], "Patient updated successfully");
    assert_eq!(json["data"]["version"], 2);
    assert_eq!(headers[header::ETAG], "\"2\"");

    let (_, _, after) = send(state, "GET", &uri, vec![], "").await;
    let rec = &after["data"];
    assert_eq!(rec["version"], 2);
    assert_eq!(rec["firstName"], "Augusta");
    assert_eq!(rec["dateOfBirth"], "1815-12-10");
    assert!(rec.get("phone").is_none());

    let prior: chrono::DateTime<chrono::Utc> =
      serde_json::from_value(before["data"]["updatedAt"].clone()).unwrap();
    let now: chrono::DateTime<chrono::Utc> =
      serde_json::from_value(rec["updatedAt"].clone()).unwrap();
    assert!(now >= prior);
    assert_eq!(rec["createdAt"], before["data"]["createdAt"]);
  }

  #[tokio::test]
  async fn update_missing_returns_404_and_creates_nothing() {
    let state = make_state().await;
    let (status, _, json) = send(
      state.clone(),
      "PUT",
      "/patients/ghost",
      vec![],
      &ada().to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Patient not found");

    let (_, _, list) = send(state, "GET", "/patients", vec![], "").await;
    assert_eq!(list["data"]["count"], 0);
  }

  #[tokio::test]
  async fn unsynchronised_updates_last_writer_wins() {
    let state = make_state().await;
    let id = create(&state, ada()).await;
    let uri = format!("/patients/{id}");

    // Two callers who both last saw version 1.
    let first = json!({ "firstName": "First" }).to_string();
    let second = json!({ "firstName": "Second" }).to_string();
    send(state.clone(), "PUT", &uri, vec![], &first).await;
    send(state.clone(), "PUT", &uri, vec![], &second).await;

    let (_, _, got) = send(state, "GET", &uri, vec![], "").await;
    assert_eq!(got["data"]["firstName"], "Second");
    assert_eq!(got["data"]["version"], 3);
  }

  #[tokio::test]
  async fn if_match_rejects_stale_version() {
    let state = make_state().await;
    let id = create(&state, ada()).await;
    let uri = format!("/patients/{id}");
    let body = json!({ "firstName": "Checked" }).to_string();

    let (status, _, _) =
      send(state.clone(), "PUT", &uri, vec![(header::IF_MATCH, "\"1\"")], &body).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, json) =
      send(state.clone(), "PUT", &uri, vec![(header::IF_MATCH, "\"1\"")], &body).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(json["error"], "Version mismatch");

    let (status, _, _) =
      send(state, "PUT", &uri, vec![(header::IF_MATCH, "one")], &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Delete ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn delete_is_idempotent_and_get_then_404s() {
    let state = make_state().await;
    let id = create(&state, ada()).await;
    let uri = format!("/patients/{id}");

    for _ in 0..2 {
      let (status, _, json) = send(state.clone(), "DELETE", &uri, vec![], "").await;
      assert_eq!(status, StatusCode::OK);
      assert_eq!(json["data"]["patientId"], id.as_str());
      assert_eq!(json["data"]["message"], "Patient deleted successfully");
      assert!(json["data"]["deletedAt"].is_string());
    }

    let (status, _, _) = send(state, "GET", &uri, vec![], "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Routing ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn patch_on_resource_is_404_not_405() {
    let state = make_state().await;
    let id = create(&state, ada()).await;
    let (status, headers, json) =
      send(state, "PATCH", &format!("/patients/{id}"), vec![], "{}").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({ "error": "Not Found" }));
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
  }

  #[tokio::test]
  async fn unknown_routes_are_404() {
    let state = make_state().await;
    for (method, uri) in [
      ("GET", "/doctors"),
      ("DELETE", "/patients"),
      ("POST", "/patients/abc"),
      ("GET", "/patients/abc/records"),
    ] {
      let (status, _, json) = send(state.clone(), method, uri, vec![], "").await;
      assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
      assert_eq!(json["error"], "Not Found");
    }
  }

  #[tokio::test]
  async fn oversized_body_is_rejected() {
    let state = make_state().await;
    let huge = format!(r#"{{"firstName":"{}"}}"#, "x".repeat(MAX_BODY_BYTES));
    let (status, _, json) = send(state, "POST", "/patients", vec![], &huge).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["error"], "Payload Too Large");
  }

  #[tokio::test]
  async fn undecodable_patient_id_is_enveloped_404() {
    let state = make_state().await;
    for method in ["GET", "PUT", "DELETE"] {
      let (status, headers, json) =
        send(state.clone(), method, "/patients/%FF", vec![], "{}").await;
      assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
      assert_eq!(json, json!({ "error": "Not Found" }));
      assert_eq!(headers[header::CONTENT_TYPE], "application/json");
      assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
  }

  #[tokio::test]
  async fn only_length_limit_errors_are_413() {
    let over = axum::body::to_bytes(Body::from("0123456789"), 4)
      .await
      .unwrap_err();
    assert!(matches!(body_error(over), ApiError::PayloadTooLarge));

    let reset = axum::Error::new(std::io::Error::other("connection reset"));
    let err = body_error(reset);
    assert!(matches!(err, ApiError::BodyRead(_)));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn request_id_is_assigned_and_echoed() {
    let state = make_state().await;
    let (_, headers, _) = send(
      state.clone(),
      "GET",
      "/patients",
      vec![(header::HeaderName::from_static("x-request-id"), "caller-7")],
      "",
    )
    .await;
    assert_eq!(headers["x-request-id"], "caller-7");

    let (_, headers, _) = send(state, "GET", "/patients", vec![], "").await;
    assert!(headers.contains_key("x-request-id"));
  }

  // ── Audit ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn every_request_is_audited_whatever_the_outcome() {
    let store = make_store().await;
    let state = AppState::new(store.clone(), store.clone());
    let before = store.count_audit_entries().await.unwrap();

    let id = create(&state, ada()).await;
    let requests = [
      ("GET", format!("/patients/{id}"), String::new()),
      ("POST", "/patients".to_owned(), "{malformed".to_owned()),
      ("GET", "/patients/missing".to_owned(), String::new()),
      ("PATCH", format!("/patients/{id}"), String::new()),
      ("GET", "/nowhere".to_owned(), String::new()),
      ("DELETE", format!("/patients/{id}"), String::new()),
    ];
    for (method, uri, body) in &requests {
      send(
        state.clone(),
        method,
        uri,
        vec![(header::USER_AGENT, "audit-test/1.0")],
        body,
      )
      .await;
    }

    let after = store.count_audit_entries().await.unwrap();
    assert_eq!(after - before, requests.len() as u64 + 1);

    let entries = store.audit_entries().await.unwrap();
    assert!(entries.iter().any(|e| e.method == "PATCH"));
    assert!(entries.iter().any(|e| e.path == "/nowhere"));
    assert!(entries.iter().all(|e| e.request_id.is_some()));
    assert!(
      entries
        .iter()
        .filter(|e| e.method != "POST" || e.path != "/patients")
        .all(|e| e.user_agent.as_deref() == Some("audit-test/1.0"))
    );
  }

  /// An audit sink whose every write fails.
  struct BrokenSink {
    attempts: AtomicUsize,
  }

  #[derive(Debug, thiserror::Error)]
  #[error("audit table unavailable")]
  struct SinkDown;

  impl AuditSink for BrokenSink {
    type Error = SinkDown;

    async fn append(&self, _entry: AuditEntry) -> Result<(), SinkDown> {
      self.attempts.fetch_add(1, Ordering::SeqCst);
      Err(SinkDown)
    }
  }

  #[tokio::test]
  async fn audit_failure_never_reaches_the_caller() {
    let sink = Arc::new(BrokenSink { attempts: AtomicUsize::new(0) });
    let state = AppState::new(make_store().await, sink.clone());

    let (status, _, created) =
      send(state.clone(), "POST", "/patients", vec![], &ada().to_string()).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["patientId"].as_str().unwrap();

    let (status, _, got) = send(state, "GET", &format!("/patients/{id}"), vec![], "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(got["data"]["firstName"], "Ada");

    // One attempt per request, never retried.
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 2);
  }

  // ── Failure envelope ───────────────────────────────────────────────────────

  /// A record store that panics or errors on demand.
  struct FaultyStore;

  #[derive(Debug, thiserror::Error)]
  #[error("connection reset by peer at 10.1.2.3:5432")]
  struct StoreDown;

  impl RecordStore for FaultyStore {
    type Error = StoreDown;

    async fn get(
      &self,
      _key: patient_core::RecordKey,
    ) -> Result<Option<patient_core::PatientRecord>, StoreDown> {
      panic!("index corrupted");
    }

    async fn put(&self, _record: patient_core::PatientRecord) -> Result<(), StoreDown> {
      Err(StoreDown)
    }

    async fn update(
      &self,
      _key: patient_core::RecordKey,
      _changes: patient_core::PatientChanges,
      _now: chrono::DateTime<chrono::Utc>,
      _expected_version: Option<u64>,
    ) -> Result<patient_core::store::UpdateOutcome, StoreDown> {
      Err(StoreDown)
    }

    async fn delete(&self, _key: patient_core::RecordKey) -> Result<bool, StoreDown> {
      Err(StoreDown)
    }

    async fn scan(
      &self,
      _record_type: String,
      _limit: usize,
    ) -> Result<Vec<patient_core::PatientRecord>, StoreDown> {
      Err(StoreDown)
    }
  }

  #[tokio::test]
  async fn backend_failures_render_opaque_500() {
    let audit = make_store().await;
    let state = AppState::new(Arc::new(FaultyStore), audit.clone());

    let (status, headers, json) =
      send(state.clone(), "POST", "/patients", vec![], &ada().to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": "Internal Server Error" }));
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let (status, _, json) = send(state, "GET", "/patients/abc", vec![], "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": "Internal Server Error" }));

    // Both requests were audited even though both failed.
    assert_eq!(audit.count_audit_entries().await.unwrap(), 2);
  }
}
