//! The five patient operations.
//!
//! | Method   | Path             | Notes |
//! |----------|------------------|-------|
//! | `GET`    | `/patients`      | Optional `?limit=N` (default 50) |
//! | `POST`   | `/patients`      | Body: [`PatientInput`]; returns 201 |
//! | `GET`    | `/patients/{id}` | 404 if not found; `ETag` carries the version |
//! | `PUT`    | `/patients/{id}` | Body: [`PatientInput`]; optional `If-Match: "<version>"` |
//! | `DELETE` | `/patients/{id}` | Idempotent |

use axum::{
  extract::Query,
  http::{HeaderMap, HeaderValue, Uri, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use patient_core::{
  PATIENT_INFO, PatientChanges, PatientInput, PatientRecord, RecordKey,
  store::{RecordStore, UpdateOutcome},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, envelope::Envelope, error::ApiError};

/// `limit` used when the query parameter is absent or unusable.
pub const DEFAULT_LIST_LIMIT: usize = 50;

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /patients/{id}`
pub async fn get_one<S, A>(
  state: &AppState<S, A>,
  patient_id: String,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let record = state
    .store
    .get(RecordKey::patient_info(patient_id.as_str()))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::PatientNotFound(patient_id))?;

  let etag = version_etag(record.version);
  let mut res = Envelope::ok(record).into_response();
  res.headers_mut().insert(header::ETAG, etag);
  Ok(res)
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Kept as text: anything that is not a positive integer falls back to the
  /// default instead of rejecting the request.
  pub limit: Option<String>,
}

#[derive(Serialize)]
struct PatientList {
  patients: Vec<PatientRecord>,
  count:    usize,
}

/// `GET /patients[?limit=N]`
pub async fn list<S, A>(state: &AppState<S, A>, uri: &Uri) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let params = Query::<ListParams>::try_from_uri(uri)
    .map(|Query(p)| p)
    .unwrap_or_default();
  let limit = parse_limit(params.limit.as_deref(), state.settings.max_list_limit);

  let patients = state
    .store
    .scan(PATIENT_INFO.to_owned(), limit)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let count = patients.len();
  Ok(Envelope::ok(PatientList { patients, count }).into_response())
}

/// Positive decimal integer, clamped to `max`; otherwise the default.
pub fn parse_limit(raw: Option<&str>, max: usize) -> usize {
  raw
    .and_then(|s| s.trim().parse::<usize>().ok())
    .filter(|&n| n > 0)
    .unwrap_or(DEFAULT_LIST_LIMIT)
    .min(max.max(1))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Created {
  patient_id: String,
  message:    &'static str,
  created_at: DateTime<Utc>,
}

/// `POST /patients`. Returns 201 with the new identifier.
pub async fn create<S, A>(state: &AppState<S, A>, body: Bytes) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let input = parse_body(&body, state.settings.strict_json)?;
  let record =
    PatientRecord::new_patient_info(state.ids.next_id(), input, state.clock.now());

  let patient_id = record.patient_id.clone();
  let created_at = record.created_at;

  // The identifier is fresh, so no existence check precedes the write.
  state
    .store
    .put(record)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(%patient_id, "patient created");

  Ok(
    Envelope::created(Created {
      patient_id,
      message: "Patient created successfully",
      created_at,
    })
    .into_response(),
  )
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Updated {
  patient_id: String,
  message:    &'static str,
  updated_at: DateTime<Utc>,
  version:    u64,
}

/// `PUT /patients/{id}`
///
/// Without `If-Match` the write is unconditional: concurrent writers are not
/// detected and the last one wins. With `If-Match` the stored version must
/// equal the given one or the request fails with 412.
pub async fn update<S, A>(
  state: &AppState<S, A>,
  patient_id: String,
  headers: &HeaderMap,
  body: Bytes,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let expected_version = parse_if_match(headers)?;
  let changes = PatientChanges::from(parse_body(&body, state.settings.strict_json)?);

  let outcome = state
    .store
    .update(
      RecordKey::patient_info(patient_id.as_str()),
      changes,
      state.clock.now(),
      expected_version,
    )
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let record = match outcome {
    UpdateOutcome::Updated(record) => record,
    UpdateOutcome::NotFound => return Err(ApiError::PatientNotFound(patient_id)),
    UpdateOutcome::VersionMismatch { current } => {
      return Err(ApiError::VersionMismatch {
        expected: expected_version.unwrap_or_default(),
        current,
      });
    }
  };

  tracing::info!(%patient_id, version = record.version, "patient updated");

  let etag = version_etag(record.version);
  let mut res = Envelope::ok(Updated {
    patient_id,
    message: "Patient updated successfully",
    updated_at: record.updated_at,
    version: record.version,
  })
  .into_response();
  res.headers_mut().insert(header::ETAG, etag);
  Ok(res)
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Deleted {
  patient_id: String,
  message:    &'static str,
  deleted_at: DateTime<Utc>,
}

/// `DELETE /patients/{id}`. Succeeds whether or not the record existed.
pub async fn delete<S, A>(
  state: &AppState<S, A>,
  patient_id: String,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let existed = state
    .store
    .delete(RecordKey::patient_info(patient_id.as_str()))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(%patient_id, existed, "patient deleted");

  Ok(
    Envelope::ok(Deleted {
      patient_id,
      message: "Patient deleted successfully",
      deleted_at: state.clock.now(),
    })
    .into_response(),
  )
}

// ─── Input helpers ───────────────────────────────────────────────────────────

/// Decode a create/update body.
///
/// An empty body is `{}`. Anything that does not decode as [`PatientInput`]
/// is also treated as `{}` unless `strict` is set.
pub fn parse_body(body: &[u8], strict: bool) -> Result<PatientInput, ApiError> {
  if body.is_empty() {
    return Ok(PatientInput::default());
  }
  match serde_json::from_slice::<PatientInput>(body) {
    Ok(input) => Ok(input),
    Err(e) if strict => Err(ApiError::MalformedBody(e.to_string())),
    Err(e) => {
      tracing::debug!(error = %e, "unparseable body treated as empty object");
      Ok(PatientInput::default())
    }
  }
}

/// Read an expected version from `If-Match`. Both `"3"` and `3` are
/// accepted; `*` imposes no version.
pub fn parse_if_match(headers: &HeaderMap) -> Result<Option<u64>, ApiError> {
  let Some(value) = headers.get(header::IF_MATCH) else {
    return Ok(None);
  };
  let raw = value.to_str().map_err(|_| {
    ApiError::InvalidIfMatch(String::from_utf8_lossy(value.as_bytes()).into_owned())
  })?;
  let tag = strip_etag_quotes(raw.trim());
  if tag == "*" {
    return Ok(None);
  }
  tag
    .parse::<u64>()
    .map(Some)
    .map_err(|_| ApiError::InvalidIfMatch(raw.to_owned()))
}

fn strip_etag_quotes(s: &str) -> &str { s.trim_matches('"') }

fn version_etag(version: u64) -> HeaderValue {
  HeaderValue::from_str(&format!("\"{version}\""))
    .unwrap_or_else(|_| HeaderValue::from_static("\"0\""))
}
