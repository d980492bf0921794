//! The `RecordStore` trait.
//!
//! Implemented by storage backends (e.g. `patient-store-sqlite`). The HTTP
//! layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::record::{PatientChanges, PatientRecord, RecordKey};

/// Result of [`RecordStore::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
  /// The write happened; carries the record as stored afterwards.
  Updated(PatientRecord),
  /// No record exists at the key. Nothing was written.
  NotFound,
  /// A version was expected and the stored one differs. Nothing was written.
  VersionMismatch { current: u64 },
}

/// Key-value persistence for patient records.
///
/// Every operation touches at most one key and is atomic with respect to that
/// key. Nothing coordinates operations across calls: two unconditional
/// updates racing on the same key both succeed and the later one wins.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the record at `key`. Returns `None` if absent.
  fn get(
    &self,
    key: RecordKey,
  ) -> impl Future<Output = Result<Option<PatientRecord>, Self::Error>> + Send + '_;

  /// Insert `record`, replacing anything stored at its key.
  fn put(
    &self,
    record: PatientRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Overwrite the updatable fields of an existing record and bump its
  /// version by one.
  ///
  /// `updated_at` becomes the later of `now` and the stored value. With
  /// `expected_version = None` the write is unconditional; with `Some(v)` it
  /// only happens when the stored version is `v`. An absent key is never
  /// created.
  fn update(
    &self,
    key: RecordKey,
    changes: PatientChanges,
    now: DateTime<Utc>,
    expected_version: Option<u64>,
  ) -> impl Future<Output = Result<UpdateOutcome, Self::Error>> + Send + '_;

  /// Remove the record at `key`. Idempotent; returns whether a row existed.
  fn delete(
    &self,
    key: RecordKey,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Return up to `limit` records whose type is `record_type`. Order is
  /// backend-defined.
  fn scan(
    &self,
    record_type: String,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<PatientRecord>, Self::Error>> + Send + '_;
}
