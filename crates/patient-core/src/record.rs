//! Patient records, the one mutable entity the service owns.
//!
//! A record is addressed by the composite [`RecordKey`]. The table is shaped
//! to hold several record types under one patient; only the demographic
//! [`PATIENT_INFO`] type is produced by this service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record type discriminant of the canonical demographic record.
pub const PATIENT_INFO: &str = "PATIENT_INFO";

// ─── Key ─────────────────────────────────────────────────────────────────────

/// The `(patientId, recordType)` pair that uniquely identifies a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
  pub patient_id:  String,
  pub record_type: String,
}

impl RecordKey {
  /// Key of the demographic record for `patient_id`.
  pub fn patient_info(patient_id: impl Into<String>) -> Self {
    Self {
      patient_id:  patient_id.into(),
      record_type: PATIENT_INFO.to_owned(),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A stored patient record.
///
/// Demographic fields are opaque strings with no format validation. They are
/// optional because create and update accept partial input; absent fields are
/// omitted from the JSON form rather than rendered as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
  /// Server-generated, immutable.
  pub patient_id:    String,
  pub record_type:   String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub first_name:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_name:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date_of_birth: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:         Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone:         Option<String>,
  /// Set once at creation.
  pub created_at:    DateTime<Utc>,
  /// Refreshed by every successful update; never moves backwards.
  pub updated_at:    DateTime<Utc>,
  /// Starts at 1 and grows by exactly 1 per successful update.
  pub version:       u64,
}

impl PatientRecord {
  /// Build a fresh demographic record at version 1.
  pub fn new_patient_info(
    patient_id: String,
    input: PatientInput,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      patient_id,
      record_type: PATIENT_INFO.to_owned(),
      first_name: input.first_name,
      last_name: input.last_name,
      date_of_birth: input.date_of_birth,
      email: input.email,
      phone: input.phone,
      created_at: now,
      updated_at: now,
      version: 1,
    }
  }

  pub fn key(&self) -> RecordKey {
    RecordKey {
      patient_id:  self.patient_id.clone(),
      record_type: self.record_type.clone(),
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// JSON body accepted by create and update.
///
/// Every field is optional and no field is validated; unknown fields are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientInput {
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub date_of_birth: Option<String>,
  pub email:         Option<String>,
  pub phone:         Option<String>,
}

/// The fields an update overwrites. `dateOfBirth` is not updatable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientChanges {
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub email:      Option<String>,
  pub phone:      Option<String>,
}

impl From<PatientInput> for PatientChanges {
  fn from(input: PatientInput) -> Self {
    Self {
      first_name: input.first_name,
      last_name:  input.last_name,
      email:      input.email,
      phone:      input.phone,
    }
  }
}
