//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed microsecond
//! precision and a `Z` suffix, so comparing the strings compares the instants.

use chrono::{DateTime, SecondsFormat, Utc};
use patient_core::{PatientRecord, audit::AuditEntry};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Version ─────────────────────────────────────────────────────────────────

pub fn encode_version(v: u64) -> Result<i64> {
  i64::try_from(v).map_err(|_| Error::Decode(format!("version {v} out of range")))
}

pub fn decode_version(v: i64) -> Result<u64> {
  u64::try_from(v).map_err(|_| Error::Decode(format!("negative version {v}")))
}

pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Decode(format!("negative row count {n}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw column values of one patient row, in `PATIENT_COLUMNS` order.
pub struct RawPatient {
  pub patient_id:    String,
  pub record_type:   String,
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub date_of_birth: Option<String>,
  pub email:         Option<String>,
  pub phone:         Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
  pub version:       i64,
}

impl RawPatient {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      patient_id:    row.get(0)?,
      record_type:   row.get(1)?,
      first_name:    row.get(2)?,
      last_name:     row.get(3)?,
      date_of_birth: row.get(4)?,
      email:         row.get(5)?,
      phone:         row.get(6)?,
      created_at:    row.get(7)?,
      updated_at:    row.get(8)?,
      version:       row.get(9)?,
    })
  }

  pub fn from_record(record: PatientRecord) -> Result<Self> {
    Ok(Self {
      version:       encode_version(record.version)?,
      created_at:    encode_dt(record.created_at),
      updated_at:    encode_dt(record.updated_at),
      patient_id:    record.patient_id,
      record_type:   record.record_type,
      first_name:    record.first_name,
      last_name:     record.last_name,
      date_of_birth: record.date_of_birth,
      email:         record.email,
      phone:         record.phone,
    })
  }

  pub fn into_record(self) -> Result<PatientRecord> {
    Ok(PatientRecord {
      patient_id:    self.patient_id,
      record_type:   self.record_type,
      first_name:    self.first_name,
      last_name:     self.last_name,
      date_of_birth: self.date_of_birth,
      email:         self.email,
      phone:         self.phone,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
      version:       decode_version(self.version)?,
    })
  }
}

/// Raw column values of one audit row.
pub struct RawAuditEntry {
  pub audit_id:   String,
  pub timestamp:  String,
  pub method:     String,
  pub path:       String,
  pub source_ip:  Option<String>,
  pub user_agent: Option<String>,
  pub request_id: Option<String>,
}

impl RawAuditEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      audit_id:   row.get(0)?,
      timestamp:  row.get(1)?,
      method:     row.get(2)?,
      path:       row.get(3)?,
      source_ip:  row.get(4)?,
      user_agent: row.get(5)?,
      request_id: row.get(6)?,
    })
  }

  pub fn from_entry(entry: AuditEntry) -> Self {
    Self {
      timestamp:  encode_dt(entry.timestamp),
      audit_id:   entry.audit_id,
      method:     entry.method,
      path:       entry.path,
      source_ip:  entry.source_ip,
      user_agent: entry.user_agent,
      request_id: entry.request_id,
    }
  }

  pub fn into_entry(self) -> Result<AuditEntry> {
    Ok(AuditEntry {
      audit_id:   self.audit_id,
      timestamp:  decode_dt(&self.timestamp)?,
      method:     self.method,
      path:       self.path,
      source_ip:  self.source_ip,
      user_agent: self.user_agent,
      request_id: self.request_id,
    })
  }
}
