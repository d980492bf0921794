//! SQL schema and statement text for the patient store.
//!
//! Table names come from configuration, so every statement is rendered once
//! at open time from a validated [`TableNames`]. Identifiers are always
//! double-quoted so keywords such as `order` stay usable as names.

use crate::{Error, Result};

/// Names of the two tables the store manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
  pub patients: String,
  pub audit:    String,
}

impl Default for TableNames {
  fn default() -> Self {
    Self {
      patients: "patient_records".to_owned(),
      audit:    "audit_trail".to_owned(),
    }
  }
}

impl TableNames {
  pub fn new(patients: impl Into<String>, audit: impl Into<String>) -> Self {
    Self {
      patients: patients.into(),
      audit:    audit.into(),
    }
  }

  /// Reject names that are empty, start with a digit, contain anything
  /// outside `[A-Za-z0-9_]`, or collide with each other or with the
  /// patient table's index.
  pub fn validate(&self) -> Result<()> {
    for name in [&self.patients, &self.audit] {
      let valid = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
      if !valid {
        return Err(Error::InvalidTableName(name.clone()));
      }
    }
    if self.patients.eq_ignore_ascii_case(&self.audit) {
      return Err(Error::SharedTableName(self.patients.clone()));
    }
    if self.audit.eq_ignore_ascii_case(&self.patient_index()) {
      return Err(Error::InvalidTableName(self.audit.clone()));
    }
    Ok(())
  }

  /// Name of the `(record_type, created_at)` index on the patient table.
  pub fn patient_index(&self) -> String { format!("{}_type_created_idx", self.patients) }
}

/// Idempotent DDL for both tables.
pub fn schema(t: &TableNames) -> String {
  let patients = &t.patients;
  let audit = &t.audit;
  let index = t.patient_index();
  format!(
    r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS "{patients}" (
    patient_id    TEXT NOT NULL,
    record_type   TEXT NOT NULL,
    first_name    TEXT,
    last_name     TEXT,
    date_of_birth TEXT,
    email         TEXT,
    phone         TEXT,
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC, fixed microsecond precision
    updated_at    TEXT NOT NULL,
    version       INTEGER NOT NULL,
    PRIMARY KEY (patient_id, record_type)
);

CREATE INDEX IF NOT EXISTS "{index}"
    ON "{patients}"(record_type, created_at);

-- Append-only: no UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS "{audit}" (
    audit_id   TEXT NOT NULL,
    timestamp  TEXT NOT NULL,
    method     TEXT NOT NULL,
    path       TEXT NOT NULL,
    source_ip  TEXT,
    user_agent TEXT,
    request_id TEXT,
    PRIMARY KEY (audit_id, timestamp)
);
"#
  )
}

const PATIENT_COLUMNS: &str = "patient_id, record_type, first_name, last_name, \
                               date_of_birth, email, phone, created_at, \
                               updated_at, version";

/// Pre-rendered statements for one set of table names.
#[derive(Debug)]
pub struct Statements {
  pub get:          String,
  pub put:          String,
  pub version_of:   String,
  pub update:       String,
  pub delete:       String,
  pub scan:         String,
  pub audit_insert: String,
  pub audit_count:  String,
  pub audit_list:   String,
}

impl Statements {
  pub fn new(t: &TableNames) -> Self {
    let patients = &t.patients;
    let audit = &t.audit;
    Self {
      get: format!(
        r#"SELECT {PATIENT_COLUMNS} FROM "{patients}"
         WHERE patient_id = ?1 AND record_type = ?2"#
      ),
      put: format!(
        r#"INSERT OR REPLACE INTO "{patients}" ({PATIENT_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#
      ),
      version_of: format!(
        r#"SELECT version FROM "{patients}"
         WHERE patient_id = ?1 AND record_type = ?2"#
      ),
      update: format!(
        r#"UPDATE "{patients}"
         SET first_name = ?3,
             last_name  = ?4,
             email      = ?5,
             phone      = ?6,
             updated_at = MAX(updated_at, ?7),
             version    = version + 1
         WHERE patient_id = ?1 AND record_type = ?2"#
      ),
      delete: format!(
        r#"DELETE FROM "{patients}" WHERE patient_id = ?1 AND record_type = ?2"#
      ),
      scan: format!(
        r#"SELECT {PATIENT_COLUMNS} FROM "{patients}"
         WHERE record_type = ?1
         ORDER BY created_at
         LIMIT ?2"#
      ),
      audit_insert: format!(
        r#"INSERT INTO "{audit}" (
           audit_id, timestamp, method, path, source_ip, user_agent, request_id
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#
      ),
      audit_count: format!(r#"SELECT COUNT(*) FROM "{audit}""#),
      audit_list: format!(
        r#"SELECT audit_id, timestamp, method, path, source_ip, user_agent, request_id
         FROM "{audit}"
         ORDER BY timestamp"#
      ),
    }
  }
}
