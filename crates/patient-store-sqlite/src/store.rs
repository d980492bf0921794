//! [`SqliteStore`]: the SQLite implementation of [`RecordStore`] and
//! [`AuditSink`].

use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use patient_core::{
  PatientChanges, PatientRecord, RecordKey,
  audit::{AuditEntry, AuditSink},
  store::{RecordStore, UpdateOutcome},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{
  Result,
  encode::{RawAuditEntry, RawPatient, decode_count, decode_version, encode_dt},
  schema::{Statements, TableNames, schema},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A patient store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  sql:  Arc<Statements>,
}

/// What the update transaction found, before decoding.
enum RawUpdate {
  Missing,
  Mismatch(i64),
  Updated(RawPatient),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, tables: TableNames) -> Result<Self> {
    tables.validate()?;
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, tables).await
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory(tables: TableNames) -> Result<Self> {
    tables.validate()?;
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, tables).await
  }

  async fn init(conn: tokio_rusqlite::Connection, tables: TableNames) -> Result<Self> {
    let ddl = schema(&tables);
    conn
      .call(move |conn| {
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await?;

    tracing::debug!(
      patients = %tables.patients,
      audit = %tables.audit,
      "schema initialised"
    );

    Ok(Self { conn, sql: Arc::new(Statements::new(&tables)) })
  }

  /// Number of rows in the audit table.
  pub async fn count_audit_entries(&self) -> Result<u64> {
    let sql = self.sql.clone();
    let count: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql.audit_count, [], |r| r.get(0))?))
      .await?;
    decode_count(count)
  }

  /// All audit entries, oldest first. Operator tooling only; the request
  /// path never reads the audit trail.
  pub async fn audit_entries(&self) -> Result<Vec<AuditEntry>> {
    let sql = self.sql.clone();
    let raws: Vec<RawAuditEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql.audit_list)?;
        let rows = stmt
          .query_map([], RawAuditEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEntry::into_entry).collect()
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  async fn get(&self, key: RecordKey) -> Result<Option<PatientRecord>> {
    let sql = self.sql.clone();

    let raw: Option<RawPatient> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &sql.get,
              rusqlite::params![key.patient_id, key.record_type],
              RawPatient::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPatient::into_record).transpose()
  }

  async fn put(&self, record: PatientRecord) -> Result<()> {
    let sql = self.sql.clone();
    let raw = RawPatient::from_record(record)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &sql.put,
          rusqlite::params![
            raw.patient_id,
            raw.record_type,
            raw.first_name,
            raw.last_name,
            raw.date_of_birth,
            raw.email,
            raw.phone,
            raw.created_at,
            raw.updated_at,
            raw.version,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn update(
    &self,
    key:              RecordKey,
    changes:          PatientChanges,
    now:              DateTime<Utc>,
    expected_version: Option<u64>,
  ) -> Result<UpdateOutcome> {
    let sql = self.sql.clone();
    let now_str = encode_dt(now);
    // A version that does not fit the column can never match.
    let expected = expected_version.map(|v| i64::try_from(v).unwrap_or(-1));

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<i64> = tx
          .query_row(
            &sql.version_of,
            rusqlite::params![key.patient_id, key.record_type],
            |r| r.get(0),
          )
          .optional()?;

        let Some(current) = current else {
          return Ok(RawUpdate::Missing);
        };
        if let Some(expected) = expected
          && expected != current
        {
          return Ok(RawUpdate::Mismatch(current));
        }

        tx.execute(
          &sql.update,
          rusqlite::params![
            key.patient_id,
            key.record_type,
            changes.first_name,
            changes.last_name,
            changes.email,
            changes.phone,
            now_str,
          ],
        )?;

        let raw = tx.query_row(
          &sql.get,
          rusqlite::params![key.patient_id, key.record_type],
          RawPatient::from_row,
        )?;
        tx.commit()?;
        Ok(RawUpdate::Updated(raw))
      })
      .await?;

    match outcome {
      RawUpdate::Missing => Ok(UpdateOutcome::NotFound),
      RawUpdate::Mismatch(current) => Ok(UpdateOutcome::VersionMismatch {
        current: decode_version(current)?,
      }),
      RawUpdate::Updated(raw) => Ok(UpdateOutcome::Updated(raw.into_record()?)),
    }
  }

  async fn delete(&self, key: RecordKey) -> Result<bool> {
    let sql = self.sql.clone();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &sql.delete,
          rusqlite::params![key.patient_id, key.record_type],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn scan(&self, record_type: String, limit: usize) -> Result<Vec<PatientRecord>> {
    let sql = self.sql.clone();
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawPatient> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql.scan)?;
        let rows = stmt
          .query_map(
            rusqlite::params![record_type, limit_val],
            RawPatient::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPatient::into_record).collect()
  }
}

// ─── AuditSink impl ──────────────────────────────────────────────────────────

impl AuditSink for SqliteStore {
  type Error = crate::Error;

  async fn append(&self, entry: AuditEntry) -> Result<()> {
    let sql = self.sql.clone();
    let raw = RawAuditEntry::from_entry(entry);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &sql.audit_insert,
          rusqlite::params![
            raw.audit_id,
            raw.timestamp,
            raw.method,
            raw.path,
            raw.source_ip,
            raw.user_agent,
            raw.request_id,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
