//! Error type for `patient-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// Table names are interpolated into SQL, so only identifiers matching
  /// `[A-Za-z_][A-Za-z0-9_]*` are accepted.
  #[error("invalid table name: {0:?}")]
  InvalidTableName(String),

  #[error("patient and audit tables must differ (both {0:?})")]
  SharedTableName(String),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("corrupt row: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
