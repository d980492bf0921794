//! Audit entries and the append-only [`AuditSink`] abstraction.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of the audit trail, written once per inbound request and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
  pub audit_id:   String,
  /// Server time at which the request was received.
  pub timestamp:  DateTime<Utc>,
  pub method:     String,
  pub path:       String,
  pub source_ip:  Option<String>,
  pub user_agent: Option<String>,
  pub request_id: Option<String>,
}

/// Append-only destination for [`AuditEntry`] values.
///
/// Callers treat every write as best-effort: an error is reported back but
/// the request that produced the entry carries on regardless.
pub trait AuditSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a single entry.
  fn append(
    &self,
    entry: AuditEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
