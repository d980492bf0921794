//! Sources of identifiers and time.
//!
//! Injected into the dispatcher so tests can pin both.

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

/// Current server time.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Unique opaque identifiers for records and audit entries.
pub trait IdGenerator: Send + Sync {
  fn next_id(&self) -> String;
}

/// Wall-clock time in UTC, truncated to whole microseconds so a timestamp
/// handed back to a caller matches what a store persists.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }
}

/// Random (v4) UUIDs in hyphenated lowercase form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
  fn next_id(&self) -> String { Uuid::new_v4().hyphenated().to_string() }
}
