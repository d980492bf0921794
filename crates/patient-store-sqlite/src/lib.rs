//! SQLite backend for the patient-record service.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One database file holds both the
//! patient table and the audit table.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::TableNames;
pub use store::SqliteStore;
