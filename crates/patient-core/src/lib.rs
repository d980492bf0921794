//! Core types and trait definitions for the patient-record service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::RecordStore`] and
//! [`audit::AuditSink`]; the HTTP layer depends only on those traits.

pub mod audit;
pub mod provider;
pub mod record;
pub mod store;

pub use record::{PATIENT_INFO, PatientChanges, PatientInput, PatientRecord, RecordKey};
