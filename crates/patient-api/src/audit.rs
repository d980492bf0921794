//! Audit middleware: one [`AuditEntry`] per inbound request, written before
//! routing and regardless of how the request ends.
//!
//! The write is attempted exactly once. A failure is logged and swallowed so
//! the audit trail can never fail or delay the primary operation beyond that
//! single attempt.

use std::net::SocketAddr;

use axum::{
  extract::{ConnectInfo, Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use chrono::{DateTime, Utc};
use patient_core::{
  audit::{AuditEntry, AuditSink},
  store::RecordStore,
};

use crate::AppState;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REQUEST_ID: &str = "x-request-id";

/// `axum::middleware::from_fn_with_state` entry point.
pub async fn record_request<S, A>(
  State(state): State<AppState<S, A>>,
  req: Request,
  next: Next,
) -> Response
where
  S: RecordStore + 'static,
  A: AuditSink + 'static,
{
  let entry = entry_for(
    &req,
    state.ids.next_id(),
    state.clock.now(),
    state.settings.trust_forwarded_for,
  );
  let audit_id = entry.audit_id.clone();

  if let Err(e) = state.audit.append(entry).await {
    tracing::warn!(%audit_id, error = %e, "failed to write audit entry");
  }

  next.run(req).await
}

/// Build the entry describing `req`.
///
/// `sourceIp` is the socket peer. `X-Forwarded-For` is consulted only when
/// `trust_forwarded_for` is set, since any caller can send it.
pub fn entry_for(
  req: &Request,
  audit_id: String,
  timestamp: DateTime<Utc>,
  trust_forwarded_for: bool,
) -> AuditEntry {
  let headers = req.headers();
  let peer = req
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.ip().to_string());

  AuditEntry {
    audit_id,
    timestamp,
    method: req.method().as_str().to_owned(),
    path: req.uri().path().to_owned(),
    source_ip: trust_forwarded_for
      .then(|| forwarded_for(headers))
      .flatten()
      .or(peer),
    user_agent: header_str(headers, header::USER_AGENT.as_str()),
    request_id: header_str(headers, X_REQUEST_ID),
  }
}

/// Right-most hop of `X-Forwarded-For`: the address the trusted proxy in
/// front of us saw. Hops further left are supplied by the client.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
  header_str(headers, X_FORWARDED_FOR)?
    .rsplit(',')
    .map(str::trim)
    .find(|s| !s.is_empty())
    .map(str::to_owned)
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned)
}
