//! # tally-audit
//!
//! Audit and security classification pipeline for the Tally MCP server.
//!
//! Every tool invocation observed through the protocol server's lifecycle
//! hooks is timed, parameter-sanitized, content-classified for security
//! relevance, and durably recorded without blocking the caller:
//!
//! - [`sanitize`] redacts sensitive parameters (deterministic digests),
//!   rewrites SQL string literals, and caps oversized strings.
//! - [`summary`] compresses a tool result into a bounded digest, surfacing
//!   a numeric `row_count` for downstream volume-based alerting.
//! - [`classify`] assigns a security level and taxonomy flags from result
//!   content and error messages, first match wins.
//! - [`recorder`] bridges the transport's before/after/error hooks to the
//!   pipeline and tracks in-flight call start times.
//! - [`store`] persists one row per event into the tenant's audit table
//!   from a detached, timeout-bounded task, then invokes the optional
//!   [`alert`] evaluator.
//!
//! The pipeline is strictly best-effort: persistence failures are logged
//! and dropped, and nothing here ever propagates an error back to the
//! protocol caller.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tally_audit::{AuditRecorder, PgAuditStore};
//! use tally_core::config::AuditConfig;
//!
//! # async fn example(pool: sqlx::PgPool) {
//! let store = Arc::new(PgAuditStore::new(pool));
//! let recorder = Arc::new(AuditRecorder::new(AuditConfig::default(), store));
//!
//! // The transport calls the hooks:
//! recorder.before_tool_call("req-1");
//! // ... tool executes ...
//! # }
//! ```

pub mod alert;
pub mod classify;
pub mod error;
pub mod event;
pub mod recorder;
pub mod sanitize;
pub mod store;
pub mod summary;

pub use alert::AlertEvaluator;
pub use error::AuditError;
pub use event::{AuditEvent, AuditEventBuilder, AuditEventType, SecurityLevel};
pub use recorder::AuditRecorder;
pub use sanitize::{hash_sensitive, redact_sql_literals, sanitize_params};
pub use store::{AuditStore, PgAuditStore, TenantScope};
pub use summary::summarize_result;
