//! # tally-core
//!
//! Shared types for the Tally audit pipeline:
//! - Caller claims attached to authenticated requests
//! - The protocol value types the audit pipeline inspects
//! - The sensitive-key redaction policy boundary
//! - Configuration types shared across all Tally crates

pub mod claims;
pub mod config;
pub mod policy;
pub mod protocol;

pub use claims::CallerClaims;
pub use config::AuditConfig;
pub use policy::{DefaultSensitiveKeyDetector, SensitiveKeyDetector};
pub use protocol::{CallToolParams, CallToolResult, RequestContext, ToolContent};

/// Tenant identifier. `TenantId::nil()` is the "no tenant" zero value;
/// events carrying it are never persisted.
pub type TenantId = uuid::Uuid;
