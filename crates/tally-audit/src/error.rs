//! Error types for the audit crate.

use thiserror::Error;

/// Errors that can occur during audit persistence.
///
/// Nothing in this enum ever propagates to the protocol caller; these errors
/// exist for the store and alert seams and surface only in operational logs.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to acquire a tenant-scoped store handle.
    #[error("failed to acquire tenant scope: {0}")]
    ScopeAcquisition(String),

    /// Failed to persist an event.
    #[error("failed to store audit event: {0}")]
    StoreFailed(String),

    /// Alert evaluation failed after a successful write.
    #[error("alert evaluation failed: {0}")]
    AlertFailed(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
