//! Downstream alert evaluation boundary.
//!
//! The alerting subsystem consumes persisted audit events (e.g. to fire a
//! large-data-export rule off `result_summary.row_count`). It is wired into
//! the recorder *after* construction: the alert subsystem depends on the
//! audit store, so a constructor-time dependency would be circular.

use async_trait::async_trait;

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::store::TenantScope;

/// Evaluates alert rules against a freshly persisted event.
///
/// Invoked inside the persistence task, after a successful insert, with the
/// same tenant scope the insert used. An evaluator error is logged by the
/// dispatcher; it never retro-actively fails the audit write.
#[async_trait]
pub trait AlertEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        scope: &mut dyn TenantScope,
        event: &AuditEvent,
    ) -> Result<(), AuditError>;
}
