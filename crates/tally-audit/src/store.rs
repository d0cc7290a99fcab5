//! Audit event persistence.
//!
//! The dispatcher runs as one detached task per event: it acquires a
//! tenant-scoped store handle, serializes the event's structured sub-fields,
//! executes a single parameterized insert, and invokes the optional alert
//! evaluator. The whole attempt is bounded by one timeout; failures are
//! logged and the event is dropped, never retried. Audit backpressure must
//! not reach the serving path.

use regex::Regex;
use serde_json::{Map, Value};
use sqlx::postgres::PgPool;
use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;
use uuid::Uuid;

use async_trait::async_trait;

use crate::alert::AlertEvaluator;
use crate::error::AuditError;
use crate::event::AuditEvent;

/// A short-lived, tenant-scoped store handle.
///
/// Every statement the scope runs is bound to the tenant it was acquired
/// for. Scopes are acquired fresh per persistence attempt and released on
/// every exit path (drop covers cancellation).
#[async_trait]
pub trait TenantScope: Send {
    /// The tenant this scope is bound to.
    fn tenant_id(&self) -> Uuid;

    /// Insert one audit event row.
    async fn insert_event(&mut self, event: &AuditEvent) -> Result<(), AuditError>;

    /// Release the underlying handle.
    async fn release(self: Box<Self>);
}

/// Tenant-scoped store acquisition.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn acquire(&self, tenant_id: Uuid) -> Result<Box<dyn TenantScope>, AuditError>;
}

/// Persist one event, detached from the invocation that produced it.
///
/// Spawned per event by the recorder; the caller never awaits it. Every
/// failure path logs and returns: an audit write is best-effort by contract.
pub async fn persist_event(
    store: Arc<dyn AuditStore>,
    alert: Option<Arc<dyn AlertEvaluator>>,
    budget: Duration,
    event: AuditEvent,
) {
    if event.tenant_id.is_nil() {
        tracing::warn!(
            tool = %event.tool_name,
            user = %event.user_id,
            "dropping audit event without tenant id"
        );
        return;
    }

    if tokio::time::timeout(budget, persist_scoped(store, alert, event))
        .await
        .is_err()
    {
        tracing::warn!(
            budget_ms = budget.as_millis() as u64,
            "audit persistence timed out; event dropped"
        );
    }
}

async fn persist_scoped(
    store: Arc<dyn AuditStore>,
    alert: Option<Arc<dyn AlertEvaluator>>,
    event: AuditEvent,
) {
    let mut scope = match store.acquire(event.tenant_id).await {
        Ok(scope) => scope,
        Err(e) => {
            tracing::warn!(
                tenant = %event.tenant_id,
                error = %redact_error(&e.to_string()),
                "failed to acquire tenant scope; audit event dropped"
            );
            return;
        }
    };

    match scope.insert_event(&event).await {
        Ok(()) => {
            if let Some(evaluator) = alert {
                if let Err(e) = evaluator.evaluate(scope.as_mut(), &event).await {
                    // The event is already durably stored; the alert failure
                    // only loses the notification.
                    tracing::warn!(
                        tenant = %event.tenant_id,
                        event_id = %event.event_id,
                        error = %redact_error(&e.to_string()),
                        "alert evaluation failed for persisted audit event"
                    );
                }
            }
        }
        Err(e) => {
            tracing::error!(
                tenant = %event.tenant_id,
                event_id = %event.event_id,
                error = %redact_error(&e.to_string()),
                "failed to persist audit event"
            );
        }
    }

    scope.release().await;
}

/// Serialize a structured sub-field for storage.
///
/// Empty and absent mappings both become SQL NULL; a serialization failure
/// degrades the field to NULL rather than aborting the write.
pub(crate) fn structured_field(map: Option<&Map<String, Value>>) -> Option<Value> {
    let map = map?;
    if map.is_empty() {
        return None;
    }
    serde_json::to_value(map).ok()
}

static CREDENTIAL_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(password|passwd|pwd|secret|token|api[_-]?key)\s*=\s*[^\s,;]+")
        .expect("credential pattern must compile")
});

/// Redact credential-shaped content from an error message before logging.
///
/// Store and driver errors can echo connection strings or literal values;
/// this rewrites `password=...`-shaped pairs and quoted literals so they
/// never reach the operational logs.
pub fn redact_error(message: &str) -> String {
    let message = CREDENTIAL_PAIR_RE.replace_all(message, "${1}=[redacted]");
    crate::sanitize::redact_sql_literals(&message)
}

// ===== Postgres store =====

/// Postgres-backed audit store over a shared connection pool.
///
/// Pooling is sqlx's concern; `acquire` checks out one connection per
/// persistence attempt and returns it on release/drop.
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn acquire(&self, tenant_id: Uuid) -> Result<Box<dyn TenantScope>, AuditError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AuditError::ScopeAcquisition(e.to_string()))?;
        Ok(Box::new(PgTenantScope { conn, tenant_id }))
    }
}

const INSERT_EVENT_SQL: &str = r#"
INSERT INTO audit_events (
    event_id, occurred_at, tenant_id, user_id, user_email, session_id,
    event_type, tool_name, request_params, prompt, sql_text, success,
    error_message, result_summary, duration_ms, security_level,
    security_flags, client_info
) VALUES (
    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
    $17, $18
)
"#;

struct PgTenantScope {
    conn: sqlx::pool::PoolConnection<sqlx::Postgres>,
    tenant_id: Uuid,
}

#[async_trait]
impl TenantScope for PgTenantScope {
    fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    async fn insert_event(&mut self, event: &AuditEvent) -> Result<(), AuditError> {
        sqlx::query(INSERT_EVENT_SQL)
            .bind(event.event_id)
            .bind(event.occurred_at)
            .bind(self.tenant_id)
            .bind(&event.user_id)
            .bind(event.user_email.as_deref())
            .bind(event.session_id.as_deref())
            .bind(event.event_type.as_str())
            .bind(&event.tool_name)
            .bind(structured_field(event.request_params.as_ref()))
            .bind(event.prompt.as_deref())
            .bind(event.sql_text.as_deref())
            .bind(event.success)
            .bind(event.error_message.as_deref())
            .bind(structured_field(event.result_summary.as_ref()))
            .bind(event.duration_ms as i64)
            .bind(event.security_level.as_str())
            .bind(&event.security_flags)
            .bind(structured_field(event.client_info.as_ref()))
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    async fn release(self: Box<Self>) {
        // Dropping the pooled connection returns it to the pool.
        drop(self);
    }
}
