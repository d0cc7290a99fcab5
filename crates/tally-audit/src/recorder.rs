//! Lifecycle hooks bridging the protocol server to the audit pipeline.
//!
//! The transport calls `before_tool_call` / `after_tool_call` /
//! `on_request_error` on its own request path. Each hook does only in-memory
//! work (timing, sanitization, classification) and hands the finished event
//! to a detached persistence task; the protocol response is never blocked on
//! the audit write.

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

use tally_core::config::AuditConfig;
use tally_core::policy::{DefaultSensitiveKeyDetector, SensitiveKeyDetector};
use tally_core::protocol::{CallToolParams, CallToolResult, RequestContext, TOOLS_CALL_METHOD};

use crate::alert::AlertEvaluator;
use crate::classify::{classify_error, classify_tool_result, FLAG_AUTH_FAILURE};
use crate::event::{AuditEvent, AuditEventType, SecurityLevel};
use crate::sanitize::{sanitize_params, truncate_string, MAX_STRING_LEN};
use crate::store::{persist_event, AuditStore};
use crate::summary::summarize_result;

/// Records audit events for tool invocations observed through the protocol
/// server's lifecycle hooks.
pub struct AuditRecorder {
    config: AuditConfig,
    detector: Arc<dyn SensitiveKeyDetector>,
    store: Arc<dyn AuditStore>,
    /// Wired after construction; the alerting subsystem depends on this
    /// pipeline, so it cannot be a constructor argument.
    alert: RwLock<Option<Arc<dyn AlertEvaluator>>>,
    /// Start times of in-flight tool calls, keyed by the transport's
    /// per-request correlation id. Entries for abandoned calls are a
    /// tolerated, bounded leak.
    start_times: DashMap<String, Instant>,
}

impl AuditRecorder {
    /// Create a recorder over the given store.
    pub fn new(config: AuditConfig, store: Arc<dyn AuditStore>) -> Self {
        Self {
            config,
            detector: Arc::new(DefaultSensitiveKeyDetector),
            store,
            alert: RwLock::new(None),
            start_times: DashMap::new(),
        }
    }

    /// Replace the sensitive-key policy.
    pub fn with_detector(mut self, detector: Arc<dyn SensitiveKeyDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Wire the downstream alert evaluator.
    pub fn set_alert_evaluator(&self, evaluator: Arc<dyn AlertEvaluator>) {
        if let Ok(mut slot) = self.alert.write() {
            *slot = Some(evaluator);
        }
    }

    /// Invocation-start hook: remember when this call began.
    pub fn before_tool_call(&self, request_id: &str) {
        if !self.config.enabled {
            return;
        }
        self.start_times
            .insert(request_id.to_string(), Instant::now());
    }

    /// Invocation-success hook: build, classify, and dispatch the event.
    ///
    /// Returns to the transport immediately; persistence happens in a
    /// detached task.
    pub fn after_tool_call(
        &self,
        request_id: &str,
        ctx: &RequestContext,
        params: &CallToolParams,
        result: &CallToolResult,
    ) {
        if !self.config.enabled {
            return;
        }

        let duration_ms = self.take_elapsed_ms(request_id);
        let mut event = self.build_event(AuditEventType::ToolCall, ctx, Some(params));
        event.success = !result.is_error();
        event.duration_ms = duration_ms;
        event.result_summary = summarize_result(Some(result));

        classify_tool_result(&mut event, Some(result));
        self.dispatch(event);
    }

    /// Invocation-error hook: only tool-invocation errors are recorded;
    /// errors from unrelated protocol methods are ignored.
    pub fn on_request_error(
        &self,
        request_id: &str,
        method: &str,
        ctx: &RequestContext,
        params: Option<&CallToolParams>,
        error: &str,
    ) {
        if !self.config.enabled || method != TOOLS_CALL_METHOD {
            return;
        }

        let duration_ms = self.take_elapsed_ms(request_id);
        let mut event = self.build_event(AuditEventType::ToolError, ctx, params);
        event.success = false;
        event.duration_ms = duration_ms;
        event.error_message = Some(error.to_string());

        classify_error(&mut event, error);
        self.dispatch(event);
    }

    /// Record a failed authentication attempt.
    ///
    /// Entry point for the auth middleware, which rejects requests before
    /// any tool invocation exists. Without a known tenant the event is
    /// dropped at persistence time like any other nil-tenant event.
    pub fn record_auth_failure(
        &self,
        tenant_id: Option<Uuid>,
        user_id: &str,
        reason: &str,
        client_info: Option<Map<String, Value>>,
    ) {
        if !self.config.enabled {
            return;
        }

        let mut event = AuditEvent::new(
            AuditEventType::AuthFailure,
            tenant_id.unwrap_or_else(Uuid::nil),
            user_id,
            "authenticate",
        );
        event.success = false;
        event.error_message = Some(reason.to_string());
        event.client_info = client_info;
        event.escalate(SecurityLevel::Warning, FLAG_AUTH_FAILURE);

        self.dispatch(event);
    }

    /// Atomically take the recorded start time; a missing entry falls back
    /// to "now" (zero duration) rather than failing.
    fn take_elapsed_ms(&self, request_id: &str) -> u64 {
        self.start_times
            .remove(request_id)
            .map(|(_, started)| started.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    fn build_event(
        &self,
        event_type: AuditEventType,
        ctx: &RequestContext,
        params: Option<&CallToolParams>,
    ) -> AuditEvent {
        let (tenant_id, user_id, user_email) = match ctx.caller_claims() {
            Some(claims) => (
                claims.tenant_uuid(),
                claims.subject.clone(),
                claims.email.clone(),
            ),
            None => (Uuid::nil(), "unknown".to_string(), None),
        };

        let tool_name = params
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let mut event = AuditEvent::new(event_type, tenant_id, user_id, tool_name);
        event.user_email = user_email;
        event.session_id = ctx.session_id.clone();
        event.client_info = ctx.client_info.clone();

        if let Some(params) = params {
            event.request_params = sanitize_params(&params.arguments, self.detector.as_ref());
            event.sql_text = extract_string_arg(&params.arguments, &["sql", "query"])
                .map(|sql| truncate_string(&sql, MAX_STRING_LEN));
            event.prompt = extract_string_arg(&params.arguments, &["prompt"]);
        }

        event
    }

    fn dispatch(&self, event: AuditEvent) {
        tracing::debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            tenant = %event.tenant_id,
            "{}",
            event.to_log_line()
        );

        let store = self.store.clone();
        let alert = self.alert.read().map(|slot| slot.clone()).unwrap_or(None);
        let budget = Duration::from_secs(self.config.store_timeout_secs);
        tokio::spawn(persist_event(store, alert, budget, event));
    }

    /// Number of tool calls currently in flight.
    pub fn in_flight(&self) -> usize {
        self.start_times.len()
    }
}

/// Pull the first of the named string arguments out of a tool's arguments.
fn extract_string_arg(arguments: &Value, keys: &[&str]) -> Option<String> {
    let map = arguments.as_object()?;
    keys.iter()
        .find_map(|key| map.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
}
