//! Audit event types.
//!
//! One `AuditEvent` is constructed per observed tool invocation (or failure),
//! classified once, then handed to the persistence dispatcher, which is its
//! terminal consumer. Events are never mutated after dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Type of audit event.
///
/// Non-exhaustive taxonomy; classification may extend it with new categories
/// as new result/error patterns are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Ordinary tool call.
    ToolCall,
    /// Tool invocation failed at the transport/handler level.
    ToolError,
    /// Result or error content matched an injection marker.
    SqlInjectionAttempt,
    /// Invocation hit a rate limit.
    RateLimited,
    /// Authentication failed.
    AuthFailure,
    /// Caller reached for a tool or resource it is not entitled to.
    UnauthorizedAccess,
    /// Sensitive data was touched.
    SensitiveDataAccess,
}

impl AuditEventType {
    /// Stable snake_case name, used for the persisted column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToolCall => "tool_call",
            Self::ToolError => "tool_error",
            Self::SqlInjectionAttempt => "sql_injection_attempt",
            Self::RateLimited => "rate_limited",
            Self::AuthFailure => "auth_failure",
            Self::UnauthorizedAccess => "unauthorized_access",
            Self::SensitiveDataAccess => "sensitive_data_access",
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToolCall => write!(f, "TOOL_CALL"),
            Self::ToolError => write!(f, "TOOL_ERROR"),
            Self::SqlInjectionAttempt => write!(f, "SQL_INJECTION_ATTEMPT"),
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::AuthFailure => write!(f, "AUTH_FAILURE"),
            Self::UnauthorizedAccess => write!(f, "UNAUTHORIZED_ACCESS"),
            Self::SensitiveDataAccess => write!(f, "SENSITIVE_DATA_ACCESS"),
        }
    }
}

/// Ordered severity of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    Normal,
    Warning,
    Critical,
}

impl SecurityLevel {
    /// Stable snake_case name, used for the persisted column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit event: one observed tool invocation or its failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: Uuid,

    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,

    // ===== Identity / context =====
    /// Tenant ID. `Uuid::nil()` means "unknown tenant"; such events are
    /// dropped at persistence time.
    pub tenant_id: Uuid,

    /// Acting user identifier.
    pub user_id: String,

    /// Email of the acting user, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,

    /// Transport session identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    // ===== Classification =====
    /// Event type.
    pub event_type: AuditEventType,

    /// Severity assigned by the classification pass.
    pub security_level: SecurityLevel,

    /// Machine-readable tags explaining why the level was elevated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_flags: Vec<String>,

    // ===== Invocation detail =====
    /// Tool name (e.g. "listCustomers", "runQuery").
    pub tool_name: String,

    /// Sanitized request parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_params: Option<Map<String, Value>>,

    /// Natural-language prompt, when the tool carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// SQL text submitted with the call, size-capped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_text: Option<String>,

    /// Whether the invocation succeeded.
    pub success: bool,

    /// Error message, for failed invocations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Bounded digest of the tool result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<Map<String, Value>>,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    // ===== Provenance =====
    /// Client metadata supplied by the transport (e.g. client IP).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_info: Option<Map<String, Value>>,
}

impl AuditEvent {
    /// Create a new audit event with the required fields.
    pub fn new(
        event_type: AuditEventType,
        tenant_id: Uuid,
        user_id: impl Into<String>,
        tool_name: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            tenant_id,
            user_id: user_id.into(),
            user_email: None,
            session_id: None,
            event_type,
            security_level: SecurityLevel::Normal,
            security_flags: Vec::new(),
            tool_name: tool_name.into(),
            request_params: None,
            prompt: None,
            sql_text: None,
            success: true,
            error_message: None,
            result_summary: None,
            duration_ms: 0,
            client_info: None,
        }
    }

    /// Create a builder for an audit event.
    pub fn builder(
        event_type: AuditEventType,
        tenant_id: Uuid,
        user_id: impl Into<String>,
        tool_name: impl Into<String>,
    ) -> AuditEventBuilder {
        AuditEventBuilder {
            event: AuditEvent::new(event_type, tenant_id, user_id, tool_name),
        }
    }

    /// Elevate the event to the given level and record why.
    ///
    /// Levels never go down: a Critical event stays Critical even if a later
    /// caller asks for Warning.
    pub fn escalate(&mut self, level: SecurityLevel, flag: &str) {
        if level > self.security_level {
            self.security_level = level;
        }
        self.security_flags.push(flag.to_string());
    }

    /// Format the event as a human-readable log line.
    ///
    /// Format: `[timestamp] EVENT_TYPE tenant=... user=... tool=... [sql=...]`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} tenant={} user={} tool={} level={}",
            self.occurred_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.event_type,
            self.tenant_id,
            self.user_id,
            self.tool_name,
            self.security_level,
        );

        if let Some(ref sql) = self.sql_text {
            // Truncate long SQL for console output
            let preview = if sql.len() > 100 {
                let mut end = 100;
                while !sql.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &sql[..end])
            } else {
                sql.clone()
            };
            line.push_str(&format!(" sql=\"{}\"", preview.replace('\n', " ")));
        }

        if !self.security_flags.is_empty() {
            line.push_str(&format!(" flags=[{}]", self.security_flags.join(",")));
        }

        if let Some(ref error) = self.error_message {
            line.push_str(&format!(" error=\"{}\"", error.replace('"', "'")));
        }

        line.push_str(&format!(" duration_ms={}", self.duration_ms));

        line
    }
}

/// Builder for creating audit events.
#[derive(Debug)]
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    /// Set the user email.
    pub fn user_email(mut self, email: impl Into<String>) -> Self {
        self.event.user_email = Some(email.into());
        self
    }

    /// Set the session ID.
    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.event.session_id = Some(id.into());
        self
    }

    /// Set the sanitized request parameters.
    pub fn request_params(mut self, params: Map<String, Value>) -> Self {
        self.event.request_params = Some(params);
        self
    }

    /// Set the natural-language prompt.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.event.prompt = Some(prompt.into());
        self
    }

    /// Set the SQL text.
    pub fn sql_text(mut self, sql: impl Into<String>) -> Self {
        self.event.sql_text = Some(sql.into());
        self
    }

    /// Set the success flag.
    pub fn success(mut self, success: bool) -> Self {
        self.event.success = success;
        self
    }

    /// Set the error message.
    pub fn error_message(mut self, error: impl Into<String>) -> Self {
        self.event.error_message = Some(error.into());
        self
    }

    /// Set the result summary.
    pub fn result_summary(mut self, summary: Map<String, Value>) -> Self {
        self.event.result_summary = Some(summary);
        self
    }

    /// Set the duration in milliseconds.
    pub fn duration_ms(mut self, duration: u64) -> Self {
        self.event.duration_ms = duration;
        self
    }

    /// Set the client metadata.
    pub fn client_info(mut self, info: Map<String, Value>) -> Self {
        self.event.client_info = Some(info);
        self
    }

    /// Build the audit event.
    pub fn build(self) -> AuditEvent {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let tenant = Uuid::new_v4();
        let event = AuditEvent::builder(AuditEventType::ToolCall, tenant, "user:alice", "runQuery")
            .sql_text("SELECT * FROM orders")
            .duration_ms(15)
            .success(true)
            .build();

        assert_eq!(event.event_type, AuditEventType::ToolCall);
        assert_eq!(event.tenant_id, tenant);
        assert_eq!(event.sql_text.as_deref(), Some("SELECT * FROM orders"));
        assert_eq!(event.duration_ms, 15);
        assert!(event.security_flags.is_empty());
        assert_eq!(event.security_level, SecurityLevel::Normal);
    }

    #[test]
    fn security_levels_are_ordered() {
        assert!(SecurityLevel::Normal < SecurityLevel::Warning);
        assert!(SecurityLevel::Warning < SecurityLevel::Critical);
    }

    #[test]
    fn escalate_never_lowers_the_level() {
        let mut event =
            AuditEvent::new(AuditEventType::ToolCall, Uuid::new_v4(), "user:a", "tool");
        event.escalate(SecurityLevel::Critical, "sql_injection_attempt");
        event.escalate(SecurityLevel::Warning, "auth_failure");

        assert_eq!(event.security_level, SecurityLevel::Critical);
        assert_eq!(
            event.security_flags,
            vec!["sql_injection_attempt", "auth_failure"]
        );
    }

    #[test]
    fn log_line_carries_type_and_context() {
        let event = AuditEvent::builder(
            AuditEventType::ToolError,
            Uuid::new_v4(),
            "user:bob",
            "updateTicket",
        )
        .sql_text("UPDATE tickets SET status = 'open' WHERE id = 1")
        .error_message("connection reset")
        .success(false)
        .build();

        let line = event.to_log_line();
        assert!(line.contains("TOOL_ERROR"));
        assert!(line.contains("user=user:bob"));
        assert!(line.contains("tool=updateTicket"));
        assert!(line.contains("error=\"connection reset\""));
    }

    #[test]
    fn event_type_display_and_column_names() {
        assert_eq!(format!("{}", AuditEventType::SqlInjectionAttempt), "SQL_INJECTION_ATTEMPT");
        assert_eq!(AuditEventType::SqlInjectionAttempt.as_str(), "sql_injection_attempt");
        assert_eq!(AuditEventType::RateLimited.as_str(), "rate_limited");
    }
}
