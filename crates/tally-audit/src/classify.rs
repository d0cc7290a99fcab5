//! Security classification of tool-call outcomes.
//!
//! Two independent one-shot passes: one over a tool's handled error result,
//! one over a raised error message. Each pass applies at most one outcome
//! (first match wins) and leaves the event at its caller-supplied default
//! when nothing matches. Injection markers are checked before anything else
//! in both passes: a missed attack is the highest-cost false negative.

use crate::event::{AuditEvent, AuditEventType, SecurityLevel};
use tally_core::protocol::CallToolResult;

/// Flag recorded for detected injection attempts.
pub const FLAG_SQL_INJECTION: &str = "sql_injection_attempt";
/// Flag recorded for unauthorized tool access in a handled result.
pub const FLAG_UNAUTHORIZED: &str = "unauthorized_access";
/// Flag recorded for authentication/authorization errors.
pub const FLAG_AUTH_FAILURE: &str = "auth_failure";
/// Flag recorded for rate-limit hits.
pub const FLAG_RATE_LIMIT: &str = "rate_limit";

/// Markers indicating an injection attempt in result content.
const INJECTION_MARKERS: &[&str] = &["security_violation", "injection"];

/// Markers indicating the caller reached a tool or capability it lacks.
const UNAUTHORIZED_MARKERS: &[&str] = &["tool not enabled", "authentication required"];

/// Classify a handled (business-level) tool error carried in the result.
///
/// No-op when the result is absent or did not signal an error. The injection
/// scan runs across all content items before the unauthorized scan starts,
/// so a result carrying both markers always classifies as injection
/// regardless of content-item order.
pub fn classify_tool_result(event: &mut AuditEvent, result: Option<&CallToolResult>) {
    let Some(result) = result else { return };
    if !result.is_error() {
        return;
    }

    let texts: Vec<String> = result
        .content
        .iter()
        .filter_map(|item| item.as_text())
        .map(str::to_lowercase)
        .collect();

    for text in &texts {
        if contains_any(text, INJECTION_MARKERS) {
            event.event_type = AuditEventType::SqlInjectionAttempt;
            event.escalate(SecurityLevel::Critical, FLAG_SQL_INJECTION);
            return;
        }
    }

    for text in &texts {
        if contains_any(text, UNAUTHORIZED_MARKERS) {
            event.escalate(SecurityLevel::Warning, FLAG_UNAUTHORIZED);
            return;
        }
    }
}

/// Classify a transport/handler-level error message.
pub fn classify_error(event: &mut AuditEvent, message: &str) {
    let message = message.to_lowercase();

    if message.contains("injection") {
        event.event_type = AuditEventType::SqlInjectionAttempt;
        event.escalate(SecurityLevel::Critical, FLAG_SQL_INJECTION);
    } else if message.contains("authentication") || message.contains("unauthorized") {
        event.escalate(SecurityLevel::Warning, FLAG_AUTH_FAILURE);
    } else if message.contains("rate limit") {
        event.event_type = AuditEventType::RateLimited;
        event.escalate(SecurityLevel::Warning, FLAG_RATE_LIMIT);
    }
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| text.contains(marker))
}
