//! Protocol value types.
//!
//! The JSON-RPC transport (framing, routing, session handling) is provided by
//! the MCP server library; this module defines only the slice of the protocol
//! the audit pipeline inspects: tool-call parameters, tool-call results, and
//! the per-request context the transport attaches after authentication.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::claims::CallerClaims;

/// JSON-RPC method name for tool invocations.
pub const TOOLS_CALL_METHOD: &str = "tools/call";

/// Call tool request parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Call tool response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// Whether the tool signaled a handled (business-level) error.
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

/// Tool response content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "json")]
    Json { json: Value },
}

impl ToolContent {
    /// The textual form of this content item, if it has one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Json { .. } => None,
        }
    }
}

/// Request context attached by the transport.
///
/// In HTTP mode this is populated per-request from the verified Authorization
/// header; in stdio mode it is set once at startup from the environment token.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Verified caller claims, absent for unauthenticated requests.
    pub claims: Option<CallerClaims>,

    /// Transport session identifier, when the transport tracks sessions.
    pub session_id: Option<String>,

    /// Client metadata supplied by the transport (e.g. client IP).
    pub client_info: Option<serde_json::Map<String, Value>>,
}

impl RequestContext {
    /// Identity accessor: the verified claims for this request, if any.
    pub fn caller_claims(&self) -> Option<&CallerClaims> {
        self.claims.as_ref()
    }
}
