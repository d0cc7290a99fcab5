//! Caller claims extracted from a verified token.
//!
//! Token verification itself lives in the auth layer; by the time a request
//! reaches the audit pipeline the transport has already attached the verified
//! claims to the request context (or nothing, for anonymous/failed auth).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity claims attached to an authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerClaims {
    /// Tenant ID this request is scoped to, as carried in the token.
    pub tenant_id: String,

    /// Subject (acting user) identifier.
    pub subject: String,

    /// Email of the acting user, when the token carries one.
    #[serde(default)]
    pub email: Option<String>,
}

impl CallerClaims {
    /// Create claims for a tenant-scoped subject.
    pub fn new(tenant_id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            subject: subject.into(),
            email: None,
        }
    }

    /// Set the email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Parse the tenant ID into the system tenant-ID type.
    ///
    /// A malformed tenant ID yields `Uuid::nil()`; downstream persistence
    /// drops nil-tenant events rather than writing to the wrong tenant.
    pub fn tenant_uuid(&self) -> Uuid {
        Uuid::parse_str(&self.tenant_id).unwrap_or_else(|_| Uuid::nil())
    }
}
