//! Sensitive-key redaction policy.
//!
//! The audit sanitizer asks this policy whether a parameter key should be
//! hash-redacted before storage. Deployments can supply their own detector;
//! the default matches the usual credential-bearing key names.

use regex::Regex;
use std::sync::LazyLock;

/// Decides whether a parameter key names a sensitive value.
pub trait SensitiveKeyDetector: Send + Sync {
    /// Returns true if values under this key must be hash-redacted.
    fn is_sensitive(&self, key: &str) -> bool;
}

static SENSITIVE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(password|passwd|pwd|secret|token|api[_-]?key|access[_-]?key|private[_-]?key|credential|authorization)",
    )
    .expect("sensitive-key pattern must compile")
});

/// Default detector matching common credential key names.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSensitiveKeyDetector;

impl SensitiveKeyDetector for DefaultSensitiveKeyDetector {
    fn is_sensitive(&self, key: &str) -> bool {
        SENSITIVE_KEY_RE.is_match(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_common_credential_keys() {
        let detector = DefaultSensitiveKeyDetector;
        for key in [
            "password",
            "user_password",
            "API_KEY",
            "apiKey",
            "refresh_token",
            "db_secret",
            "private-key",
            "Authorization",
        ] {
            assert!(detector.is_sensitive(key), "expected {key} to be sensitive");
        }
    }

    #[test]
    fn ignores_ordinary_keys() {
        let detector = DefaultSensitiveKeyDetector;
        for key in ["customer_id", "name", "sql", "limit", "author"] {
            assert!(!detector.is_sensitive(key), "expected {key} to be ordinary");
        }
    }
}
