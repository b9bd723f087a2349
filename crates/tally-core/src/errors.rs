//! Error taxonomy for the tally workspace.
//!
//! - [`FormatError`]: duration/estimate text that does not parse
//! - [`ValidationError`]: missing or out-of-range domain fields; reported
//!   to the acting client only, never broadcast
//! - [`NotFoundError`]: unknown session code
//! - [`ConflictError`]: session-code collision during generation; retried
//!   internally and never surfaced to clients
//! - [`TransportError`]: a delivery failure on one connection; never
//!   affects other subscribers

use thiserror::Error;

/// A duration token that does not match `<digits><unit>`.
///
/// Carries the offending input so callers can show exactly what failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid duration: {token:?}")]
pub struct FormatError {
    /// The offending token (or trailing partial token).
    pub token: String,
}

impl FormatError {
    /// Create a format error for the given offending token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// A semantically invalid domain value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    /// Field that failed validation.
    pub field: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for `field`.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// An entity lookup that found nothing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("not found: {what}")]
pub struct NotFoundError {
    /// What was looked up, e.g. `session "a1B2c3D4e5"`.
    pub what: String,
}

impl NotFoundError {
    /// Create a not-found error for an unknown session code.
    #[must_use]
    pub fn session(code: &str) -> Self {
        Self {
            what: format!("session {code:?}"),
        }
    }

    /// Create a not-found error for an unknown item.
    #[must_use]
    pub fn item(id: &str) -> Self {
        Self {
            what: format!("item {id:?}"),
        }
    }
}

/// A uniqueness collision (session code already taken).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("code already in use: {code:?}")]
pub struct ConflictError {
    /// The colliding code.
    pub code: String,
}

/// A failed delivery to a single connection.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("delivery to connection {connection} failed: {reason}")]
pub struct TransportError {
    /// Connection the delivery was destined for.
    pub connection: String,
    /// Why the delivery failed.
    pub reason: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_display_names_token() {
        let err = FormatError::new("12y");
        assert_eq!(err.to_string(), "invalid duration: \"12y\"");
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::new("title", "must not be empty");
        assert_eq!(err.to_string(), "invalid title: must not be empty");
    }

    #[test]
    fn not_found_session_display() {
        let err = NotFoundError::session("a1B2c3D4e5");
        assert!(err.to_string().contains("a1B2c3D4e5"));
    }

    #[test]
    fn conflict_error_display() {
        let err = ConflictError {
            code: "abc".to_owned(),
        };
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError {
            connection: "conn_1".to_owned(),
            reason: "channel closed".to_owned(),
        };
        assert!(err.to_string().contains("conn_1"));
        assert!(err.to_string().contains("channel closed"));
    }

    #[test]
    fn errors_are_std_error() {
        let _: &dyn std::error::Error = &FormatError::new("x");
        let _: &dyn std::error::Error = &ValidationError::new("f", "m");
        let _: &dyn std::error::Error = &NotFoundError::session("c");
    }
}
