//! Audit logging for signing and verification events.
//!
//! Every signed call emits structured events on the `audit` tracing target,
//! correlated by a per-call request id. API keys are redacted to their last
//! four characters; private keys and signatures are never logged.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Types of auditable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Request parameters were signed and are about to be sent.
    RequestSigned,
    /// Response signature matched its body.
    ResponseVerified,
    /// Response signature was missing or did not match.
    SignatureRejected,
    /// Authentic response carried a non-zero status code.
    RemoteErrorReported,
    /// HTTP exchange failed before a response could be verified.
    TransportFailed,
    /// Call finished with a verified, successfully decoded response.
    CallCompleted,
}

/// Contextual information attached to an [`AuditEvent`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditDetails {
    /// Endpoint path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Email of the signing account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// HTTP status of the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Remote status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_code: Option<i64>,
    /// Error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Elapsed time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Audit log entry.
///
/// # Examples
///
/// ```
/// use allopass_kit::security::audit::{AuditEvent, AuditEventType, audit_log};
/// use uuid::Uuid;
///
/// let event = AuditEvent::new(AuditEventType::RequestSigned, "0123456789abcdef", Uuid::new_v4())
///     .with_endpoint("onetime/pricing")
///     .with_account("merchant@example.com");
///
/// assert_eq!(event.api_key, "************cdef");
/// audit_log(&event);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// When the event occurred.
    pub timestamp: SystemTime,
    /// What happened.
    pub event_type: AuditEventType,
    /// Redacted API key of the signing account.
    pub api_key: String,
    /// Per-call correlation id.
    pub request_id: Uuid,
    /// Event details.
    pub details: AuditDetails,
}

impl AuditEvent {
    /// Creates an event. `api_key` is redacted on the way in.
    #[must_use]
    pub fn new(event_type: AuditEventType, api_key: &str, request_id: Uuid) -> Self {
        Self {
            timestamp: SystemTime::now(),
            event_type,
            api_key: redact_api_key(api_key),
            request_id,
            details: AuditDetails::default(),
        }
    }

    /// Adds the endpoint path.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.details.endpoint = Some(endpoint.into());
        self
    }

    /// Adds the signing account email.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.details.account = Some(account.into());
        self
    }

    /// Adds the HTTP status.
    #[must_use]
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.details.http_status = Some(status);
        self
    }

    /// Adds the remote status code.
    #[must_use]
    pub fn with_remote_code(mut self, code: i64) -> Self {
        self.details.remote_code = Some(code);
        self
    }

    /// Adds an error description.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.details.error = Some(error.into());
        self
    }

    /// Adds the elapsed time.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "duration in ms fits u64 for practical values"
    )]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.details.duration_ms = Some(duration.as_millis() as u64);
        self
    }
}

/// Logs an audit event on the `audit` target.
pub fn audit_log(event: &AuditEvent) {
    tracing::info!(
        target: "audit",
        timestamp = ?event.timestamp,
        event_type = ?event.event_type,
        api_key = %event.api_key,
        request_id = %event.request_id,
        details = ?event.details,
        "AUDIT"
    );
}

/// Masks an API key, keeping its last four characters.
///
/// # Examples
///
/// ```
/// use allopass_kit::security::audit::redact_api_key;
///
/// assert_eq!(redact_api_key("0123456789"), "******6789");
/// assert_eq!(redact_api_key("abcd"), "****");
/// assert_eq!(redact_api_key(""), "");
/// ```
#[must_use]
pub fn redact_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{visible}", "*".repeat(chars.len() - 4))
}
