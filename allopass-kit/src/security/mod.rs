//! Security controls around signed calls.
//!
//! The audit module records signing, verification and rejection events with
//! per-call correlation ids on the `audit` tracing target:
//!
//! ```rust
//! use allopass_kit::security::audit::{AuditEvent, AuditEventType};
//! use uuid::Uuid;
//!
//! let event = AuditEvent::new(AuditEventType::SignatureRejected, "api-key-1234", Uuid::new_v4())
//!     .with_endpoint("product")
//!     .with_http_status(200);
//!
//! allopass_kit::security::audit::audit_log(&event);
//! ```
//!
//! Route the `audit` target to its own sink with an `EnvFilter` directive
//! such as `audit=info`.

pub mod audit;

pub use audit::{AuditDetails, AuditEvent, AuditEventType, audit_log, redact_api_key};
