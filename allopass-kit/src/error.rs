//! Error types for the Allopass API client.
//!
//! Every failure a call can produce is a distinct [`ApiError`] variant. All
//! errors implement the standard [`std::error::Error`] trait via
//! [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Configuration Errors** ([`ApiError::ConfigMissing`], [`ApiError::ConfigCorrupted`],
//!   [`ApiError::ConfigMissingSection`], [`ApiError::AccountNotFound`]): detected when the
//!   configuration is loaded or an account is selected
//! - **Transport Errors** ([`ApiError::Transport`], [`ApiError::UnexpectedStatus`]): the HTTP
//!   exchange itself failed
//! - **Integrity Errors** ([`ApiError::FalseSignature`]): the response could not be
//!   authenticated
//! - **Format Errors** ([`ApiError::WrongFormatResponse`]): the authenticated body is not a
//!   well-formed document
//! - **Remote Errors** ([`ApiError::RemoteError`]): the service rejected the call
//!
//! # Examples
//!
//! ```
//! use allopass_kit::error::{ApiError, ErrorKind};
//!
//! let err = ApiError::RemoteError { code: 6, message: "Invalid site_id".to_owned() };
//! assert_eq!(err.kind(), ErrorKind::Remote);
//! assert!(err.is_remote());
//! assert!(!err.is_transport());
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for client operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while calling the Allopass API.
///
/// # Error Recovery
///
/// - **Configuration errors**: fix the configuration file, never retried
/// - **Transport errors** ([`Transport`](Self::Transport),
///   [`UnexpectedStatus`](Self::UnexpectedStatus)): the caller may retry
/// - **Integrity errors** ([`FalseSignature`](Self::FalseSignature)): treat as a security
///   event, do not retry blindly
/// - **Remote errors** ([`RemoteError`](Self::RemoteError)): fix the request parameters
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configuration file does not exist.
    #[error("Configuration file is missing: {}", .0.display())]
    ConfigMissing(PathBuf),

    /// Configuration file could not be read, is not valid TOML, or holds invalid values.
    ///
    /// # Recovery
    ///
    /// Check the file syntax and value ranges (port, timeout, hash algorithm,
    /// non-empty keys).
    #[error("Configuration file is corrupted or bad formatted: {0}")]
    ConfigCorrupted(String),

    /// A required configuration key is absent.
    #[error("Configuration file is missing a required section: {0}")]
    ConfigMissingSection(String),

    /// An account email was provided that does not exist in the configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use allopass_kit::error::ApiError;
    ///
    /// let err = ApiError::AccountNotFound("c@x".to_owned());
    /// assert!(err.to_string().contains("c@x"));
    /// ```
    #[error("Account not found in configuration: {0}")]
    AccountNotFound(String),

    /// HTTP request failed.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, refused connections, DNS failures,
    /// TLS errors.
    ///
    /// # Recovery
    ///
    /// The client never retries. Retry at the call site if the operation is
    /// safe to repeat.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service answered with a non-success HTTP status and no signed payload.
    #[error("API returned unexpected HTTP status {status}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
    },

    /// Response signature does not match the body.
    ///
    /// The body of such a response is never exposed. This can indicate a
    /// tampered response or a private key mismatch.
    #[error("The signature of the response is false, possible hack attempt")]
    FalseSignature,

    /// Authenticated response body is not a well-formed document.
    #[error("Response is not well formatted: {0}")]
    WrongFormatResponse(String),

    /// Service reported an application-level error.
    ///
    /// The code and message are the ones carried by the response, verbatim.
    #[error("API remote error {code}: {message}")]
    RemoteError {
        /// Remote error code (non-zero).
        code: i64,
        /// Remote error message.
        message: String,
    },

    /// Caller supplied an unusable parameter.
    ///
    /// Raised for reserved protocol parameter names (`api_key`, `api_ts`,
    /// `api_hash`, `api_sig`, `format`) and unbuildable request URLs.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Decoded document lacks a required node.
    #[error("Missing field in response: {0}")]
    MissingField(String),

    /// Decoded document holds a value of the wrong type.
    #[error("Invalid value for field {path}: {value:?}")]
    InvalidField {
        /// Path of the offending node.
        path: String,
        /// Raw value found.
        value: String,
    },
}

/// Coarse classification of [`ApiError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration or account selection fault.
    Config,
    /// Network or HTTP-level failure.
    Transport,
    /// Response authenticity check failed.
    Signature,
    /// Response body could not be decoded.
    Format,
    /// Service-reported failure.
    Remote,
    /// Caller misuse.
    Usage,
    /// Typed accessor failure.
    Field,
}

impl ApiError {
    /// Returns the category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigMissing(_)
            | Self::ConfigCorrupted(_)
            | Self::ConfigMissingSection(_)
            | Self::AccountNotFound(_) => ErrorKind::Config,
            Self::Transport(_) | Self::UnexpectedStatus { .. } => ErrorKind::Transport,
            Self::FalseSignature => ErrorKind::Signature,
            Self::WrongFormatResponse(_) => ErrorKind::Format,
            Self::RemoteError { .. } => ErrorKind::Remote,
            Self::InvalidParameter(_) => ErrorKind::Usage,
            Self::MissingField(_) | Self::InvalidField { .. } => ErrorKind::Field,
        }
    }

    /// Whether the error happened in the HTTP exchange.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport)
    }

    /// Whether the error was reported by the remote service.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_false_signature_display() {
        let error = ApiError::FalseSignature;
        assert_eq!(
            error.to_string(),
            "The signature of the response is false, possible hack attempt"
        );
    }

    #[test]
    fn test_remote_error_display() {
        let error = ApiError::RemoteError { code: 4, message: "Unknown product".to_owned() };
        assert_eq!(error.to_string(), "API remote error 4: Unknown product");
    }

    #[test]
    fn test_config_missing_display() {
        let error = ApiError::ConfigMissing(PathBuf::from("/etc/allopass.toml"));
        assert!(error.to_string().contains("/etc/allopass.toml"));
    }

    #[test]
    fn test_kinds_are_distinct() {
        assert_eq!(ApiError::FalseSignature.kind(), ErrorKind::Signature);
        assert_eq!(ApiError::WrongFormatResponse("x".into()).kind(), ErrorKind::Format);
        assert_eq!(ApiError::UnexpectedStatus { status: 503 }.kind(), ErrorKind::Transport);
        assert_eq!(ApiError::AccountNotFound("a".into()).kind(), ErrorKind::Config);
        assert_eq!(ApiError::MissingField("name".into()).kind(), ErrorKind::Field);
    }

    #[test]
    fn test_remote_is_not_transport() {
        let error = ApiError::RemoteError { code: 1, message: String::new() };
        assert!(error.is_remote());
        assert!(!error.is_transport());
        assert!(ApiError::UnexpectedStatus { status: 500 }.is_transport());
    }
}
