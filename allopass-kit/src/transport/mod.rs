//! Transport abstraction.
//!
//! A [`Transport`] performs exactly one HTTP exchange for an already signed
//! [`OutboundRequest`] and returns the [`RawResponse`] triple (status,
//! signature header, headers, body) without interpreting the body. Signing
//! happens before and verification after, in [`crate::protocol`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use allopass_kit::{
//!     endpoint::HttpMethod,
//!     transport::{HttpTransport, OutboundRequest, Transport},
//! };
//!
//! # async fn example() -> allopass_kit::error::Result<()> {
//! let transport = HttpTransport::new()?;
//! let request = OutboundRequest {
//!     method: HttpMethod::Get,
//!     url: "https://api.allopass.com/rest/onetime/pricing?site_id=1".parse().unwrap(),
//!     body: None,
//! };
//!
//! let response = transport.send(request).await?;
//! println!("status {} signed: {}", response.status, response.signature.is_some());
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use url::Url;

use crate::{endpoint::HttpMethod, error::Result};

pub mod http;
pub(crate) mod sealed;
#[cfg(test)]
pub(crate) mod stub;

pub use http::HttpTransport;

/// Signed request ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Full URL, including the query string for GET requests.
    pub url: Url,
    /// Form-encoded body for POST requests.
    pub body: Option<String>,
}

/// Unverified response.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the response signature header, if present.
    pub signature: Option<String>,
    /// Response headers, names lowercased.
    pub headers: Vec<(String, String)>,
    /// Raw response body.
    pub body: Vec<u8>,
}

/// Transport protocol abstraction.
///
/// This trait is sealed; only implementations within this crate exist.
///
/// Implementations must:
/// - send exactly one request, never retry
/// - return [`ApiError::UnexpectedStatus`](crate::error::ApiError::UnexpectedStatus)
///   for a non-2xx status without a signature header
/// - hand back signed responses of any status unchanged
pub trait Transport: sealed::private::Sealed + Send + Sync {
    /// Sends one request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`](crate::error::ApiError::Transport) on
    /// network faults and timeouts, and
    /// [`ApiError::UnexpectedStatus`](crate::error::ApiError::UnexpectedStatus)
    /// for unsigned error responses.
    fn send<'a>(
        &'a self,
        request: OutboundRequest,
    ) -> impl Future<Output = Result<RawResponse>> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}
