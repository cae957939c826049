//! Signed-request / verified-response protocol.
//!
//! Every call goes through the same steps:
//!
//! 1. [`SignedRequest`] merges configuration, caller and protocol parameters
//!    and signs the canonical string with the account's private key.
//! 2. A [`Transport`](crate::transport::Transport) sends it once and returns
//!    the raw response.
//! 3. [`ResponseEnvelope`] recomputes the body signature and rejects any
//!    mismatch with [`ApiError::FalseSignature`](crate::error::ApiError::FalseSignature).
//! 4. The verified body is handed back as a [`PlainResponse`] or decoded into
//!    a [`MappedResponse`], which surfaces non-zero status codes as
//!    [`ApiError::RemoteError`](crate::error::ApiError::RemoteError).
//!
//! # Signature construction
//!
//! The canonical string concatenates, in ascending name order, each
//! parameter name followed by its value (`api_sig` excluded, list elements
//! concatenated). The signature is `hex(H(canonical || private_key))` where
//! `H` is the configured [`HashAlgorithm`]. Response bodies are signed the
//! same way and the result is sent in the `X-Allopass-Response-Signature`
//! header.

pub mod params;
pub mod request;
pub mod response;
pub mod signer;

#[cfg(test)]
mod tests;

pub use params::{ParamValue, Parameters, RESERVED_NAMES};
pub use request::SignedRequest;
pub use response::{ApiResponse, MappedResponse, PlainResponse, ResponseEnvelope};
pub use signer::{HashAlgorithm, RESPONSE_SIGNATURE_HEADER, RequestSigner, signatures_match};
