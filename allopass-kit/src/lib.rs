//! Allopass Kit: signed client for the Allopass billing API
//!
//! Every call to the Allopass REST API carries a signature over its
//! parameters, and every answer carries a signature over its body. This
//! crate builds and signs the requests, checks the answers before anything
//! reads them, and turns the XML documents into navigable trees with typed
//! accessors per endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ AllopassClient               │  one method per endpoint
//! └──────────────┬───────────────┘
//!                │ Endpoint + Parameters
//! ┌──────────────▼───────────────┐
//! │ SignedRequest                │  merge, timestamp, api_sig
//! └──────────────┬───────────────┘
//!                │ OutboundRequest
//! ┌──────────────▼───────────────┐
//! │ Transport (HttpTransport)    │  GET query / POST form
//! └──────────────┬───────────────┘
//!                │ RawResponse
//! ┌──────────────▼───────────────┐
//! │ ResponseEnvelope             │  x-allopass-response-signature
//! └──────────────┬───────────────┘
//!        ┌───────┴────────┐
//! ┌──────▼──────┐  ┌──────▼──────────────┐
//! │ Plain body  │  │ Document + status   │  code / message
//! └─────────────┘  └─────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## 1. Configure
//!
//! ```toml
//! [[accounts]]
//! email = "merchant@example.com"
//! api_key = "5a2b..."
//! private_key = "9c1e..."
//!
//! default_hash = "sha1"
//! default_format = "xml"
//! network_timeout = 30
//! network_protocol = "https"
//! network_port = 443
//! host = "api.allopass.com"
//!
//! [global_parameters]
//! site_id = 127042
//! ```
//!
//! ## 2. Call an endpoint
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use allopass_kit::{AllopassClient, ApiConfig, Parameters};
//!
//! # async fn example() -> allopass_kit::Result<()> {
//! let config = Arc::new(ApiConfig::from_file("allopass.toml")?);
//! let client = AllopassClient::new(config)?;
//!
//! let product = client.product(354926, Parameters::new()).await?;
//! println!("Product: {}", product.name()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## 3. Sign parameters directly
//!
//! ```rust
//! use allopass_kit::protocol::{HashAlgorithm, Parameters, RequestSigner};
//!
//! let signer = RequestSigner::new("private-key", HashAlgorithm::Sha1);
//! let mut params = Parameters::new().with("id", 354926).with("api_key", "key");
//! let signature = signer.sign(&mut params);
//!
//! assert_eq!(signature.len(), 40);
//! assert!(signer.verify_request(&params).is_ok());
//! ```
//!
//! # Error Handling
//!
//! ```rust,no_run
//! use allopass_kit::{AllopassClient, ApiError, Parameters};
//!
//! # async fn example(client: AllopassClient) {
//! match client.validate_codes(Parameters::new().with("code", vec!["9M7QU457"])).await {
//!     Ok(codes) => println!("Validated: {:?}", codes.transaction_id()),
//!     Err(ApiError::RemoteError { code, message }) => eprintln!("Refused ({code}): {message}"),
//!     Err(ApiError::FalseSignature) => eprintln!("Response not authentic"),
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and httpmock"
)]

pub mod client;
pub mod config;
pub mod document;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod protocol;
pub mod security;
pub mod transport;

pub use client::AllopassClient;
pub use config::{Account, ApiConfig, NetworkProtocol, ResponseFormat};
pub use document::{Document, Element};
pub use endpoint::Endpoint;
pub use error::{ApiError, ErrorKind, Result};
pub use protocol::{ApiResponse, HashAlgorithm, MappedResponse, ParamValue, Parameters, PlainResponse};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestSigner;

    #[test]
    fn test_reexports_sign_documented_construction() {
        let signer = RequestSigner::new("secret", HashAlgorithm::Sha1);
        let mut params = Parameters::new().with("id", 354926).with("code", vec!["A", "B"]);
        let signature = signer.sign(&mut params);

        // sha1("codeABid354926" || "secret")
        assert_eq!(signature, "53c6591ec9740d3b3d25dcc17a91bdd1d70048ba");
        assert_eq!(params.get("api_sig"), Some(&ParamValue::from(signature.as_str())));
    }
}
