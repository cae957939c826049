//! Keyed request signatures and response signature checks.
//!
//! Both directions use the same salted digest: the hex-encoded hash of the
//! signed bytes followed by the account's private key. For requests the
//! signed bytes are [`Parameters::canonical_string`]; for responses they are
//! the raw body.

use std::{fmt, str::FromStr};

use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;
use tracing::{debug, instrument, warn};

use crate::{
    error::{ApiError, Result},
    protocol::params::{API_SIGNATURE, Parameters},
};

/// Response header carrying the body signature.
pub const RESPONSE_SIGNATURE_HEADER: &str = "x-allopass-response-signature";

/// Digest used for signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-1 (service default).
    #[default]
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// Name sent in the `api_hash` parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Hex digest of `data` salted with `key`.
    #[must_use]
    pub fn salted_hex(self, data: &[u8], key: &[u8]) -> String {
        match self {
            Self::Sha1 => hex::encode(Sha1::new().chain_update(data).chain_update(key).finalize()),
            Self::Sha256 => {
                hex::encode(Sha256::new().chain_update(data).chain_update(key).finalize())
            }
            Self::Sha512 => {
                hex::encode(Sha512::new().chain_update(data).chain_update(key).finalize())
            }
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            other => Err(ApiError::ConfigCorrupted(format!("unsupported hash algorithm '{other}'"))),
        }
    }
}

/// Compares two signatures without short-circuiting on the first differing byte.
///
/// Hex case is ignored.
#[must_use]
pub fn signatures_match(expected: &str, supplied: &str) -> bool {
    let supplied = supplied.trim().to_ascii_lowercase();
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}

/// Signs requests and checks responses for one account.
pub struct RequestSigner<'a> {
    private_key: &'a str,
    algorithm: HashAlgorithm,
}

impl fmt::Debug for RequestSigner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("private_key", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl<'a> RequestSigner<'a> {
    /// Creates a signer over `private_key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use allopass_kit::protocol::{HashAlgorithm, Parameters, RequestSigner};
    ///
    /// let signer = RequestSigner::new("secret", HashAlgorithm::Sha1);
    /// let mut params = Parameters::from([("id", "354926")]);
    /// let signature = signer.sign(&mut params);
    ///
    /// assert_eq!(signature.len(), 40);
    /// assert!(signer.verify_request(&params).is_ok());
    /// ```
    #[must_use]
    pub const fn new(private_key: &'a str, algorithm: HashAlgorithm) -> Self {
        Self { private_key, algorithm }
    }

    /// Digest used by this signer.
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Computes the signature of `params` without modifying them.
    #[must_use]
    pub fn compute_signature(&self, params: &Parameters) -> String {
        self.algorithm.salted_hex(params.canonical_string().as_bytes(), self.private_key.as_bytes())
    }

    /// Signs `params` in place, inserting `api_sig`, and returns the signature.
    ///
    /// Any `api_sig` already present is ignored by the computation and replaced.
    #[instrument(skip(self, params), fields(param_count = params.len(), algorithm = %self.algorithm))]
    pub fn sign(&self, params: &mut Parameters) -> String {
        let signature = self.compute_signature(params);
        params.insert(API_SIGNATURE, signature.clone());
        debug!("request parameters signed");
        signature
    }

    /// Checks the `api_sig` carried by `params`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::FalseSignature`] if `api_sig` is absent or does not match.
    pub fn verify_request(&self, params: &Parameters) -> Result<()> {
        let supplied = match params.get(API_SIGNATURE) {
            Some(value) => value.canonical(),
            None => return Err(ApiError::FalseSignature),
        };
        if signatures_match(&self.compute_signature(params), &supplied) {
            Ok(())
        } else {
            Err(ApiError::FalseSignature)
        }
    }

    /// Expected signature of a response body.
    #[must_use]
    pub fn response_signature(&self, body: &[u8]) -> String {
        self.algorithm.salted_hex(body, self.private_key.as_bytes())
    }

    /// Checks a response body against its signature header.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::FalseSignature`] if the header is missing, empty,
    /// or does not match the body.
    #[instrument(skip(self, body, supplied), fields(body_len = body.len()))]
    pub fn verify_response(&self, body: &[u8], supplied: Option<&str>) -> Result<()> {
        let Some(supplied) = supplied.filter(|s| !s.trim().is_empty()) else {
            warn!("response carries no signature");
            return Err(ApiError::FalseSignature);
        };

        if signatures_match(&self.response_signature(body), supplied) {
            debug!("response signature verified");
            Ok(())
        } else {
            warn!("response signature mismatch");
            Err(ApiError::FalseSignature)
        }
    }
}
