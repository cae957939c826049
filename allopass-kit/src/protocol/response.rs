//! Verified responses.
//!
//! A [`ResponseEnvelope`] can only be built by verifying a
//! [`RawResponse`](crate::transport::RawResponse) against the account's
//! private key, so holding one means the body is authentic. Plain and mapped
//! responses are built only from an envelope.

use tracing::debug;

use crate::{
    document::{Document, Element},
    endpoint::ResponseType,
    error::{ApiError, Result},
    protocol::signer::RequestSigner,
    transport::RawResponse,
};

/// Authentic response: status, signature, headers and body.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    status: u16,
    signature: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseEnvelope {
    /// Verifies `raw` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::FalseSignature`] if the signature header is
    /// missing, empty, or does not match the body. The body is dropped.
    pub fn verify(raw: RawResponse, signer: &RequestSigner<'_>) -> Result<Self> {
        signer.verify_response(&raw.body, raw.signature.as_deref())?;
        Ok(Self {
            status: raw.status,
            signature: raw.signature.unwrap_or_default(),
            headers: raw.headers,
            body: raw.body,
        })
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Verified signature value.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header named `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    /// Raw body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Verified body returned without decoding.
#[derive(Debug, Clone)]
pub struct PlainResponse {
    envelope: ResponseEnvelope,
}

impl PlainResponse {
    /// Wraps a verified envelope.
    #[must_use]
    pub const fn new(envelope: ResponseEnvelope) -> Self {
        Self { envelope }
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.envelope.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        self.envelope.headers()
    }

    /// First header named `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.envelope.header(name)
    }

    /// Body bytes, exactly as received.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.envelope.body()
    }

    /// Body as text, when it is valid UTF-8.
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(self.envelope.body()).ok()
    }

    /// Consumes the response, returning the body.
    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.envelope.body
    }
}

/// Verified body decoded into a document whose status code is zero.
#[derive(Debug, Clone)]
pub struct MappedResponse {
    envelope: ResponseEnvelope,
    document: Document,
    response_type: ResponseType,
}

impl MappedResponse {
    /// Decodes a verified envelope.
    ///
    /// # Errors
    ///
    /// - [`ApiError::WrongFormatResponse`] if the body is not well-formed XML
    ///   or the root `code` attribute is not an integer
    /// - [`ApiError::RemoteError`] if the root `code` is non-zero, carrying the
    ///   root `message` attribute (empty if absent)
    pub fn decode(envelope: ResponseEnvelope, response_type: ResponseType) -> Result<Self> {
        let document = Document::parse(envelope.body())?;
        let root = document.root();

        let code = match root.attribute("code") {
            None => 0,
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                ApiError::WrongFormatResponse(format!("non-numeric status code '{raw}'"))
            })?,
        };
        if code != 0 {
            return Err(ApiError::RemoteError {
                code,
                message: root.attribute("message").unwrap_or_default().to_owned(),
            });
        }

        debug!(?response_type, root = root.name(), "response decoded");
        Ok(Self { envelope, document, response_type })
    }

    /// Decoder this response was built with.
    #[must_use]
    pub const fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// Parsed document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Root element.
    #[must_use]
    pub const fn root(&self) -> &Element {
        self.document.root()
    }

    /// Root `message` attribute, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.root().attribute("message")
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.envelope.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        self.envelope.headers()
    }

    /// Raw body the document was decoded from.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.envelope.body()
    }
}

/// Result of a generic call.
#[derive(Debug, Clone)]
pub enum ApiResponse {
    /// Raw verified body.
    Plain(PlainResponse),
    /// Decoded document.
    Mapped(MappedResponse),
}

impl ApiResponse {
    /// Whether the body was decoded.
    #[must_use]
    pub const fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped(_))
    }

    /// Raw body, whichever variant.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        match self {
            Self::Plain(plain) => plain.body(),
            Self::Mapped(mapped) => mapped.body(),
        }
    }

    /// Borrows the decoded response, if the call was made with mapping.
    #[must_use]
    pub const fn as_mapped(&self) -> Option<&MappedResponse> {
        match self {
            Self::Mapped(mapped) => Some(mapped),
            Self::Plain(_) => None,
        }
    }

    /// Returns the decoded response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidParameter`] for a plain response.
    pub fn into_mapped(self) -> Result<MappedResponse> {
        match self {
            Self::Mapped(mapped) => Ok(mapped),
            Self::Plain(_) => {
                Err(ApiError::InvalidParameter("call was made without mapping".to_owned()))
            }
        }
    }

    /// Returns the plain response, if the call was made without mapping.
    #[must_use]
    pub fn into_plain(self) -> Option<PlainResponse> {
        match self {
            Self::Plain(plain) => Some(plain),
            Self::Mapped(_) => None,
        }
    }
}
