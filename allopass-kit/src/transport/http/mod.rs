//! HTTP transport implementation using reqwest.

use std::time::Duration;

use reqwest::{
    Client,
    header::{CONTENT_TYPE, HeaderMap},
};
use tracing::{debug, instrument, warn};

use crate::{
    config::{ApiConfig, DEFAULT_TIMEOUT_SECS},
    endpoint::HttpMethod,
    error::{ApiError, Result},
    protocol::RESPONSE_SIGNATURE_HEADER,
    transport::{OutboundRequest, RawResponse, Transport, sealed},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP/1.1 transport over rustls.
///
/// One [`Client`] per transport; clone-free sharing across calls through
/// `&self`. The configured timeout bounds each request end to end.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use allopass_kit::transport::{HttpTransport, Transport};
///
/// let transport = HttpTransport::with_timeout(Duration::from_secs(10)).unwrap();
/// assert_eq!(transport.protocol_name(), "http");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl sealed::private::Sealed for HttpTransport {}

impl HttpTransport {
    /// Creates a transport with the default 30 second timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a transport with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("allopass-kit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self { client, timeout })
    }

    /// Creates a transport using the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::with_timeout(config.timeout())
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(skip(self, request), fields(method = %request.method, path = request.url.path()))]
    async fn execute(&self, request: OutboundRequest) -> Result<RawResponse> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(request.url),
            HttpMethod::Post => self
                .client
                .post(request.url)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(request.body.unwrap_or_default()),
        };

        let response = builder.send().await?;
        let status = response.status();

        let headers = collect_headers(response.headers());
        let signature = response
            .headers()
            .get(RESPONSE_SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if !status.is_success() && signature.is_none() {
            warn!(status = status.as_u16(), "unsigned error response");
            return Err(ApiError::UnexpectedStatus { status: status.as_u16() });
        }

        let body = response.bytes().await?.to_vec();
        debug!(status = status.as_u16(), body_len = body.len(), "response received");

        Ok(RawResponse { status: status.as_u16(), signature, headers, body })
    }
}

/// Copies response headers, decoding non-UTF-8 bytes lossily.
fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(k, v)| (k.as_str().to_owned(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect()
}

impl Transport for HttpTransport {
    async fn send<'a>(&'a self, request: OutboundRequest) -> Result<RawResponse> {
        self.execute(request).await
    }

    fn protocol_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use url::Url;

    use super::*;

    fn get(server: &MockServer, path: &str) -> OutboundRequest {
        OutboundRequest { method: HttpMethod::Get, url: Url::parse(&server.url(path)).unwrap(), body: None }
    }

    #[test]
    fn test_collect_headers_keeps_non_ascii_values() {
        use reqwest::header::{HeaderName, HeaderValue};

        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static("x-note"),
            HeaderValue::from_bytes("café".as_bytes()).unwrap(),
        );
        map.insert(HeaderName::from_static("x-plain"), HeaderValue::from_static("ok"));

        let headers = collect_headers(&map);
        assert!(headers.contains(&("x-note".to_owned(), "café".to_owned())));
        assert!(headers.contains(&("x-plain".to_owned(), "ok".to_owned())));
    }

    #[test]
    fn test_http_transport_new() {
        let transport = HttpTransport::new().unwrap();
        assert_eq!(transport.timeout(), Duration::from_secs(30));
        assert_eq!(transport.protocol_name(), "http");
    }

    #[tokio::test]
    async fn test_returns_signature_header_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rest/product").query_param("id", "1");
                then.status(200)
                    .header("X-Allopass-Response-Signature", "abc123")
                    .body("<response code=\"0\"/>");
            })
            .await;

        let transport = HttpTransport::new().unwrap();
        let response = transport.send(get(&server, "/rest/product?id=1")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.signature.as_deref(), Some("abc123"));
        assert_eq!(response.body, b"<response code=\"0\"/>");
        assert!(response.headers.iter().any(|(k, _)| k == "x-allopass-response-signature"));
    }

    #[tokio::test]
    async fn test_post_sends_form_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/rest/transaction/prepare")
                    .header("content-type", FORM_CONTENT_TYPE)
                    .body("site_id=1&amount=2");
                then.status(200).header("X-Allopass-Response-Signature", "s").body("ok");
            })
            .await;

        let transport = HttpTransport::new().unwrap();
        let request = OutboundRequest {
            method: HttpMethod::Post,
            url: Url::parse(&server.url("/rest/transaction/prepare")).unwrap(),
            body: Some("site_id=1&amount=2".to_owned()),
        };
        let response = transport.send(request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.body, b"ok");
    }

    #[tokio::test]
    async fn test_unsigned_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rest/product");
                then.status(503).body("maintenance");
            })
            .await;

        let transport = HttpTransport::new().unwrap();
        let err = transport.send(get(&server, "/rest/product")).await.unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 503 }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_signed_error_status_is_returned() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rest/product");
                then.status(400).header("X-Allopass-Response-Signature", "sig").body("<response/>");
            })
            .await;

        let transport = HttpTransport::new().unwrap();
        let response = transport.send(get(&server, "/rest/product")).await.unwrap();
        assert_eq!(response.status, 400);
        assert_eq!(response.signature.as_deref(), Some("sig"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let transport = HttpTransport::with_timeout(Duration::from_secs(2)).unwrap();
        let request = OutboundRequest {
            method: HttpMethod::Get,
            url: Url::parse("http://127.0.0.1:1/rest/product").unwrap(),
            body: None,
        };
        let err = transport.send(request).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
