//! Signed request construction and execution.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    config::{Account, ApiConfig},
    endpoint::{EndpointDescriptor, HttpMethod, ResponseKind},
    error::{ApiError, Result},
    protocol::{
        params::{API_HASH, API_KEY, API_TIMESTAMP, FORMAT, Parameters},
        response::{ApiResponse, MappedResponse, PlainResponse, ResponseEnvelope},
        signer::RequestSigner,
    },
    security::audit::{AuditEvent, AuditEventType, audit_log},
    transport::{OutboundRequest, RawResponse, Transport},
};

/// One signed call, built per request and executed once.
///
/// Parameters are merged in increasing priority: configuration global
/// parameters, caller parameters, then `api_key`, `api_ts`, `api_hash` and
/// `format`. The merged set is signed and `api_sig` inserted at
/// construction.
///
/// # Examples
///
/// ```
/// use allopass_kit::{
///     config::{Account, ApiConfig},
///     endpoint::Endpoint,
///     protocol::{Parameters, SignedRequest},
/// };
///
/// # fn example() -> allopass_kit::error::Result<()> {
/// let config = ApiConfig::new("api.allopass.com", vec![Account::new("key", "secret")?])?;
/// let request = SignedRequest::with_timestamp(
///     &config,
///     Endpoint::ProductDetail.descriptor(),
///     Parameters::from([("id", "354926")]),
///     true,
///     None,
///     1_300_000_000,
/// )?;
///
/// let url = request.url()?;
/// assert_eq!(url.path(), "/rest/product");
/// assert!(request.parameters().contains("api_sig"));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug)]
pub struct SignedRequest<'a> {
    request_id: Uuid,
    config: &'a ApiConfig,
    account: &'a Account,
    descriptor: EndpointDescriptor,
    parameters: Parameters,
    mapping: bool,
    signature: String,
}

impl<'a> SignedRequest<'a> {
    /// Builds and signs a request stamped with the current time.
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidParameter`] if `parameters` uses a reserved name
    /// - [`ApiError::AccountNotFound`] if `account_email` matches no account
    pub fn new(
        config: &'a ApiConfig,
        descriptor: EndpointDescriptor,
        parameters: Parameters,
        mapping: bool,
        account_email: Option<&str>,
    ) -> Result<Self> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ApiError::InvalidParameter(format!("system time error: {e}")))?
            .as_secs();
        Self::with_timestamp(config, descriptor, parameters, mapping, account_email, timestamp)
    }

    /// Builds and signs a request with an explicit `api_ts`.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_timestamp(
        config: &'a ApiConfig,
        descriptor: EndpointDescriptor,
        parameters: Parameters,
        mapping: bool,
        account_email: Option<&str>,
        timestamp: u64,
    ) -> Result<Self> {
        parameters.ensure_unreserved()?;
        let account = config.resolve_account(account_email)?;

        let mut merged = config.global_parameters().clone();
        merged.merge(&parameters);
        merged.insert(API_KEY, account.api_key());
        merged.insert(API_TIMESTAMP, timestamp.to_string());
        merged.insert(API_HASH, config.hash().as_str());
        merged.insert(FORMAT, config.format().as_str());

        let signature = RequestSigner::new(account.private_key(), config.hash()).sign(&mut merged);
        let request = Self {
            request_id: Uuid::new_v4(),
            config,
            account,
            descriptor,
            parameters: merged,
            mapping,
            signature,
        };

        debug!(
            request_id = %request.request_id,
            endpoint = descriptor.path,
            param_count = request.parameters.len(),
            "request signed"
        );
        audit_log(&request.audit_event(AuditEventType::RequestSigned));
        Ok(request)
    }

    /// Correlation id used in logs and audit events.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Endpoint metadata.
    #[must_use]
    pub const fn descriptor(&self) -> EndpointDescriptor {
        self.descriptor
    }

    /// Merged and signed parameters, including `api_sig`.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Request signature.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Whether the response will be decoded.
    #[must_use]
    pub const fn mapping(&self) -> bool {
        self.mapping
    }

    /// Signing account.
    #[must_use]
    pub const fn account(&self) -> &Account {
        self.account
    }

    /// Target URL. GET requests carry the parameters in the query string.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidParameter`] if the configured host does not
    /// form a valid URL.
    pub fn url(&self) -> Result<Url> {
        let raw = format!("{}/{}", self.config.base_url(), self.descriptor.path);
        let mut url = Url::parse(&raw)
            .map_err(|e| ApiError::InvalidParameter(format!("cannot build URL '{raw}': {e}")))?;
        if self.descriptor.method == HttpMethod::Get {
            url.set_query(Some(&self.parameters.to_query_string()));
        }
        Ok(url)
    }

    /// Wire form of this request.
    ///
    /// # Errors
    ///
    /// Same as [`url`](Self::url).
    pub fn to_outbound(&self) -> Result<OutboundRequest> {
        let body = match self.descriptor.method {
            HttpMethod::Get => None,
            HttpMethod::Post => Some(self.parameters.to_query_string()),
        };
        Ok(OutboundRequest { method: self.descriptor.method, url: self.url()?, body })
    }

    /// Sends the request once and returns the unverified response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] or [`ApiError::UnexpectedStatus`] on
    /// transport failure.
    pub async fn dispatch<T: Transport>(&self, transport: &T) -> Result<RawResponse> {
        let outbound = self.to_outbound()?;
        match transport.send(outbound).await {
            Ok(raw) => Ok(raw),
            Err(err) => {
                warn!(request_id = %self.request_id, error = %err, "transport failure");
                audit_log(
                    &self.audit_event(AuditEventType::TransportFailed).with_error(err.to_string()),
                );
                Err(err)
            }
        }
    }

    /// Verifies `raw` and decodes it according to the mapping flag.
    ///
    /// # Errors
    ///
    /// - [`ApiError::FalseSignature`] if verification fails
    /// - [`ApiError::WrongFormatResponse`] or [`ApiError::RemoteError`] from
    ///   decoding, when mapping
    pub fn build_response(&self, raw: RawResponse) -> Result<ApiResponse> {
        let status = raw.status;
        let signer = RequestSigner::new(self.account.private_key(), self.config.hash());

        let envelope = match ResponseEnvelope::verify(raw, &signer) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(request_id = %self.request_id, status, "response signature rejected");
                audit_log(
                    &self.audit_event(AuditEventType::SignatureRejected).with_http_status(status),
                );
                return Err(err);
            }
        };
        audit_log(&self.audit_event(AuditEventType::ResponseVerified).with_http_status(status));

        match self.descriptor.response_kind(self.mapping) {
            ResponseKind::Plain => Ok(ApiResponse::Plain(PlainResponse::new(envelope))),
            ResponseKind::Mapped(response_type) => {
                match MappedResponse::decode(envelope, response_type) {
                    Ok(mapped) => Ok(ApiResponse::Mapped(mapped)),
                    Err(err) => {
                        if let ApiError::RemoteError { code, message } = &err {
                            warn!(
                                request_id = %self.request_id,
                                code,
                                remote_message = %message,
                                "remote error"
                            );
                            audit_log(
                                &self
                                    .audit_event(AuditEventType::RemoteErrorReported)
                                    .with_remote_code(*code)
                                    .with_error(message.as_str()),
                            );
                        }
                        Err(err)
                    }
                }
            }
        }
    }

    /// Sends the request and returns the verified, decoded response.
    ///
    /// Consumes the request: each signed request is sent exactly once.
    ///
    /// # Errors
    ///
    /// Every error of [`dispatch`](Self::dispatch) and
    /// [`build_response`](Self::build_response).
    #[instrument(
        skip(self, transport),
        fields(
            request_id = %self.request_id,
            endpoint = self.descriptor.path,
            method = %self.descriptor.method,
            mapping = self.mapping,
            protocol = transport.protocol_name()
        )
    )]
    pub async fn execute<T: Transport>(self, transport: &T) -> Result<ApiResponse> {
        let started = Instant::now();
        info!("calling endpoint");
        let raw = self.dispatch(transport).await?;
        let response = self.build_response(raw)?;
        let elapsed = started.elapsed();
        info!(?elapsed, "call completed");
        audit_log(&self.completion_event(elapsed));
        Ok(response)
    }

    fn completion_event(&self, elapsed: Duration) -> AuditEvent {
        self.audit_event(AuditEventType::CallCompleted).with_duration(elapsed)
    }

    fn audit_event(&self, event_type: AuditEventType) -> AuditEvent {
        let event = AuditEvent::new(event_type, self.account.api_key(), self.request_id)
            .with_endpoint(self.descriptor.path);
        match self.account.email() {
            Some(email) => event.with_account(email),
            None => event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        endpoint::{Endpoint, ResponseType},
        protocol::{HashAlgorithm, ParamValue},
        transport::stub::StubTransport,
    };

    fn config() -> ApiConfig {
        ApiConfig::from_toml(
            r#"
            host = "api.allopass.com"
            network_protocol = "https"
            network_port = 443
            network_timeout = 30
            default_hash = "sha1"
            default_format = "xml"

            [global_parameters]
            locale = "en"
            site_id = 1

            [[accounts]]
            email = "a@x"
            api_key = "key-a"
            private_key = "secret-a"

            [[accounts]]
            email = "b@x"
            api_key = "key-b"
            private_key = "secret-b"
            "#,
        )
        .unwrap()
    }

    fn build<'a>(config: &'a ApiConfig, endpoint: Endpoint, params: Parameters) -> SignedRequest<'a> {
        SignedRequest::with_timestamp(config, endpoint.descriptor(), params, true, None, 1_300_000_000)
            .unwrap()
    }

    #[test]
    fn test_protocol_parameters_are_added() {
        let config = config();
        let request = build(&config, Endpoint::ProductDetail, Parameters::from([("id", "354926")]));
        let params = request.parameters();

        assert_eq!(params.get("api_key"), Some(&ParamValue::Text("key-a".to_owned())));
        assert_eq!(params.get("api_ts"), Some(&ParamValue::Text("1300000000".to_owned())));
        assert_eq!(params.get("api_hash"), Some(&ParamValue::Text("sha1".to_owned())));
        assert_eq!(params.get("format"), Some(&ParamValue::Text("xml".to_owned())));
        assert_eq!(params.get("api_sig"), Some(&ParamValue::Text(request.signature().to_owned())));
    }

    #[test]
    fn test_signature_covers_merged_parameters() {
        let config = config();
        let request = build(&config, Endpoint::ProductDetail, Parameters::from([("id", "354926")]));
        let signer = RequestSigner::new("secret-a", HashAlgorithm::Sha1);
        assert!(signer.verify_request(request.parameters()).is_ok());

        let expected = HashAlgorithm::Sha1.salted_hex(
            b"api_hashsha1api_keykey-aapi_ts1300000000formatxmlid354926localeensite_id1",
            b"secret-a",
        );
        assert_eq!(request.signature(), expected);
    }

    #[test]
    fn test_caller_overrides_global_parameters() {
        let config = config();
        let request = build(&config, Endpoint::OnetimePricing, Parameters::from([("site_id", "42")]));
        assert_eq!(request.parameters().get("site_id"), Some(&ParamValue::Text("42".to_owned())));
        assert_eq!(request.parameters().get("locale"), Some(&ParamValue::Text("en".to_owned())));
    }

    #[test]
    fn test_reserved_parameter_rejected() {
        let config = config();
        let err = SignedRequest::new(
            &config,
            Endpoint::ProductDetail.descriptor(),
            Parameters::from([("api_key", "mine")]),
            true,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[test]
    fn test_account_selection() {
        let config = config();
        let request = SignedRequest::new(
            &config,
            Endpoint::ProductDetail.descriptor(),
            Parameters::new(),
            true,
            Some("b@x"),
        )
        .unwrap();
        assert_eq!(request.account().api_key(), "key-b");

        let err = SignedRequest::new(
            &config,
            Endpoint::ProductDetail.descriptor(),
            Parameters::new(),
            true,
            Some("c@x"),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::AccountNotFound(_)));
    }

    #[test]
    fn test_get_url_carries_query() {
        let config = config();
        let request = build(&config, Endpoint::ProductDetail, Parameters::from([("id", "354926")]));
        let outbound = request.to_outbound().unwrap();

        assert_eq!(outbound.method, HttpMethod::Get);
        assert!(outbound.body.is_none());
        assert_eq!(outbound.url.scheme(), "https");
        assert_eq!(outbound.url.host_str(), Some("api.allopass.com"));
        assert_eq!(outbound.url.path(), "/rest/product");
        let query: Vec<(String, String)> = outbound.url.query_pairs().into_owned().collect();
        assert!(query.contains(&("id".to_owned(), "354926".to_owned())));
        assert!(query.iter().any(|(k, _)| k == "api_sig"));
    }

    #[test]
    fn test_post_carries_form_body() {
        let config = config();
        let request = build(
            &config,
            Endpoint::TransactionPrepare,
            Parameters::from([("amount", "2.5"), ("reference_currency", "EUR")]),
        );
        let outbound = request.to_outbound().unwrap();

        assert_eq!(outbound.method, HttpMethod::Post);
        assert_eq!(outbound.url.query(), None);
        let body = outbound.body.unwrap();
        assert!(body.contains("amount=2.5"));
        assert!(body.contains("api_sig="));
    }

    #[test]
    fn test_completion_event_carries_duration() {
        let config = config();
        let request = build(&config, Endpoint::ProductDetail, Parameters::from([("id", "354926")]));
        let event = request.completion_event(Duration::from_millis(250));

        assert_eq!(event.event_type, AuditEventType::CallCompleted);
        assert_eq!(event.request_id, request.request_id());
        assert_eq!(event.details.endpoint.as_deref(), Some("product"));
        assert_eq!(event.details.account.as_deref(), Some("a@x"));
        assert_eq!(event.details.duration_ms, Some(250));
    }

    #[tokio::test]
    async fn test_execute_mapped() {
        let config = config();
        let transport =
            StubTransport::signed("secret-a", "<response code=\"0\"><name>Premium</name></response>");
        let request = build(&config, Endpoint::ProductDetail, Parameters::from([("id", "354926")]));

        let response = request.execute(&transport).await.unwrap();
        let mapped = response.into_mapped().unwrap();
        assert_eq!(mapped.root().get_string("name").unwrap(), "Premium");
        assert_eq!(mapped.response_type(), ResponseType::ProductDetail);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_plain() {
        let config = config();
        let body = "<response code=\"0\"><name>Premium</name></response>";
        let transport = StubTransport::signed("secret-a", body);
        let request = SignedRequest::with_timestamp(
            &config,
            Endpoint::ProductDetail.descriptor(),
            Parameters::new(),
            false,
            None,
            1,
        )
        .unwrap();

        let plain = request.execute(&transport).await.unwrap().into_plain().unwrap();
        assert_eq!(plain.body_str(), Some(body));
    }

    #[tokio::test]
    async fn test_bad_signature_never_decodes() {
        let config = config();
        // Signed with the other account's key.
        let transport = StubTransport::signed("secret-b", "<response code=\"6\" message=\"x\"/>");
        let request = build(&config, Endpoint::ValidateCodes, Parameters::new());

        let err = request.execute(&transport).await.unwrap_err();
        assert!(matches!(err, ApiError::FalseSignature));
    }

    #[tokio::test]
    async fn test_remote_error_surfaces() {
        let config = config();
        let transport =
            StubTransport::signed("secret-a", "<response code=\"6\" message=\"Invalid site_id\"/>");
        let request = build(&config, Endpoint::ValidateCodes, Parameters::from([("site_id", "0")]));

        let err = request.execute(&transport).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::RemoteError { code: 6, ref message } if message == "Invalid site_id"
        ));
    }

    #[tokio::test]
    async fn test_transport_error_is_propagated() {
        let config = config();
        let transport = StubTransport::new(|_| Err(ApiError::UnexpectedStatus { status: 502 }));
        let request = build(&config, Endpoint::ProductDetail, Parameters::new());

        let err = request.execute(&transport).await.unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 502 }));
    }
}
