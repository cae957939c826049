//! High-level client with one method per endpoint.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use allopass_kit::{AllopassClient, ApiConfig, Parameters};
//!
//! # async fn example() -> allopass_kit::error::Result<()> {
//! let config = Arc::new(ApiConfig::from_file("allopass.toml")?);
//! let client = AllopassClient::new(config)?;
//!
//! let product = client.product(354926, Parameters::new()).await?;
//! println!("{}", product.name()?);
//!
//! let codes = client
//!     .validate_codes(Parameters::new().with("site_id", 127042).with("code", vec!["9M7QU457"]))
//!     .await?;
//! println!("transaction {}", codes.transaction_id()?);
//! # Ok(())
//! # }
//! ```

use std::{path::Path, sync::Arc};

use tracing::instrument;

use crate::{
    config::ApiConfig,
    endpoint::Endpoint,
    error::{ApiError, Result},
    model::{
        ButtonResponse, OnetimePricingResponse, ProductDetailResponse, SubscriptionDetailResponse,
        SubscriptionLoginResponse, TransactionDetailResponse, TransactionPrepareResponse,
        ValidateCodesResponse,
    },
    protocol::{ApiResponse, MappedResponse, Parameters, SignedRequest},
    transport::{HttpTransport, Transport},
};

/// Allopass API client.
///
/// Cheap to share: the configuration sits behind an [`Arc`] and calls only
/// borrow the client. Each call builds, signs, sends, and verifies one
/// request; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct AllopassClient<T: Transport = HttpTransport> {
    config: Arc<ApiConfig>,
    transport: T,
    account: Option<String>,
}

impl AllopassClient<HttpTransport> {
    /// Creates a client over HTTP using the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: Arc<ApiConfig>) -> Result<Self> {
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Loads the configuration file and creates a client over HTTP.
    ///
    /// # Errors
    ///
    /// Every error of [`ApiConfig::from_file`] and [`new`](Self::new).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(Arc::new(ApiConfig::from_file(path)?))
    }
}

impl<T: Transport> AllopassClient<T> {
    /// Creates a client over an explicit transport.
    #[must_use]
    pub const fn with_transport(config: Arc<ApiConfig>, transport: T) -> Self {
        Self { config, transport, account: None }
    }

    /// Signs subsequent calls with the account registered under `email`.
    ///
    /// The email is checked on each call; an unknown email fails with
    /// [`ApiError::AccountNotFound`].
    #[must_use]
    pub fn with_account(mut self, email: impl Into<String>) -> Self {
        self.account = Some(email.into());
        self
    }

    /// Shared configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Selected account email, if any.
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Calls any endpoint.
    ///
    /// With `mapping` the verified body is decoded and non-zero status codes
    /// fail; without it the verified body is returned unchanged.
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidParameter`] for reserved parameter names
    /// - [`ApiError::AccountNotFound`] for an unknown selected account
    /// - [`ApiError::Transport`] / [`ApiError::UnexpectedStatus`] on transport failure
    /// - [`ApiError::FalseSignature`] if the response is not authentic
    /// - [`ApiError::WrongFormatResponse`] / [`ApiError::RemoteError`] when mapping
    #[instrument(skip(self, parameters), fields(endpoint = %endpoint, account = self.account.as_deref()))]
    pub async fn call(
        &self,
        endpoint: Endpoint,
        parameters: Parameters,
        mapping: bool,
    ) -> Result<ApiResponse> {
        let request = SignedRequest::new(
            &self.config,
            endpoint.descriptor(),
            parameters,
            mapping,
            self.account.as_deref(),
        )?;
        request.execute(&self.transport).await
    }

    async fn call_mapped<R>(&self, endpoint: Endpoint, parameters: Parameters) -> Result<R>
    where
        R: TryFrom<MappedResponse, Error = ApiError>,
    {
        self.call(endpoint, parameters, true).await?.into_mapped()?.try_into()
    }

    /// Pricing grid of a site.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn onetime_pricing(&self, parameters: Parameters) -> Result<OnetimePricingResponse> {
        self.call_mapped(Endpoint::OnetimePricing, parameters).await
    }

    /// Pricing grid of a discrete site.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn onetime_discrete_pricing(
        &self,
        parameters: Parameters,
    ) -> Result<OnetimePricingResponse> {
        self.call_mapped(Endpoint::OnetimeDiscretePricing, parameters).await
    }

    /// Validates access codes.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn validate_codes(&self, parameters: Parameters) -> Result<ValidateCodesResponse> {
        self.call_mapped(Endpoint::ValidateCodes, parameters).await
    }

    /// Creates a payment button.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn create_button(&self, parameters: Parameters) -> Result<ButtonResponse> {
        self.call_mapped(Endpoint::OnetimeButton, parameters).await
    }

    /// Creates a discrete payment button.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn create_discrete_button(&self, parameters: Parameters) -> Result<ButtonResponse> {
        self.call_mapped(Endpoint::OnetimeDiscreteButton, parameters).await
    }

    /// Looks up a product. `id` takes precedence over an `id` in `parameters`.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn product(&self, id: i64, parameters: Parameters) -> Result<ProductDetailResponse> {
        self.call_mapped(Endpoint::ProductDetail, parameters.with("id", id)).await
    }

    /// Prepares a transaction (sent as POST).
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn prepare_transaction(
        &self,
        parameters: Parameters,
    ) -> Result<TransactionPrepareResponse> {
        self.call_mapped(Endpoint::TransactionPrepare, parameters).await
    }

    /// Looks up a transaction by its id.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn transaction(
        &self,
        id: &str,
        parameters: Parameters,
    ) -> Result<TransactionDetailResponse> {
        self.call_mapped(Endpoint::TransactionDetail, parameters.with("id", id)).await
    }

    /// Looks up a transaction by the merchant's own transaction id.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn transaction_by_merchant_id(
        &self,
        merchant_transaction_id: &str,
        parameters: Parameters,
    ) -> Result<TransactionDetailResponse> {
        self.call_mapped(Endpoint::TransactionMerchant, parameters.with("id", merchant_transaction_id))
            .await
    }

    /// Logs a subscriber in.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn login_subscription(
        &self,
        parameters: Parameters,
    ) -> Result<SubscriptionLoginResponse> {
        self.call_mapped(Endpoint::SubscriptionLogin, parameters).await
    }

    /// Looks up a subscription by subscriber reference.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn subscription(
        &self,
        subscriber_reference: &str,
        parameters: Parameters,
    ) -> Result<SubscriptionDetailResponse> {
        self.call_mapped(
            Endpoint::SubscriptionDetail,
            parameters.with("subscriber_reference", subscriber_reference),
        )
        .await
    }
}
