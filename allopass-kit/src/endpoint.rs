//! Endpoint catalog.
//!
//! Every remote operation is described by one [`EndpointDescriptor`]: its path
//! relative to the configured prefix, its HTTP method, and the typed response
//! its mapped body decodes to. The table is static; requests are built by a
//! single generic engine parameterized by a descriptor.

use std::{fmt, str::FromStr};

use crate::error::ApiError;

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Parameters travel in the query string.
    Get,
    /// Parameters travel in a form-encoded body.
    Post,
}

impl HttpMethod {
    /// Method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoder applied to a mapped response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseType {
    /// Pricing grid of a site (regular or discrete).
    OnetimePricing,
    /// Outcome of an access code validation.
    ValidateCodes,
    /// Created payment button.
    Button,
    /// Product description.
    ProductDetail,
    /// Prepared transaction.
    TransactionPrepare,
    /// Transaction state.
    TransactionDetail,
    /// Subscriber login outcome.
    SubscriptionLogin,
    /// Subscription state.
    SubscriptionDetail,
}

/// How a response body is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// Raw verified body.
    Plain,
    /// Decoded document of the given type.
    Mapped(ResponseType),
}

/// Immutable per-operation metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointDescriptor {
    /// Path relative to the configured prefix, without leading slash.
    pub path: &'static str,
    /// HTTP method.
    pub method: HttpMethod,
    /// Decoder used when the caller asks for a mapped response.
    pub response_type: ResponseType,
}

impl EndpointDescriptor {
    /// Response kind for a call made with the given `mapping` flag.
    #[must_use]
    pub const fn response_kind(&self, mapping: bool) -> ResponseKind {
        if mapping { ResponseKind::Mapped(self.response_type) } else { ResponseKind::Plain }
    }
}

/// Remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Pricing grid for a site.
    OnetimePricing,
    /// Pricing grid for a discrete site.
    OnetimeDiscretePricing,
    /// Access code validation.
    ValidateCodes,
    /// Button creation.
    OnetimeButton,
    /// Discrete button creation.
    OnetimeDiscreteButton,
    /// Product lookup.
    ProductDetail,
    /// Transaction preparation.
    TransactionPrepare,
    /// Transaction lookup by transaction id.
    TransactionDetail,
    /// Transaction lookup by merchant transaction id.
    TransactionMerchant,
    /// Subscriber login.
    SubscriptionLogin,
    /// Subscription lookup.
    SubscriptionDetail,
}

impl Endpoint {
    /// Every endpoint, in catalog order.
    pub const ALL: [Self; 11] = [
        Self::OnetimePricing,
        Self::OnetimeDiscretePricing,
        Self::ValidateCodes,
        Self::OnetimeButton,
        Self::OnetimeDiscreteButton,
        Self::ProductDetail,
        Self::TransactionPrepare,
        Self::TransactionDetail,
        Self::TransactionMerchant,
        Self::SubscriptionLogin,
        Self::SubscriptionDetail,
    ];

    /// Static descriptor of this endpoint.
    #[must_use]
    pub const fn descriptor(self) -> EndpointDescriptor {
        use HttpMethod::{Get, Post};
        use ResponseType as R;

        let (path, method, response_type) = match self {
            Self::OnetimePricing => ("onetime/pricing", Get, R::OnetimePricing),
            Self::OnetimeDiscretePricing => ("onetime/discrete-pricing", Get, R::OnetimePricing),
            Self::ValidateCodes => ("onetime/validate-codes", Get, R::ValidateCodes),
            Self::OnetimeButton => ("onetime/button", Get, R::Button),
            Self::OnetimeDiscreteButton => ("onetime/discrete-button", Get, R::Button),
            Self::ProductDetail => ("product", Get, R::ProductDetail),
            Self::TransactionPrepare => ("transaction/prepare", Post, R::TransactionPrepare),
            Self::TransactionDetail => ("transaction", Get, R::TransactionDetail),
            Self::TransactionMerchant => ("transaction/merchant", Get, R::TransactionDetail),
            Self::SubscriptionLogin => ("subscription/login", Get, R::SubscriptionLogin),
            Self::SubscriptionDetail => ("subscription", Get, R::SubscriptionDetail),
        };
        EndpointDescriptor { path, method, response_type }
    }

    /// Kebab-case name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OnetimePricing => "onetime-pricing",
            Self::OnetimeDiscretePricing => "onetime-discrete-pricing",
            Self::ValidateCodes => "validate-codes",
            Self::OnetimeButton => "onetime-button",
            Self::OnetimeDiscreteButton => "onetime-discrete-button",
            Self::ProductDetail => "product-detail",
            Self::TransactionPrepare => "transaction-prepare",
            Self::TransactionDetail => "transaction-detail",
            Self::TransactionMerchant => "transaction-merchant",
            Self::SubscriptionLogin => "subscription-login",
            Self::SubscriptionDetail => "subscription-detail",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|endpoint| endpoint.name() == wanted)
            .ok_or_else(|| ApiError::InvalidParameter(format!("unknown endpoint '{s}'")))
    }
}
