//! Typed views over mapped responses, one per decoder.
//!
//! Every type wraps a [`MappedResponse`] whose status code is already known
//! to be zero. Conversion checks the decoder type, so a product detail
//! document cannot be read as a transaction.

use crate::{
    document::Element,
    endpoint::ResponseType,
    error::{ApiError, Result},
    model::entities::{Code, Date, Market, Partner, Price, Pricepoint, Region, Website},
    protocol::MappedResponse,
};

macro_rules! typed_response {
    ($(#[$meta:meta])* $name:ident => $response_type:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            inner: MappedResponse,
        }

        impl $name {
            /// Underlying mapped response.
            #[must_use]
            pub const fn mapped(&self) -> &MappedResponse {
                &self.inner
            }

            /// Root element of the document.
            #[must_use]
            pub const fn root(&self) -> &Element {
                self.inner.root()
            }

            /// Unwraps the mapped response.
            #[must_use]
            pub fn into_inner(self) -> MappedResponse {
                self.inner
            }
        }

        impl TryFrom<MappedResponse> for $name {
            type Error = ApiError;

            fn try_from(inner: MappedResponse) -> Result<Self> {
                if inner.response_type() == ResponseType::$response_type {
                    Ok(Self { inner })
                } else {
                    Err(ApiError::InvalidParameter(format!(
                        "expected a {:?} response, got {:?}",
                        ResponseType::$response_type,
                        inner.response_type()
                    )))
                }
            }
        }
    };
}

fn children_of<'a, T>(root: &'a Element, path: &str, view: fn(&'a Element) -> T) -> Vec<T> {
    root.find(path).map(|node| node.children().iter().map(view).collect()).unwrap_or_default()
}

typed_response! {
    /// Pricing grid of a site, regular or discrete.
    OnetimePricingResponse => OnetimePricing
}

impl OnetimePricingResponse {
    /// Document creation date.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn creation_date(&self) -> Result<Date<'_>> {
        self.root().get_element("creation_date").map(Date::new)
    }

    /// Site the grid belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn website(&self) -> Result<Website<'_>> {
        self.root().get_element("website").map(Website::new)
    }

    /// Regions listed under `countries`.
    #[must_use]
    pub fn regions(&self) -> Vec<Region<'_>> {
        children_of(self.root(), "countries", Region::new)
    }

    /// Per-country markets.
    #[must_use]
    pub fn markets(&self) -> Vec<Market<'_>> {
        children_of(self.root(), "markets", Market::new)
    }
}

typed_response! {
    /// Outcome of an access code validation.
    ValidateCodesResponse => ValidateCodes
}

impl ValidateCodesResponse {
    /// Validation status (0 success).
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not an integer.
    pub fn status(&self) -> Result<i64> {
        self.root().get_int("status")
    }

    /// Human readable status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn status_description(&self) -> Result<&str> {
        self.root().get_string("status_description")
    }

    /// Access type of the product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn access_type(&self) -> Result<&str> {
        self.root().get_string("access_type")
    }

    /// Transaction id assigned to the validation.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn transaction_id(&self) -> Result<&str> {
        self.root().get_string("transaction_id")
    }

    /// Customer price.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn price(&self) -> Result<Price<'_>> {
        self.root().get_element("price").map(Price::new)
    }

    /// Amount actually paid.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn paid(&self) -> Result<Price<'_>> {
        self.root().get_element("paid").map(Price::new)
    }

    /// Validation date.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn validation_date(&self) -> Result<Date<'_>> {
        self.root().get_element("validation_date").map(Date::new)
    }

    /// Product name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn product_name(&self) -> Result<&str> {
        self.root().get_string("product_name")
    }

    /// Site the codes were bought for.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn website(&self) -> Result<Website<'_>> {
        self.root().get_element("website").map(Website::new)
    }

    /// Validated codes.
    #[must_use]
    pub fn codes(&self) -> Vec<Code<'_>> {
        children_of(self.root(), "codes", Code::new)
    }

    /// Merchant-side transaction reference.
    #[must_use]
    pub fn merchant_transaction_id(&self) -> Option<&str> {
        self.root().opt_string("merchant_transaction_id")
    }

    /// Opaque merchant data echoed back.
    #[must_use]
    pub fn client_data(&self) -> Option<&str> {
        self.root().opt_string("client_data")
    }

    /// Revenue-sharing partners.
    #[must_use]
    pub fn partners(&self) -> Vec<Partner<'_>> {
        children_of(self.root(), "partners", Partner::new)
    }
}

typed_response! {
    /// Created payment button, regular or discrete.
    ButtonResponse => Button
}

impl ButtonResponse {
    /// Access type of the button.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn access_type(&self) -> Result<&str> {
        self.root().get_string("access_type")
    }

    /// Button id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn button_id(&self) -> Result<&str> {
        self.root().get_string("button_id")
    }

    /// Creation date.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn creation_date(&self) -> Result<Date<'_>> {
        self.root().get_element("creation_date").map(Date::new)
    }

    /// Site the button belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn website(&self) -> Result<Website<'_>> {
        self.root().get_element("website").map(Website::new)
    }

    /// Purchase URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn buy_url(&self) -> Result<&str> {
        self.root().get_string("buy_url")
    }

    /// HTML snippet of the checkout button.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn checkout_button(&self) -> Result<&str> {
        self.root().get_string("checkout_button")
    }
}

typed_response! {
    /// Product description.
    ProductDetailResponse => ProductDetail
}

impl ProductDetailResponse {
    /// Product id.
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not an integer.
    pub fn id(&self) -> Result<i64> {
        self.root().get_int("id")
    }

    /// Product key.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn key(&self) -> Result<&str> {
        self.root().get_string("key")
    }

    /// Access type.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn access_type(&self) -> Result<&str> {
        self.root().get_string("access_type")
    }

    /// Creation date.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn creation_date(&self) -> Result<Date<'_>> {
        self.root().get_element("creation_date").map(Date::new)
    }

    /// Product name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn name(&self) -> Result<&str> {
        self.root().get_string("name")
    }

    /// Site the product belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn website(&self) -> Result<Website<'_>> {
        self.root().get_element("website").map(Website::new)
    }

    /// Number of codes required to unlock the product.
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not an integer.
    pub fn expected_number_of_codes(&self) -> Result<i64> {
        self.root().get_int("expected_number_of_codes")
    }

    /// Purchase URL.
    #[must_use]
    pub fn purchase_url(&self) -> Option<&str> {
        self.root().opt_string("purchase_url")
    }

    /// Redirect after a successful purchase.
    #[must_use]
    pub fn forward_url(&self) -> Option<&str> {
        self.root().opt_string("forward_url")
    }

    /// Redirect after a failed purchase.
    #[must_use]
    pub fn error_url(&self) -> Option<&str> {
        self.root().opt_string("error_url")
    }

    /// Server-to-server notification URL.
    #[must_use]
    pub fn notification_url(&self) -> Option<&str> {
        self.root().opt_string("notification_url")
    }
}

typed_response! {
    /// Prepared transaction.
    TransactionPrepareResponse => TransactionPrepare
}

impl TransactionPrepareResponse {
    /// Access type.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn access_type(&self) -> Result<&str> {
        self.root().get_string("access_type")
    }

    /// Transaction id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn transaction_id(&self) -> Result<&str> {
        self.root().get_string("transaction_id")
    }

    /// Creation date.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn creation_date(&self) -> Result<Date<'_>> {
        self.root().get_element("creation_date").map(Date::new)
    }

    /// Customer price.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn price(&self) -> Result<Price<'_>> {
        self.root().get_element("price").map(Price::new)
    }

    /// Selected pricepoint.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn pricepoint(&self) -> Result<Pricepoint<'_>> {
        self.root().get_element("pricepoint").map(Pricepoint::new)
    }

    /// Site of the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn website(&self) -> Result<Website<'_>> {
        self.root().get_element("website").map(Website::new)
    }

    /// URL the customer is sent to for payment.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn buy_url(&self) -> Result<&str> {
        self.root().get_string("buy_url")
    }

    /// HTML snippet of the checkout button.
    #[must_use]
    pub fn checkout_button(&self) -> Option<&str> {
        self.root().opt_string("checkout_button")
    }
}

typed_response! {
    /// Transaction state, looked up by transaction or merchant id.
    TransactionDetailResponse => TransactionDetail
}

impl TransactionDetailResponse {
    /// Transaction status (0 success).
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not an integer.
    pub fn status(&self) -> Result<i64> {
        self.root().get_int("status")
    }

    /// Human readable status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn status_description(&self) -> Result<&str> {
        self.root().get_string("status_description")
    }

    /// Access type.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn access_type(&self) -> Result<&str> {
        self.root().get_string("access_type")
    }

    /// Transaction id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn transaction_id(&self) -> Result<&str> {
        self.root().get_string("transaction_id")
    }

    /// Customer price.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn price(&self) -> Result<Price<'_>> {
        self.root().get_element("price").map(Price::new)
    }

    /// Amount actually paid.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn paid(&self) -> Result<Price<'_>> {
        self.root().get_element("paid").map(Price::new)
    }

    /// Creation date.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn creation_date(&self) -> Result<Date<'_>> {
        self.root().get_element("creation_date").map(Date::new)
    }

    /// Completion date, once the transaction ended.
    #[must_use]
    pub fn end_date(&self) -> Option<Date<'_>> {
        self.root().find("end_date").map(Date::new)
    }

    /// Product name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn product_name(&self) -> Result<&str> {
        self.root().get_string("product_name")
    }

    /// Customer IP address.
    #[must_use]
    pub fn customer_ip(&self) -> Option<&str> {
        self.root().opt_string("customer_ip")
    }

    /// Customer country code.
    #[must_use]
    pub fn customer_country(&self) -> Option<&str> {
        self.root().opt_string("customer_country")
    }

    /// Number of codes expected.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidField`] if present but not an integer.
    pub fn expected_number_of_codes(&self) -> Result<Option<i64>> {
        self.root().opt_int("expected_number_of_codes")
    }

    /// Codes used for the transaction.
    #[must_use]
    pub fn codes(&self) -> Vec<Code<'_>> {
        children_of(self.root(), "codes", Code::new)
    }

    /// Merchant-side transaction reference.
    #[must_use]
    pub fn merchant_transaction_id(&self) -> Option<&str> {
        self.root().opt_string("merchant_transaction_id")
    }

    /// Opaque merchant data echoed back.
    #[must_use]
    pub fn client_data(&self) -> Option<&str> {
        self.root().opt_string("client_data")
    }

    /// Site of the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn website(&self) -> Result<Website<'_>> {
        self.root().get_element("website").map(Website::new)
    }

    /// Revenue-sharing partners.
    #[must_use]
    pub fn partners(&self) -> Vec<Partner<'_>> {
        children_of(self.root(), "partners", Partner::new)
    }
}

/// Outcome of a subscriber login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    /// Credentials accepted.
    Success,
    /// Credentials rejected.
    Failed,
    /// Status not known to this client.
    Other(i64),
}

impl LoginStatus {
    /// Maps a raw status code.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::Failed,
            other => Self::Other(other),
        }
    }
}

typed_response! {
    /// Subscriber login outcome.
    SubscriptionLoginResponse => SubscriptionLogin
}

impl SubscriptionLoginResponse {
    /// Raw login status code.
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not an integer.
    pub fn status(&self) -> Result<i64> {
        self.root().get_int("status")
    }

    /// Login status.
    ///
    /// # Errors
    ///
    /// Same as [`status`](Self::status).
    pub fn login_status(&self) -> Result<LoginStatus> {
        self.status().map(LoginStatus::from_code)
    }

    /// Human readable status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn status_description(&self) -> Result<&str> {
        self.root().get_string("status_description")
    }
}

typed_response! {
    /// Subscription state.
    SubscriptionDetailResponse => SubscriptionDetail
}

impl SubscriptionDetailResponse {
    /// Subscriber reference.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn subscriber_reference(&self) -> Result<&str> {
        self.root().get_string("subscriber_reference")
    }

    /// Subscription status (0 active).
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not an integer.
    pub fn status(&self) -> Result<i64> {
        self.root().get_int("status")
    }

    /// Human readable status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn status_description(&self) -> Result<&str> {
        self.root().get_string("status_description")
    }

    /// Access type.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn access_type(&self) -> Result<&str> {
        self.root().get_string("access_type")
    }

    /// Subscription start.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn creation_date(&self) -> Result<Date<'_>> {
        self.root().get_element("creation_date").map(Date::new)
    }

    /// Next renewal, while active.
    #[must_use]
    pub fn next_renewal_date(&self) -> Option<Date<'_>> {
        self.root().find("next_renewal_date").map(Date::new)
    }

    /// End date, once terminated.
    #[must_use]
    pub fn end_date(&self) -> Option<Date<'_>> {
        self.root().find("end_date").map(Date::new)
    }

    /// Renewal price.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn price(&self) -> Result<Price<'_>> {
        self.root().get_element("price").map(Price::new)
    }

    /// Site of the subscription.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn website(&self) -> Result<Website<'_>> {
        self.root().get_element("website").map(Website::new)
    }
}
