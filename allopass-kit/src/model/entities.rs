//! Borrowed views over recurring document nodes.
//!
//! Each view is a `Copy` wrapper around an [`Element`]; reads are done on
//! demand and fail with [`ApiError::MissingField`] or
//! [`ApiError::InvalidField`].

use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    document::Element,
    error::{ApiError, Result},
};

/// Amount in a currency.
///
/// Read from the attributes of `price`, `paid` and `payout` nodes.
#[derive(Debug, Clone, Copy)]
pub struct Price<'a> {
    node: &'a Element,
}

impl<'a> Price<'a> {
    /// Wraps a price node.
    #[must_use]
    pub const fn new(node: &'a Element) -> Self {
        Self { node }
    }

    /// Underlying node.
    #[must_use]
    pub const fn element(&self) -> &'a Element {
        self.node
    }

    /// ISO currency code.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn currency(&self) -> Result<&'a str> {
        self.node.get_string("@currency")
    }

    /// Amount in [`currency`](Self::currency).
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not a number.
    pub fn amount(&self) -> Result<f64> {
        self.node.get_float("@amount")
    }

    /// Exchange rate to the reference currency.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidField`] if present but not a number.
    pub fn exchange(&self) -> Result<Option<f64>> {
        self.node.opt_float("@exchange")
    }

    /// Reference currency code.
    #[must_use]
    pub fn reference_currency(&self) -> Option<&'a str> {
        self.node.attribute("reference_currency")
    }

    /// Amount in the reference currency.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidField`] if present but not a number.
    pub fn reference_amount(&self) -> Result<Option<f64>> {
        self.node.opt_float("@reference_amount")
    }
}

/// Purchasable price level.
#[derive(Debug, Clone, Copy)]
pub struct Pricepoint<'a> {
    node: &'a Element,
}

impl<'a> Pricepoint<'a> {
    /// Wraps a pricepoint node.
    #[must_use]
    pub const fn new(node: &'a Element) -> Self {
        Self { node }
    }

    /// Pricepoint id.
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not an integer.
    pub fn id(&self) -> Result<i64> {
        self.node.get_int("@id")
    }

    /// Payment method family (`premium-sms`, `premium-calling`, `credit-card`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn kind(&self) -> Result<&'a str> {
        self.node.get_string("@type")
    }

    /// Country code the pricepoint applies to.
    #[must_use]
    pub fn country_code(&self) -> Option<&'a str> {
        self.node.attribute("country_code")
    }

    /// Customer price.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if the node has no `price` child.
    pub fn price(&self) -> Result<Price<'a>> {
        self.node.get_element("price").map(Price::new)
    }

    /// Merchant payout, if disclosed.
    #[must_use]
    pub fn payout(&self) -> Option<Price<'a>> {
        self.node.find("payout").map(Price::new)
    }

    /// Free-form description.
    #[must_use]
    pub fn description(&self) -> Option<&'a str> {
        self.node.opt_string("description")
    }

    /// Purchase URL.
    #[must_use]
    pub fn buy_url(&self) -> Option<&'a str> {
        self.node.opt_string("buy_url")
    }
}

/// Country market with its pricepoints.
#[derive(Debug, Clone, Copy)]
pub struct Market<'a> {
    node: &'a Element,
}

impl<'a> Market<'a> {
    /// Wraps a market node.
    #[must_use]
    pub const fn new(node: &'a Element) -> Self {
        Self { node }
    }

    /// ISO country code.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn country_code(&self) -> Result<&'a str> {
        self.node.get_string("@country_code")
    }

    /// Country name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn country(&self) -> Result<&'a str> {
        self.node.get_string("@country")
    }

    /// Every child of the market, read as a pricepoint.
    #[must_use]
    pub fn pricepoints(&self) -> Vec<Pricepoint<'a>> {
        self.node.children().iter().map(Pricepoint::new).collect()
    }
}

/// Revenue-sharing partner.
#[derive(Debug, Clone, Copy)]
pub struct Partner<'a> {
    node: &'a Element,
}

impl<'a> Partner<'a> {
    /// Wraps a partner node.
    #[must_use]
    pub const fn new(node: &'a Element) -> Self {
        Self { node }
    }

    /// Partner id.
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not an integer.
    pub fn id(&self) -> Result<i64> {
        self.node.get_int("@id")
    }

    /// Revenue share.
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not a number.
    pub fn share(&self) -> Result<f64> {
        self.node.get_float("@share")
    }

    /// Mapping id.
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not an integer.
    pub fn map(&self) -> Result<i64> {
        self.node.get_int("@map")
    }
}

/// Validated access code.
#[derive(Debug, Clone, Copy)]
pub struct Code<'a> {
    node: &'a Element,
}

impl<'a> Code<'a> {
    /// Wraps a code node.
    #[must_use]
    pub const fn new(node: &'a Element) -> Self {
        Self { node }
    }

    /// Code value as typed by the customer.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn value(&self) -> Result<&'a str> {
        self.node.get_string("value")
    }

    /// Pricepoint the code was bought at.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn pricepoint(&self) -> Result<Pricepoint<'a>> {
        self.node.get_element("pricepoint").map(Pricepoint::new)
    }

    /// Customer price.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn price(&self) -> Result<Price<'a>> {
        self.node.get_element("price").map(Price::new)
    }

    /// Amount actually paid.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn paid(&self) -> Result<Price<'a>> {
        self.node.get_element("paid").map(Price::new)
    }

    /// Merchant payout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn payout(&self) -> Result<Price<'a>> {
        self.node.get_element("payout").map(Price::new)
    }
}

/// Merchant website.
#[derive(Debug, Clone, Copy)]
pub struct Website<'a> {
    node: &'a Element,
}

impl<'a> Website<'a> {
    /// Wraps a website node.
    #[must_use]
    pub const fn new(node: &'a Element) -> Self {
        Self { node }
    }

    /// Website id.
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not an integer.
    pub fn id(&self) -> Result<i64> {
        self.node.get_int("@id")
    }

    /// Display name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn name(&self) -> Result<&'a str> {
        self.node.get_string("@name")
    }

    /// Home page URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn url(&self) -> Result<&'a str> {
        self.node.get_string("@url")
    }

    /// Whether the content is restricted to adults.
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not a boolean.
    pub fn audience_restricted(&self) -> Result<bool> {
        self.node.get_bool("@audience_restricted")
    }

    /// Content category.
    #[must_use]
    pub fn category(&self) -> Option<&'a str> {
        self.node.attribute("category")
    }
}

/// Point in time, sent both as a unix timestamp and an RFC 3339 string.
#[derive(Debug, Clone, Copy)]
pub struct Date<'a> {
    node: &'a Element,
}

impl<'a> Date<'a> {
    /// Wraps a date node.
    #[must_use]
    pub const fn new(node: &'a Element) -> Self {
        Self { node }
    }

    /// Unix timestamp in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if absent or not an integer.
    pub fn timestamp(&self) -> Result<i64> {
        self.node.get_int("@timestamp")
    }

    /// Date string as sent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn date(&self) -> Result<&'a str> {
        self.node.get_string("@date")
    }

    /// Date string parsed with its offset.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidField`] if it is not RFC 3339.
    pub fn date_time(&self) -> Result<DateTime<FixedOffset>> {
        let raw = self.date()?;
        DateTime::parse_from_rfc3339(raw.trim()).map_err(|_| ApiError::InvalidField {
            path: format!("{}/@date", self.node.name()),
            value: raw.to_owned(),
        })
    }

    /// Timestamp as a UTC instant.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidField`] if the timestamp is out of range.
    pub fn utc(&self) -> Result<DateTime<Utc>> {
        let timestamp = self.timestamp()?;
        DateTime::from_timestamp(timestamp, 0).ok_or_else(|| ApiError::InvalidField {
            path: format!("{}/@timestamp", self.node.name()),
            value: timestamp.to_string(),
        })
    }
}

/// Country entry of a pricing grid.
#[derive(Debug, Clone, Copy)]
pub struct Country<'a> {
    node: &'a Element,
}

impl<'a> Country<'a> {
    /// Wraps a country node.
    #[must_use]
    pub const fn new(node: &'a Element) -> Self {
        Self { node }
    }

    /// ISO country code.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn code(&self) -> Result<&'a str> {
        self.node.get_string("@code")
    }

    /// Country name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn name(&self) -> Result<&'a str> {
        self.node.get_string("@name")
    }
}

/// Group of countries.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    node: &'a Element,
}

impl<'a> Region<'a> {
    /// Wraps a region node.
    #[must_use]
    pub const fn new(node: &'a Element) -> Self {
        Self { node }
    }

    /// Region name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingField`] if absent.
    pub fn name(&self) -> Result<&'a str> {
        self.node.get_string("@name")
    }

    /// Countries of the region.
    #[must_use]
    pub fn countries(&self) -> Vec<Country<'a>> {
        self.node.children_named("country").map(Country::new).collect()
    }
}
