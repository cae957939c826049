//! Typed responses and entity views.
//!
//! Entity views ([`Price`], [`Pricepoint`], [`Market`], [`Partner`], [`Code`],
//! [`Website`], [`Date`], [`Country`], [`Region`]) borrow nodes of a decoded
//! document and read fields on demand. Typed responses wrap a
//! [`MappedResponse`](crate::protocol::MappedResponse) for one decoder each.

pub mod entities;
pub mod responses;

pub use entities::{Code, Country, Date, Market, Partner, Price, Pricepoint, Region, Website};
pub use responses::{
    ButtonResponse, LoginStatus, OnetimePricingResponse, ProductDetailResponse,
    SubscriptionDetailResponse, SubscriptionLoginResponse, TransactionDetailResponse,
    TransactionPrepareResponse, ValidateCodesResponse,
};
