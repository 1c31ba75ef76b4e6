//! # ECPay gateway integration
//!
//! Everything needed to talk to the ECPay all-in-one checkout:
//! * [`CheckMacCodec`] signs outbound parameter sets and verifies inbound callbacks.
//! * [`PaymentRequestBuilder`] builds the signed form that redirects a buyer to the gateway's checkout page.
//! * [`PaymentCallback`] is a typed view over the fields of a payment notification that the engine acts on.
//!
//! The gateway is only trusted as far as the checksum goes. Nothing in a callback is acted upon before
//! [`CheckMacCodec::verify`] has passed.
mod callback;
mod checksum;
mod config;
mod params;
mod request_builder;

pub use callback::PaymentCallback;
pub use checksum::{CheckMacCodec, CHECK_MAC_FIELD};
pub use config::{EcpayConfig, DEFAULT_CHECKOUT_URL, DEFAULT_TRADE_DESC};
pub use params::GatewayParams;
pub use request_builder::{PaymentRequestBuilder, MAX_TRADE_NO_LENGTH};

/// The body the gateway expects when a notification has been accepted.
pub const ACK_OK: &str = "1|OK";
/// The body returned when a notification fails checksum verification.
pub const ACK_CHECKSUM_ERROR: &str = "0|CheckMacValue Error";
