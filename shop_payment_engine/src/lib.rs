//! Shop Payment Engine
//!
//! The shop payment engine sells a finite inventory through the ECPay hosted checkout, and reconciles the gateway's
//! asynchronous payment notifications with local order and stock state.
//!
//! The library is divided into these sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to access
//!    the database directly. Instead, use the public API provided by the engine. The exception is the data types used
//!    in the database. These are defined in the `db_types` module and are public.
//! 2. The gateway integration ([`mod@gateway`]): the `CheckMacValue` codec, the signed checkout request builder, and
//!    a typed view of payment notifications.
//! 3. The engine public API (`spe_api`). [`CatalogApi`] manages products, [`OrderFlowApi`] runs the order state machine
//!    and [`SettlementApi`] takes stock for paid orders.
//!
//! Payment and stock are decoupled by [`mod@events`]. A verified payment publishes a `PAYMENT_SUCCESS` event, and the
//! settlement side consumes it, takes exactly one unit of stock per order, and fires the order-settled hooks (e.g. to
//! email the buyer).
mod db;

pub mod db_types;
pub mod events;
pub mod gateway;
mod spe_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{
    MarkPaidResult,
    NewOrderResult,
    OrderManagement,
    PaymentGatewayDatabase,
    ProductManagement,
    SettleOrderResult,
    SettlementManagement,
    StockDecrement,
};
pub use spe_api::{
    catalog_api::CatalogApi,
    errors::{CatalogApiError, OrderFlowError, SettlementError},
    order_flow_api::OrderFlowApi,
    order_objects,
    settlement_api::SettlementApi,
};
