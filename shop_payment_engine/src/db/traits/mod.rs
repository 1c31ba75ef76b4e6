//! #  Storage contracts
//!
//! This module defines the interface contracts that a database *backend* must fulfil to be used by the shop payment
//! engine. The backend is the single source of truth for products, orders and settlements. Every mutation is a
//! single atomic operation in the backend; callers never read-modify-write entities themselves.
//!
//! * [`ProductManagement`] creates and reads products, and owns the one authoritative stock decrement.
//! * [`OrderManagement`] creates orders against a product and drives the `pending → paid` transition.
//! * [`SettlementManagement`] records settlement of paid orders against inventory, exactly once per order.
//! * [`PaymentGatewayDatabase`] ties the three together, and is what the engine APIs are generally built on.
mod data_objects;
mod order_management;
mod product_management;
mod settlement_management;

pub use data_objects::{MarkPaidResult, NewOrderResult, SettleOrderResult, StockDecrement};
pub use order_management::OrderManagement;
pub use product_management::ProductManagement;
pub use settlement_management::SettlementManagement;

/// The full set of behaviour a backend needs to support the shop payment engine.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + ProductManagement + OrderManagement + SettlementManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), <Self as OrderManagement>::Error> {
        Ok(())
    }
}
