use crate::{
    db::traits::{MarkPaidResult, NewOrderResult},
    db_types::{Order, OrderId, ProductId},
};

/// The `OrderManagement` trait defines the behaviour for placing orders and driving their status.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    type Error: std::error::Error;

    /// Creates a `pending` order for one unit of the given product, snapshotting the product's current price as the
    /// order amount.
    ///
    /// The stock check here is advisory. It stops orders that are obviously doomed, but stock is only
    /// decremented when the order is settled.
    async fn insert_order_for_product(&self, product_id: ProductId) -> Result<NewOrderResult, Self::Error>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, Self::Error>;

    /// Transitions the order from `pending` to `paid` as a compare-and-set. An order that is already paid is left
    /// untouched and [`MarkPaidResult::AlreadyPaid`] is returned.
    async fn mark_order_paid(&self, id: OrderId) -> Result<MarkPaidResult, Self::Error>;
}
