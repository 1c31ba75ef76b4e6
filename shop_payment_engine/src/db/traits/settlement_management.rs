use crate::{
    db::traits::SettleOrderResult,
    db_types::{Order, Settlement},
};

/// The `SettlementManagement` trait records how paid orders were settled against inventory.
#[allow(async_fn_in_trait)]
pub trait SettlementManagement {
    type Error: std::error::Error;

    /// In a single atomic transaction,
    /// * claims the settlement record for the order. If the order has been settled before, nothing further is done and
    ///   [`SettleOrderResult::AlreadySettled`] is returned.
    /// * decrements the stock of the order's product, as per `ProductManagement::decrement_stock`.
    /// * records the outcome, so that oversold orders can be followed up.
    async fn settle_order(&self, order: &Order) -> Result<SettleOrderResult, Self::Error>;

    /// Fetches the settlements where the payment succeeded but no stock was left, oldest first.
    async fn fetch_oversold_settlements(&self) -> Result<Vec<Settlement>, Self::Error>;
}
