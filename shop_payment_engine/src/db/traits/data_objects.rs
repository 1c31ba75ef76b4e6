use crate::db_types::{Order, Product};

/// The result of trying to place an order for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewOrderResult {
    /// The order was created in `pending` status. The product is returned as it was at the time of the order.
    Created { order: Order, product: Product },
    /// The product exists but has no stock left.
    OutOfStock(Product),
    ProductNotFound,
}

/// The result of the `pending → paid` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkPaidResult {
    /// The order was pending and is now paid. This is the only outcome that may trigger settlement.
    Paid(Order),
    /// The order was already paid. Nothing was changed.
    AlreadyPaid(Order),
    NotFound,
}

/// The result of the authoritative check-and-decrement of a product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    Decremented { remaining: i64 },
    OutOfStock,
}

/// The result of settling a paid order against inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOrderResult {
    Decremented { remaining: i64 },
    /// The payment went through, but the stock ran out between the order and the settlement.
    OutOfStock,
    /// The order has been settled before. Nothing was changed.
    AlreadySettled,
}
