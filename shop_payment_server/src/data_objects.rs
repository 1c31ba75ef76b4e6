use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_payment_engine::db_types::{NewProduct, Order, OrderId, OrderStatusType, ProductId};
use spg_common::Twd;

/// Query string for `POST /orders`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreateOrderParams {
    pub product_id: ProductId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProductRequest {
    pub name: String,
    pub price: Twd,
    pub stock: i64,
}

impl From<NewProductRequest> for NewProduct {
    fn from(req: NewProductRequest) -> Self {
        NewProduct::new(req.name, req.price, req.stock)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusResponse {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderStatusResponse {
    fn from(order: Order) -> Self {
        Self { order_id: order.id, status: order.status, updated_at: order.updated_at }
    }
}
