use serde::{Deserialize, Serialize};
use spg_common::Twd;

use crate::db_types::{Order, OrderId};

/// Events that flow from the webhook handler to the settlement worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    /// The gateway has confirmed payment for the order, and the order has just moved to `paid`.
    PaymentSuccess { order_id: OrderId },
}

impl DomainEvent {
    pub fn payment_success(order_id: OrderId) -> Self {
        Self::PaymentSuccess { order_id }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            Self::PaymentSuccess { order_id } => *order_id,
        }
    }
}

/// Emitted once stock has been taken for a paid order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettledEvent {
    pub order_id: OrderId,
    pub amount: Twd,
}

impl OrderSettledEvent {
    pub fn new(order: &Order) -> Self {
        Self { order_id: order.id, amount: order.amount }
    }
}
