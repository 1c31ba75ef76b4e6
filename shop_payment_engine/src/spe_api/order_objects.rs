use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderId, Product},
    gateway::{GatewayParams, ACK_CHECKSUM_ERROR, ACK_OK},
};

/// A freshly placed order, along with the signed parameters that send the buyer to the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub order: Order,
    pub product: Product,
    pub params: GatewayParams,
}

/// What a payment notification did to the order state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The checksum did not verify. Nothing in the notification was looked at.
    SignatureInvalid,
    /// A payment simulated from the merchant back office. Acknowledged, but never acted on.
    Simulated,
    /// The gateway reports that the payment failed.
    PaymentNotSuccessful { rtn_code: String },
    /// The notification does not name an order we know of.
    UnknownOrder,
    /// A repeat notification for an order that is already paid. Nothing was changed.
    AlreadyPaid(Order),
    /// The order moved from `pending` to `paid`, and settlement has been requested.
    Paid(Order),
    /// A verified payment that could not be recorded. It is still acknowledged, and must be reconciled by hand.
    ReconciliationRequired { order_id: OrderId, reason: String },
}

impl NotificationOutcome {
    /// The body to return to the gateway. Only a checksum failure is reported back; every other outcome is
    /// acknowledged so that the gateway stops retrying.
    pub fn gateway_response(&self) -> &'static str {
        match self {
            NotificationOutcome::SignatureInvalid => ACK_CHECKSUM_ERROR,
            _ => ACK_OK,
        }
    }
}

/// The result of settling one payment event against inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementResult {
    /// Stock was taken for the order.
    Settled { order: Order, remaining: i64 },
    /// The order was paid for, but there was no stock left. This needs manual reconciliation.
    Oversold(Order),
    /// The order had already been settled by an earlier delivery of the same event.
    Duplicate(Order),
    /// The event names an order that does not exist. The event is dropped.
    OrderNotFound,
}
