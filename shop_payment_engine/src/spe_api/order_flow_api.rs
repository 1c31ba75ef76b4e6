use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{MarkPaidResult, NewOrderResult, OrderManagement},
    db_types::{Order, OrderId, ProductId},
    events::{DomainEvent, EventProducers},
    gateway::{GatewayParams, PaymentCallback, PaymentRequestBuilder},
    spe_api::{
        errors::OrderFlowError,
        order_objects::{CheckoutRequest, NotificationOutcome},
    },
};

/// `OrderFlowApi` is the primary API for the order life cycle: placing an order, sending the buyer to the gateway,
/// and applying the gateway's payment notifications.
///
/// The order state machine is simple. Orders are created `pending`, and move to `paid` exactly once, when a
/// notification that passes the checksum reports a successful payment for it. `paid` is terminal. Each fresh
/// transition publishes one [`DomainEvent::PaymentSuccess`], which is what triggers settlement.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    gateway: PaymentRequestBuilder,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers, gateway: PaymentRequestBuilder) -> Self {
        Self { db, producers, gateway }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &PaymentRequestBuilder {
        &self.gateway
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Places a `pending` order for one unit of the product and builds the signed redirect to the payment gateway.
    ///
    /// The stock check made here only stops orders for products that have obviously sold out. Stock is taken when the
    /// order is settled, after payment.
    pub async fn checkout(&self, product_id: ProductId) -> Result<CheckoutRequest, OrderFlowError> {
        let result = self.db.insert_order_for_product(product_id).await.map_err(db_error)?;
        match result {
            NewOrderResult::Created { order, product } => {
                let params = self.gateway.build(order.id, order.amount, &product.name);
                info!("🔄️📦️ Order #{} created for product #{product_id} ({})", order.id, order.amount);
                Ok(CheckoutRequest { order, product, params })
            },
            NewOrderResult::OutOfStock(product) => {
                info!("🔄️📦️ Product #{} ({}) is out of stock. Order refused.", product.id, product.name);
                Err(OrderFlowError::OutOfStock(product.id))
            },
            NewOrderResult::ProductNotFound => Err(OrderFlowError::ProductNotFound(product_id)),
        }
    }

    pub async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderFlowError> {
        self.db.fetch_order(order_id).await.map_err(db_error)
    }

    /// Moves the order from `pending` to `paid`. Only a fresh transition publishes a payment event; an order that was
    /// already paid is returned untouched.
    pub async fn mark_order_paid(&self, order_id: OrderId) -> Result<MarkPaidResult, OrderFlowError> {
        let result = self.db.mark_order_paid(order_id).await.map_err(db_error)?;
        if let MarkPaidResult::Paid(order) = &result {
            debug!("🔄️💰️ Order #{} is paid. Requesting settlement.", order.id);
            self.producers.publish_payment_success(DomainEvent::payment_success(order.id)).await;
        }
        Ok(result)
    }

    /// Applies a payment notification from the gateway.
    ///
    /// The checksum is checked before anything else. A simulated payment, a failed payment, or a notification that
    /// does not name a known order, is acknowledged but changes nothing.
    ///
    /// Once the checksum has verified, the gateway must not be asked to send the notification again, so there is no
    /// error path. If the order could not be updated, the failure is logged as a reconciliation alert and the outcome
    /// says so.
    pub async fn process_payment_notification(&self, params: &GatewayParams) -> NotificationOutcome {
        if !self.gateway.codec().verify(params) {
            warn!("🔄️💰️ Payment notification failed checksum verification. It has been rejected.");
            return NotificationOutcome::SignatureInvalid;
        }
        let callback = PaymentCallback::from_params(params);
        trace!("🔄️💰️ Verified payment notification: {callback:?}");
        if callback.simulated {
            info!("🔄️💰️ Simulated payment notification for {:?} acknowledged and ignored.", callback.merchant_trade_no);
            return NotificationOutcome::Simulated;
        }
        if !callback.is_successful() {
            let rtn_code = callback.rtn_code.unwrap_or_default();
            info!(
                "🔄️💰️ Payment for {:?} was not successful. RtnCode {rtn_code}: {}",
                callback.merchant_trade_no,
                callback.rtn_msg.as_deref().unwrap_or_default()
            );
            return NotificationOutcome::PaymentNotSuccessful { rtn_code };
        }
        let Some(order_id) = callback.order_id else {
            warn!("🔄️💰️ Successful payment {:?} does not carry a valid order id. Ignoring it.", callback.trade_no);
            return NotificationOutcome::UnknownOrder;
        };
        let result = match self.mark_order_paid(order_id).await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    "🔄️💰️ RECONCILIATION REQUIRED. Payment {:?} ({:?}) for order #{order_id} passed verification but \
                     the order could not be marked as paid. {e}",
                    callback.trade_no, callback.merchant_trade_no
                );
                return NotificationOutcome::ReconciliationRequired { order_id, reason: e.to_string() };
            },
        };
        match result {
            MarkPaidResult::Paid(order) => {
                info!("🔄️💰️ Payment {:?} confirmed for order #{order_id}", callback.trade_no);
                NotificationOutcome::Paid(order)
            },
            MarkPaidResult::AlreadyPaid(order) => {
                info!("🔄️💰️ Order #{order_id} was already paid. Duplicate notification ignored.");
                NotificationOutcome::AlreadyPaid(order)
            },
            MarkPaidResult::NotFound => {
                warn!("🔄️💰️ Payment {:?} is for order #{order_id}, which does not exist.", callback.trade_no);
                NotificationOutcome::UnknownOrder
            },
        }
    }
}

fn db_error<E: std::error::Error>(e: E) -> OrderFlowError {
    OrderFlowError::DatabaseError(e.to_string())
}
