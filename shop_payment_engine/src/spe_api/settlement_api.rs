use std::{
    collections::{hash_map::Entry, HashMap},
    fmt::Debug,
    sync::{Arc, Mutex},
};

use log::*;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::{
    db::traits::{OrderManagement, SettleOrderResult, SettlementManagement},
    db_types::{ProductId, Settlement},
    events::{DomainEvent, EventProducers, OrderSettledEvent},
    spe_api::{errors::SettlementError, order_objects::SettlementResult},
};

type ProductLocks = Arc<Mutex<HashMap<ProductId, Arc<AsyncMutex<()>>>>>;

/// `SettlementApi` settles paid orders against inventory.
///
/// Every [`DomainEvent::PaymentSuccess`] takes one unit of stock for its order, at most once, no matter how many times
/// the event is delivered. Settlements of the same product are serialized behind a per-product lock, while different
/// products settle concurrently. The stock decrement itself is atomic in the backend, so the lock only keeps
/// contention off the database.
///
/// Clones share the same lock table.
#[derive(Clone)]
pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
    locks: ProductLocks,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B>
where B: OrderManagement + SettlementManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, locks: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Settles the order named in the event.
    ///
    /// An oversold order (paid for, but out of stock by the time it settles) is not an error as far as the caller is
    /// concerned. It is logged and recorded for manual follow-up, and [`SettlementResult::Oversold`] is returned.
    /// Only stock-taking settlements notify the order-settled hooks.
    pub async fn settle(&self, event: DomainEvent) -> Result<SettlementResult, SettlementError> {
        let order_id = event.order_id();
        let order = self
            .db
            .fetch_order(order_id)
            .await
            .map_err(|e| SettlementError::DatabaseError(e.to_string()))?;
        let Some(order) = order else {
            warn!("🧾️ Payment event for order #{order_id} cannot be settled: the order does not exist. Dropping it.");
            return Ok(SettlementResult::OrderNotFound);
        };
        let result = {
            let _guard = self.lock_product(order.product_id).await;
            self.db.settle_order(&order).await.map_err(|e| SettlementError::DatabaseError(e.to_string()))?
        };
        let result = match result {
            SettleOrderResult::Decremented { remaining } => {
                info!("🧾️ Order #{order_id} settled. Product #{} has {remaining} left in stock.", order.product_id);
                self.producers.publish_order_settled(OrderSettledEvent::new(&order)).await;
                SettlementResult::Settled { order, remaining }
            },
            SettleOrderResult::OutOfStock => {
                error!(
                    "🧾️ RECONCILIATION FAILURE. Order #{order_id} was paid ({}), but product #{} is out of stock. The \
                     order has been recorded as oversold and needs manual follow-up.",
                    order.amount, order.product_id
                );
                SettlementResult::Oversold(order)
            },
            SettleOrderResult::AlreadySettled => {
                info!("🧾️ Order #{order_id} was already settled. Duplicate payment event ignored.");
                SettlementResult::Duplicate(order)
            },
        };
        Ok(result)
    }

    /// Orders that were paid for, but could not be fulfilled from stock.
    pub async fn oversold_settlements(&self) -> Result<Vec<Settlement>, SettlementError> {
        self.db.fetch_oversold_settlements().await.map_err(|e| SettlementError::DatabaseError(e.to_string()))
    }

}

impl<B> SettlementApi<B> {
    async fn lock_product(&self, product_id: ProductId) -> ProductLockGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(product_id).or_default())
        };
        trace!("🧾️ Waiting for settlement lock on product #{product_id}");
        let guard = lock.lock_owned().await;
        ProductLockGuard { product_id, locks: Arc::clone(&self.locks), guard: Some(guard) }
    }
}

/// Holds the settlement lock for one product. On release, the product's entry is removed from the lock table unless
/// another settlement is holding or waiting on it, so the table only ever contains products being settled right now.
struct ProductLockGuard {
    product_id: ProductId,
    locks: ProductLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ProductLockGuard {
    fn drop(&mut self) {
        // The owned guard keeps a reference to the mutex, so it has to go first
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Entry::Occupied(entry) = locks.entry(self.product_id) {
            if Arc::strong_count(entry.get()) == 1 {
                entry.remove();
            }
        }
    }
}
