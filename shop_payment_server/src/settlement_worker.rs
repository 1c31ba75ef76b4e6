//! The settlement worker.
//!
//! Payment events are settled away from the HTTP workers, on a dedicated OS thread that owns its own multi-threaded
//! tokio runtime. The worker drains the payment event queue in FIFO order, settling each event on its own task. The
//! order-settled hooks (the payment confirmation email) run on the same runtime.
//!
//! The worker stops when every producer of payment events has been dropped. It finishes the events that are already
//! queued, waits for in-flight settlements, and then waits for the hooks to drain before the thread exits.
use std::{future::Future, pin::Pin, sync::Arc, thread, time::Duration};

use log::*;
use shop_payment_engine::{
    events::{DomainEvent, EventHandler, EventHandlers, EventHooks, EventProducer},
    order_objects::SettlementResult,
    SettlementApi,
    SqliteDatabase,
};

use crate::errors::ServerError;

pub struct SettlementWorker {
    handle: thread::JoinHandle<()>,
}

/// Starts the settlement worker thread, and returns it along with the producer that feeds it payment events.
///
/// The worker keeps running until the returned producer, and every clone of it, has been dropped.
pub fn start_settlement_worker(
    db: SqliteDatabase,
    hooks: EventHooks,
    buffer_size: usize,
) -> Result<(SettlementWorker, EventProducer<DomainEvent>), ServerError> {
    let handlers = EventHandlers::new(buffer_size, hooks);
    let api = SettlementApi::new(db, handlers.producers());
    let worker = EventHandler::new(
        buffer_size,
        Arc::new(move |ev: DomainEvent| {
            let api = api.clone();
            Box::pin(async move {
                match api.settle(ev).await {
                    Ok(SettlementResult::Settled { order, remaining }) => {
                        debug!("🧾️ Settled order #{} ({remaining} left)", order.id);
                    },
                    Ok(result) => trace!("🧾️ Settlement result for {ev:?}: {result:?}"),
                    Err(e) => error!("🧾️ Could not settle {ev:?}. The event has been dropped. {e}"),
                }
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        }),
    );
    let producer = worker.subscribe();
    let handle = thread::Builder::new()
        .name("settlement-worker".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .thread_name("settlement-runtime")
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!("🧾️ Could not start the settlement runtime. Paid orders will not be settled. {e}");
                    return;
                },
            };
            runtime.block_on(async move {
                info!("🧾️ Settlement worker started");
                let hook_handles = handlers.start_handlers();
                worker.start_handler().await;
                debug!("🧾️ Payment event queue closed. Waiting for notification hooks to finish.");
                for handle in hook_handles {
                    if let Err(e) = handle.await {
                        warn!("🧾️ A notification hook did not shut down cleanly. {e}");
                    }
                }
                info!("🧾️ Settlement worker has shut down");
            });
        })
        .map_err(|e| ServerError::InitializeError(format!("Could not start the settlement worker thread. {e}")))?;
    Ok((SettlementWorker { handle }, producer))
}

impl SettlementWorker {
    /// Blocks until the worker thread exits. Only returns once every payment event producer has been dropped.
    pub fn join(self) -> Result<(), ServerError> {
        self.handle.join().map_err(|_| ServerError::Unspecified("The settlement worker panicked".into()))
    }

    /// Waits for the worker to drain without blocking the calling runtime, giving up after `timeout`.
    pub async fn shutdown(self, timeout: Duration) -> Result<(), ServerError> {
        let join = tokio::task::spawn_blocking(move || self.join());
        match tokio::time::timeout(timeout, join).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ServerError::Unspecified(format!("Could not wait for the settlement worker. {e}"))),
            Err(_) => {
                warn!("🧾️ Settlement worker did not finish within {timeout:?}. Queued payment events may be lost.");
                Ok(())
            },
        }
    }
}
