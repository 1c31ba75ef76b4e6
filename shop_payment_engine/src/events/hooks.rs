use std::{future::Future, pin::Pin, sync::Arc};

use tokio::task::JoinHandle;

use crate::events::{DomainEvent, EventHandler, EventProducer, Handler, OrderSettledEvent};

/// The set of producers handed to the engine APIs. An event is published to every producer in the relevant list.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_success_producer: Vec<EventProducer<DomainEvent>>,
    pub order_settled_producer: Vec<EventProducer<OrderSettledEvent>>,
}

impl EventProducers {
    pub async fn publish_payment_success(&self, event: DomainEvent) {
        for producer in &self.payment_success_producer {
            producer.publish_event(event).await;
        }
    }

    pub async fn publish_order_settled(&self, event: OrderSettledEvent) {
        for producer in &self.order_settled_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_settled: Option<EventHandler<OrderSettledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_settled = hooks.on_order_settled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_settled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_settled {
            result.order_settled_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns each configured handler onto the current runtime. Await the returned handles to wait for the hooks to
    /// drain after their producers have been dropped.
    pub fn start_handlers(self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        if let Some(handler) = self.on_order_settled {
            handles.push(tokio::spawn(async move {
                handler.start_handler().await;
            }));
        }
        handles
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_settled: Option<Handler<OrderSettledEvent>>,
}

impl EventHooks {
    pub fn on_order_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_settled = Some(Arc::new(f));
        self
    }
}
