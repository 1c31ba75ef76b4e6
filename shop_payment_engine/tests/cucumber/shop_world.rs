use std::{collections::HashMap, fmt::Debug, pin::Pin};

use cucumber::World;
use futures_util::{FutureExt, Stream, StreamExt};
use log::*;
use shop_payment_engine::{
    db_types::{Order, ProductId},
    events::{DomainEvent, EventChannel, EventProducers, OrderSettledEvent},
    gateway::{CheckMacCodec, PaymentRequestBuilder},
    order_objects::{NotificationOutcome, SettlementResult},
    test_utils::{
        callbacks::test_gateway_config,
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    CatalogApi,
    OrderFlowApi,
    OrderFlowError,
    SettlementApi,
    SqliteDatabase,
};

type EventStream<E> = Pin<Box<dyn Stream<Item = E> + Send>>;

#[derive(Default, Debug, World)]
pub struct ShopWorld {
    pub system: Option<ShopSystem>,
}

impl ShopWorld {
    pub fn system(&mut self) -> &mut ShopSystem {
        self.system.as_mut().expect("Shop system not initialised")
    }
}

/// The engine with its event channels drained by hand, so that scenarios decide exactly when settlement happens.
pub struct ShopSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub catalog: CatalogApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub settlement: SettlementApi<SqliteDatabase>,
    pub codec: CheckMacCodec,
    pub products: HashMap<String, ProductId>,
    pub placed_orders: Vec<Order>,
    pub last_outcome: Option<NotificationOutcome>,
    pub last_checkout_error: Option<OrderFlowError>,
    pub settlement_results: Vec<SettlementResult>,
    pub notifications: Vec<OrderSettledEvent>,
    payment_events: EventStream<DomainEvent>,
    settled_events: EventStream<OrderSettledEvent>,
}

impl Debug for ShopSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ShopSystem ({})", self.db_path)
    }
}

impl ShopSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let payment_channel = EventChannel::new(64);
        let settled_channel = EventChannel::new(64);
        let mut producers = EventProducers::default();
        producers.payment_success_producer.push(payment_channel.producer());
        producers.order_settled_producer.push(settled_channel.producer());
        let gateway = PaymentRequestBuilder::new(test_gateway_config());
        let codec = gateway.codec().clone();
        Self {
            db_path: url,
            catalog: CatalogApi::new(db.clone()),
            orders: OrderFlowApi::new(db.clone(), producers.clone(), gateway),
            settlement: SettlementApi::new(db.clone(), producers),
            db,
            codec,
            products: HashMap::new(),
            placed_orders: Vec::new(),
            last_outcome: None,
            last_checkout_error: None,
            settlement_results: Vec::new(),
            notifications: Vec::new(),
            payment_events: Box::pin(payment_channel.subscribe()),
            settled_events: Box::pin(settled_channel.subscribe()),
        }
    }

    pub fn product_id(&self, name: &str) -> ProductId {
        *self.products.get(name).unwrap_or_else(|| panic!("Unknown product {name}"))
    }

    pub fn last_order(&self) -> &Order {
        self.placed_orders.last().expect("No order has been placed")
    }

    /// Settles every payment event that has been published so far, then collects the notifications they caused.
    pub async fn run_settlement(&mut self) {
        while let Some(Some(event)) = self.payment_events.next().now_or_never() {
            let result = self.settlement.settle(event).await.expect("Error settling order");
            self.settlement_results.push(result);
        }
        while let Some(Some(event)) = self.settled_events.next().now_or_never() {
            self.notifications.push(event);
        }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
