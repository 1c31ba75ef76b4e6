//! Payment notifications against a real database, from checkout through to the order status.
use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use futures::{FutureExt, StreamExt};
use shop_payment_engine::{
    db_types::{NewProduct, OrderId, OrderStatusType},
    events::{DomainEvent, EventChannel, EventProducers},
    gateway::{GatewayParams, PaymentRequestBuilder},
    test_utils::{
        callbacks::{payment_callback, signed_payment_callback, test_gateway_config},
        prepare_env::{drop_test_database, new_test_database},
    },
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
    SqliteDatabaseError,
};
use spg_common::Twd;

use super::{
    helpers::{get_request, send_request},
    mocks::MockOrderStore,
};
use crate::routes::{OrderStatusRoute, PaymentWebhookRoute};

fn configure_with(api: web::Data<OrderFlowApi<SqliteDatabase>>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(web::scope("/webhooks").service(PaymentWebhookRoute::<SqliteDatabase>::new()))
            .service(OrderStatusRoute::<SqliteDatabase>::new())
            .app_data(api);
    }
}

fn webhook(gateway: &str, params: &GatewayParams) -> TestRequest {
    TestRequest::post().uri(&format!("/webhooks/{gateway}")).set_form(params)
}

async fn order_status(api: &web::Data<OrderFlowApi<SqliteDatabase>>, order_id: OrderId) -> String {
    let (status, body) = get_request(&format!("/orders/{order_id}/status"), configure_with(api.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    value["status"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn valid_notification_marks_the_order_paid_once() {
    let _ = env_logger::try_init().ok();
    let db = new_test_database(2).await;
    let widget = CatalogApi::new(db.clone()).create_product(NewProduct::new("Widget", Twd::from(100), 1)).await.unwrap();
    let channel = EventChannel::new(8);
    let mut producers = EventProducers::default();
    producers.payment_success_producer.push(channel.producer());
    let gateway = PaymentRequestBuilder::new(test_gateway_config());
    let codec = gateway.codec().clone();
    let api = web::Data::new(OrderFlowApi::new(db.clone(), producers, gateway));
    let order_id = api.checkout(widget.id).await.unwrap().order.id;
    assert_eq!(order_status(&api, order_id).await, "pending");

    let callback = signed_payment_callback(&codec, order_id, Twd::from(100));
    let (status, body) = send_request(webhook("ecpay", &callback), configure_with(api.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1|OK");
    assert_eq!(order_status(&api, order_id).await, "paid");

    // A redelivery is acknowledged, but does not request settlement again
    let (status, body) = send_request(webhook("ecpay", &callback), configure_with(api.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1|OK");

    drop(api);
    let events = channel.subscribe().collect::<Vec<_>>().now_or_never().expect("All producers have been dropped");
    assert_eq!(events, vec![DomainEvent::payment_success(order_id)]);
    drop_test_database(db).await;
}

#[actix_web::test]
async fn rejected_and_ignored_notifications() {
    let _ = env_logger::try_init().ok();
    let db = new_test_database(2).await;
    let widget = CatalogApi::new(db.clone()).create_product(NewProduct::new("Widget", Twd::from(100), 1)).await.unwrap();
    let gateway = PaymentRequestBuilder::new(test_gateway_config());
    let codec = gateway.codec().clone();
    let api = web::Data::new(OrderFlowApi::new(db.clone(), EventProducers::default(), gateway));
    let order_id = api.checkout(widget.id).await.unwrap().order.id;

    let mut tampered = signed_payment_callback(&codec, order_id, Twd::from(100));
    tampered.insert("TradeAmt", "1");
    let (status, body) = send_request(webhook("ecpay", &tampered), configure_with(api.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "0|CheckMacValue Error");

    let mut simulated = payment_callback(order_id, Twd::from(100), "1", true);
    codec.sign_in_place(&mut simulated);
    let (status, body) = send_request(webhook("ecpay", &simulated), configure_with(api.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1|OK");

    let mut failed = payment_callback(order_id, Twd::from(100), "10100058", false);
    codec.sign_in_place(&mut failed);
    let (_, body) = send_request(webhook("ecpay", &failed), configure_with(api.clone())).await;
    assert_eq!(body, "1|OK");

    let unknown = signed_payment_callback(&codec, OrderId(4242), Twd::from(100));
    let (_, body) = send_request(webhook("ecpay", &unknown), configure_with(api.clone())).await;
    assert_eq!(body, "1|OK");

    let valid = signed_payment_callback(&codec, order_id, Twd::from(100));
    let (status, _) = send_request(webhook("paypal", &valid), configure_with(api.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(order_status(&api, order_id).await, OrderStatusType::Pending.to_string());
    drop_test_database(db).await;
}

#[actix_web::test]
async fn verified_notification_is_acknowledged_when_the_store_fails() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_mark_order_paid()
        .times(1)
        .returning(|_| Err(SqliteDatabaseError::QueryError("database is locked".into())));
    let gateway = PaymentRequestBuilder::new(test_gateway_config());
    let codec = gateway.codec().clone();
    let api = web::Data::new(OrderFlowApi::new(store, EventProducers::default(), gateway));
    let callback = signed_payment_callback(&codec, OrderId(7), Twd::from(100));
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(web::scope("/webhooks").service(PaymentWebhookRoute::<MockOrderStore>::new())).app_data(api);
    };
    let (status, body) = send_request(webhook("ecpay", &callback), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1|OK");
}
