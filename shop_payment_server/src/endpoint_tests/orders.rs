use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use regex::Regex;
use shop_payment_engine::{
    db_types::{OrderId, OrderStatusType, Product, Settlement, SettlementOutcomeType},
    events::EventProducers,
    gateway::{EcpayConfig, GatewayParams, PaymentRequestBuilder},
    NewOrderResult,
    OrderFlowApi,
    SettlementApi,
};

use super::{
    helpers::{get_request, order, send_request, timestamp, widget},
    mocks::MockOrderStore,
};
use crate::routes::{CreateOrderRoute, OrderStatusRoute, OversoldSettlementsRoute};

#[actix_web::test]
async fn create_order_returns_checkout_form() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::post().uri("/orders?product_id=1"), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"action="https://payment-stage.ecpay.com.tw/Cashier/AioCheckOut/V5""#));
    assert!(body.contains("document.forms[0].submit()"));

    let re = Regex::new(r#"<input type="hidden" name="([^"]+)" value="([^"]*)">"#).unwrap();
    let params = re.captures_iter(&body).map(|c| (c[1].to_string(), c[2].to_string())).collect::<GatewayParams>();
    assert_eq!(params.get("MerchantID"), Some("3002607"));
    assert_eq!(params.get("TotalAmount"), Some("100"));
    assert_eq!(params.get("ItemName"), Some("Widget"));
    assert_eq!(params.get("CustomField1"), Some("7"));
    assert!(params.get("MerchantTradeNo").unwrap().starts_with("O7T"));
    assert!(EcpayConfig::default().codec().verify(&params), "The form must carry a valid CheckMacValue");
}

#[actix_web::test]
async fn create_order_rejections() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::post().uri("/orders?product_id=2"), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Product #2 is out of stock"}"#);

    let (status, body) = send_request(TestRequest::post().uri("/orders?product_id=3"), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Product #3 does not exist"}"#);

    let (status, body) = send_request(TestRequest::post().uri("/orders?product_id=abc"), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read request query"#));

    let (status, _) = send_request(TestRequest::post().uri("/orders"), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn order_status() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/orders/7/status", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"order_id":7,"status":"pending","updated_at":"2024-06-10T06:13:20Z"}"#);

    let (status, body) = get_request("/orders/8/status", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"order_id":8,"status":"paid","updated_at":"2024-06-10T06:13:20Z"}"#);

    let (status, body) = get_request("/orders/99/status", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order #99 does not exist"}"#);
}

#[actix_web::test]
async fn oversold_settlements() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/settlements/oversold", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        r#"[{"order_id":8,"product_id":1,"outcome":"out_of_stock","created_at":"2024-06-10T06:13:20Z"}]"#
    );
}

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockOrderStore::new();
    store.expect_insert_order_for_product().returning(|product_id| {
        let result = match product_id.value() {
            1 => NewOrderResult::Created { order: order(7, OrderStatusType::Pending), product: widget(1) },
            2 => NewOrderResult::OutOfStock(Product { id: product_id, ..widget(0) }),
            _ => NewOrderResult::ProductNotFound,
        };
        Ok(result)
    });
    store.expect_fetch_order().returning(|id| {
        let order = match id {
            OrderId(7) => Some(order(7, OrderStatusType::Pending)),
            OrderId(8) => Some(order(8, OrderStatusType::Paid)),
            _ => None,
        };
        Ok(order)
    });
    let gateway = PaymentRequestBuilder::new(EcpayConfig::default());
    let orders_api = OrderFlowApi::new(store, EventProducers::default(), gateway);

    let mut settlement_store = MockOrderStore::new();
    settlement_store.expect_fetch_oversold_settlements().returning(|| {
        Ok(vec![Settlement {
            order_id: OrderId(8),
            product_id: widget(0).id,
            outcome: SettlementOutcomeType::OutOfStock,
            created_at: timestamp(),
        }])
    });
    let settlement_api = SettlementApi::new(settlement_store, EventProducers::default());
    cfg.service(CreateOrderRoute::<MockOrderStore>::new())
        .service(OrderStatusRoute::<MockOrderStore>::new())
        .service(OversoldSettlementsRoute::<MockOrderStore>::new())
        .app_data(web::Data::new(orders_api))
        .app_data(web::Data::new(settlement_api));
}
