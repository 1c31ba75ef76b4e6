use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use shop_payment_engine::db_types::{Order, OrderId, OrderStatusType, Product, ProductId};
use spg_common::Twd;

use crate::server::configure_extractors;

/// Sends the request to an app set up by `configure`, and returns the status and body of the response.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure_extractors).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), configure).await
}

pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, 6, 13, 20).unwrap()
}

pub fn widget(stock: i64) -> Product {
    Product { id: ProductId(1), name: "Widget".into(), price: Twd::from(100), stock }
}

pub fn order(id: i64, status: OrderStatusType) -> Order {
    Order {
        id: OrderId(id),
        product_id: ProductId(1),
        status,
        amount: Twd::from(100),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}
