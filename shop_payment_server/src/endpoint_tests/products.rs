use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::json;
use shop_payment_engine::{
    db_types::{Product, ProductId},
    CatalogApi,
    SqliteDatabaseError,
};

use super::{
    helpers::{get_request, send_request, widget},
    mocks::MockProductStore,
};
use crate::routes::{health, CreateProductRoute, ProductByIdRoute};

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/health", |cfg: &mut ServiceConfig| {
        cfg.service(health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn create_product() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/products").set_json(json!({"name": "Widget", "price": 100, "stock": 1}));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"id":1,"name":"Widget","price":100,"stock":1}"#);
}

#[actix_web::test]
async fn create_product_validates_input() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/products").set_json(json!({"name": "  ", "price": 100, "stock": 1}));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid request. Invalid product: Product name cannot be empty"}"#);

    let req = TestRequest::post().uri("/products").set_json(json!({"name": "Widget", "price": -5, "stock": 1}));
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/products").set_json(json!({"name": "Widget", "price": 100, "stock": -1}));
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/products").set_json(json!({"name": "Widget"}));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read request body"#));
}

#[actix_web::test]
async fn create_product_backend_failure() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/products").set_json(json!({"name": "Widget", "price": 100, "stock": 1}));
    let (status, body) = send_request(req, |cfg: &mut ServiceConfig| {
        let mut store = MockProductStore::new();
        store.expect_insert_product().returning(|_| Err(SqliteDatabaseError::QueryError("database is locked".into())));
        cfg.service(CreateProductRoute::<MockProductStore>::new()).app_data(web::Data::new(CatalogApi::new(store)));
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("database is locked"));
}

#[actix_web::test]
async fn fetch_product() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/products/1", configure).await;
    assert_eq!(status, StatusCode::OK);
    let product: Product = serde_json::from_str(&body).unwrap();
    assert_eq!(product, widget(3));

    let (status, body) = get_request("/products/2", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Product #2 does not exist"}"#);

    let (status, _) = get_request("/products/widget", configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockProductStore::new();
    store.expect_insert_product().returning(|p| Ok(Product { id: ProductId(1), name: p.name, price: p.price, stock: p.stock }));
    store.expect_fetch_product().returning(|id| Ok((id.value() == 1).then(|| widget(3))));
    cfg.service(CreateProductRoute::<MockProductStore>::new())
        .service(ProductByIdRoute::<MockProductStore>::new())
        .app_data(web::Data::new(CatalogApi::new(store)));
}
