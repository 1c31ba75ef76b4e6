//! HTTP handlers for the shop
//!
//! Handlers are generic over the storage backend and registered through the `XxxRoute<B>` factories that `route!`
//! generates, which is what lets the endpoint tests run them against mock stores.
//!
//! Handlers never block the actix worker thread. Everything that touches the database is awaited, and settlement of
//! paid orders does not happen here at all: the webhook only publishes a payment event, and the settlement worker
//! picks it up on its own thread.
use actix_web::{get, http::header::ContentType, web, HttpResponse, Responder};
use log::*;
use shop_payment_engine::{
    db_types::{OrderId, ProductId},
    gateway::GatewayParams,
    order_objects::NotificationOutcome,
    CatalogApi,
    OrderFlowApi,
    OrderManagement,
    ProductManagement,
    SettlementApi,
    SettlementManagement,
};

use crate::{
    checkout_page::render_checkout_page,
    data_objects::{CreateOrderParams, NewProductRequest, OrderStatusResponse},
    errors::ServerError,
};

/// The only payment gateway that notifications are accepted from.
pub const ECPAY_GATEWAY: &str = "ecpay";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(create_product => Post "/products" impl ProductManagement);
/// Route handler for creating a product.
///
/// Takes a JSON body of the form `{"name": "Widget", "price": 100, "stock": 1}`. The price is in whole New Taiwan
/// dollars. The name may not be blank, and neither the price nor the stock may be negative.
pub async fn create_product<B: ProductManagement>(
    body: web::Json<NewProductRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST create product {}", request.name);
    let product = api.create_product(request.into()).await.map_err(|e| {
        debug!("💻️ Could not create product. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(product))
}

route!(product_by_id => Get "/products/{product_id}" impl ProductManagement);
pub async fn product_by_id<B: ProductManagement>(
    path: web::Path<ProductId>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    trace!("💻️ GET product #{product_id}");
    let product = api
        .fetch_product(product_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Product #{product_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderManagement);
/// Route handler for placing an order.
///
/// Places a `pending` order for one unit of `product_id` and responds with an HTML page that immediately posts the
/// signed checkout form to the payment gateway. Stock is not taken until the order has been paid for.
pub async fn create_order<B: OrderManagement>(
    query: web::Query<CreateOrderParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = query.product_id;
    debug!("💻️ POST order for product #{product_id}");
    let checkout = api.checkout(product_id).await?;
    let page = render_checkout_page(&api.gateway().config().checkout_url, &checkout.params);
    Ok(HttpResponse::Ok().content_type(ContentType::html()).body(page))
}

route!(order_status => Get "/orders/{order_id}/status" impl OrderManagement);
pub async fn order_status<B: OrderManagement>(
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET status for order #{order_id}");
    let order = api
        .fetch_order(order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order #{order_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(OrderStatusResponse::from(order)))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(payment_webhook => Post "/{gateway}" impl OrderManagement);
/// Route handler for payment gateway notifications. It is mounted under `/webhooks`.
///
/// The gateway posts a form-encoded, signed parameter set. A notification that fails the checksum is answered with
/// the gateway's failure acknowledgement. Every notification that passes the checksum is acknowledged with `1|OK`,
/// even if it could not be recorded; those are logged for manual reconciliation instead.
pub async fn payment_webhook<B: OrderManagement>(
    path: web::Path<String>,
    form: web::Form<GatewayParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let gateway = path.into_inner();
    if gateway != ECPAY_GATEWAY {
        info!("💻️ Received a notification for unknown payment gateway '{gateway}'");
        return Err(ServerError::NoRecordFound(format!("Unknown payment gateway: {gateway}")));
    }
    trace!("💻️ Received {gateway} payment notification with {} fields", form.len());
    let outcome = api.process_payment_notification(&form).await;
    match &outcome {
        NotificationOutcome::Paid(order) => info!("💻️ Order #{} has been paid for", order.id),
        NotificationOutcome::ReconciliationRequired { order_id, .. } => {
            warn!("💻️ Acknowledged a verified payment for order #{order_id} that could not be recorded")
        },
        _ => {},
    }
    Ok(HttpResponse::Ok().content_type(ContentType::plaintext()).body(outcome.gateway_response()))
}

//----------------------------------------------   Settlements  ----------------------------------------------------
route!(oversold_settlements => Get "/settlements/oversold" impl OrderManagement, SettlementManagement);
/// Paid orders that could not be fulfilled because the product had sold out. These need manual follow-up (usually a
/// refund).
pub async fn oversold_settlements<B>(api: web::Data<SettlementApi<B>>) -> Result<HttpResponse, ServerError>
where B: OrderManagement + SettlementManagement {
    trace!("💻️ GET oversold settlements");
    let settlements = api.oversold_settlements().await?;
    Ok(HttpResponse::Ok().json(settlements))
}
