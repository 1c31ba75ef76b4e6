use std::{net::IpAddr, time::Duration};

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    web::{FormConfig, JsonConfig, PathConfig, QueryConfig},
    App,
    HttpServer,
};
use futures::{future::ok, FutureExt};
use log::*;
use shop_payment_engine::{
    events::{EventHooks, EventProducers},
    gateway::PaymentRequestBuilder,
    CatalogApi,
    OrderFlowApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    helpers::get_remote_ip,
    notifier::install_notifier,
    routes::{
        health,
        CreateOrderRoute,
        CreateProductRoute,
        OrderStatusRoute,
        OversoldSettlementsRoute,
        PaymentWebhookRoute,
        ProductByIdRoute,
    },
    settlement_worker::start_settlement_worker,
};

const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Starts the settlement worker, then serves HTTP until the server is stopped. Payment events that were queued when
/// the server stopped are settled before this function returns.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mut hooks = EventHooks::default();
    install_notifier(&mut hooks, &config.mail).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let (worker, producer) = start_settlement_worker(db.clone(), hooks, config.event_buffer_size)?;
    let mut producers = EventProducers::default();
    producers.payment_success_producer.push(producer);
    let result = match create_server_instance(config, db, producers) {
        Ok(srv) => srv.await.map_err(|e| ServerError::Unspecified(e.to_string())),
        Err(e) => Err(e),
    };
    info!("🚀️ HTTP server has stopped. Waiting for the settlement worker to drain.");
    worker.shutdown(WORKER_SHUTDOWN_TIMEOUT).await?;
    result
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let gateway = PaymentRequestBuilder::new(config.ecpay.clone());
    let srv = HttpServer::new(move || {
        let catalog_api = CatalogApi::new(db.clone());
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone(), gateway.clone());
        // Read-only: settlement itself happens on the worker thread
        let settlement_api = SettlementApi::new(db.clone(), EventProducers::default());
        let use_x_forwarded_for = config.use_x_forwarded_for;
        let use_forwarded = config.use_forwarded;
        let gateway_whitelist = config.gateway_whitelist.clone();
        let webhook_scope = web::scope("/webhooks")
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                if is_whitelisted(peer_ip, gateway_whitelist.as_deref()) {
                    srv.call(req).boxed_local()
                } else {
                    warn!("💻️ Denied a payment notification from {peer_ip:?}, which is not whitelisted.");
                    ok(req.error_response(ServerError::ForbiddenPeer)).boxed_local()
                }
            })
            .service(PaymentWebhookRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(settlement_api))
            .configure(configure_extractors)
            .service(health)
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(OrderStatusRoute::<SqliteDatabase>::new())
            .service(OversoldSettlementsRoute::<SqliteDatabase>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Renders extractor failures (bad JSON, query strings, path segments and forms) as `ServerError`s, so that every
/// client error has the same JSON shape.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(JsonConfig::default().error_handler(|e, _| ServerError::InvalidRequestBody(e.to_string()).into()))
        .app_data(FormConfig::default().error_handler(|e, _| ServerError::InvalidRequestBody(e.to_string()).into()))
        .app_data(QueryConfig::default().error_handler(|e, _| ServerError::InvalidRequestQuery(e.to_string()).into()))
        .app_data(PathConfig::default().error_handler(|e, _| ServerError::InvalidRequestPath(e.to_string()).into()));
}

/// Whether a request from `peer_ip` may call the webhooks. If there is no whitelist, every request is let through.
pub fn is_whitelisted(peer_ip: Option<IpAddr>, whitelist: Option<&[IpAddr]>) -> bool {
    match (peer_ip, whitelist) {
        (_, None) => true,
        (Some(ip), Some(whitelist)) => {
            info!("💻️ Payment notification from {ip}");
            whitelist.contains(&ip)
        },
        (None, Some(_)) => {
            warn!("💻️ No IP address found for the remote peer, denying access.");
            false
        },
    }
}
