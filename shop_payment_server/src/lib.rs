//! # Shop payment gateway server
//! This crate hosts the HTTP server for the shop payment gateway. It is responsible for:
//! * Managing the product catalog.
//! * Placing orders and redirecting buyers to the ECPay checkout with a signed form.
//! * Receiving ECPay payment notifications, verifying them and driving the order state machine.
//! * Running the settlement worker that takes stock for paid orders and emails the buyer.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /products`, `GET /products/{product_id}`: Create and look up products.
//! * `POST /orders?product_id=N`: Place an order and return the auto-submitting checkout page.
//! * `GET /orders/{order_id}/status`: The current status of an order.
//! * `POST /webhooks/ecpay`: The ECPay payment notification webhook.
//! * `GET /settlements/oversold`: Paid orders that could not be fulfilled from stock.

pub mod checkout_page;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod notifier;
pub mod routes;
pub mod server;
pub mod settlement_worker;

#[cfg(test)]
mod endpoint_tests;
