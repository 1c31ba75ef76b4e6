//! # Shop payment engine public API
//!
//! The `spe_api` module exposes the programmatic API for the shop payment engine. Each API only asks for the storage
//! traits it needs, so clients can pick the functionality they want.
//!
//! * [`catalog_api`] creates and looks up products.
//! * [`order_flow_api`] places orders, builds the signed gateway redirect, and applies verified payment notifications
//!   to the order state machine. A fresh `pending → paid` transition publishes a [`DomainEvent`].
//! * [`settlement_api`] consumes those events and settles paid orders against inventory, exactly once per order.
//!
//! The other submodules in this module are support types.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use shop_payment_engine::{CatalogApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/shop.db", 5).await?;
//! let api = CatalogApi::new(db);
//! let product = api.create_product(NewProduct::new("Widget", Twd::from(100), 1)).await?;
//! ```
//!
//! [`DomainEvent`]: crate::events::DomainEvent

pub mod catalog_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod settlement_api;
