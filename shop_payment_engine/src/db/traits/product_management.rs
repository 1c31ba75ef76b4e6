use crate::{
    db::traits::StockDecrement,
    db_types::{NewProduct, Product, ProductId},
};

/// The `ProductManagement` trait defines the behaviour for creating and querying products, and for mutating stock.
#[allow(async_fn_in_trait)]
pub trait ProductManagement {
    type Error: std::error::Error;

    /// Stores a new product and returns it with its assigned id.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, Self::Error>;

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, Self::Error>;

    /// Atomically checks that the product has stock left, and if so, decrements it by exactly one.
    ///
    /// This must be race-free under concurrent calls for the same product: of `n` concurrent calls against a stock of
    /// `k < n`, exactly `k` return [`StockDecrement::Decremented`]. A product that does not exist has no stock.
    async fn decrement_stock(&self, id: ProductId) -> Result<StockDecrement, Self::Error>;
}
