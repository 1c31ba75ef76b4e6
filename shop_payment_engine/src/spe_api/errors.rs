use thiserror::Error;

use crate::db_types::ProductId;

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid product: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product #{0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Product #{0} is out of stock")]
    OutOfStock(ProductId),
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}
