use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::ProductManagement,
    db_types::{NewProduct, Product, ProductId},
    spe_api::errors::CatalogApiError,
};

/// `CatalogApi` creates products and looks them up.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B>
where B: ProductManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Validates and stores a new product. The name may not be blank, and neither price nor stock may be negative.
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        if product.name.trim().is_empty() {
            return Err(CatalogApiError::ValidationError("Product name cannot be empty".into()));
        }
        if product.price.is_negative() {
            return Err(CatalogApiError::ValidationError(format!("Price cannot be negative. Got {}", product.price)));
        }
        if product.stock < 0 {
            return Err(CatalogApiError::ValidationError(format!("Stock cannot be negative. Got {}", product.stock)));
        }
        let product = self.db.insert_product(product).await.map_err(|e| CatalogApiError::DatabaseError(e.to_string()))?;
        info!("📦️ Product #{} ({}) created with {} in stock", product.id, product.name, product.stock);
        Ok(product)
    }

    pub async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, CatalogApiError> {
        self.db.fetch_product(id).await.map_err(|e| CatalogApiError::DatabaseError(e.to_string()))
    }
}
