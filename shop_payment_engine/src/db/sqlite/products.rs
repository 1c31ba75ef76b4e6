use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::StockDecrement},
    db_types::{NewProduct, Product, ProductId},
};

/// Inserts a new product into the database using the given connection.
pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, SqliteDatabaseError> {
    if product.stock < 0 || product.price.is_negative() {
        return Err(SqliteDatabaseError::ProductCreationError(format!(
            "Price and stock must not be negative. Got price {} and stock {}",
            product.price, product.stock
        )));
    }
    let product = sqlx::query_as::<_, Product>(
        r#"
            INSERT INTO products (name, price, stock) VALUES ($1, $2, $3)
            RETURNING id, name, price, stock;
        "#,
    )
    .bind(product.name)
    .bind(product.price)
    .bind(product.stock)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, SqliteDatabaseError> {
    let product = sqlx::query_as::<_, Product>("SELECT id, name, price, stock FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

/// Decrements the stock of the product by one, but only if there is stock left. The guard and the decrement are a
/// single statement, so concurrent callers can never both take the last unit.
///
/// This is not wrapped in a transaction. Pass `&mut *tx` as the connection to make it part of a larger one.
pub async fn decrement_stock(
    id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<StockDecrement, SqliteDatabaseError> {
    let remaining = sqlx::query_scalar::<_, i64>(
        r#"
            UPDATE products SET stock = stock - 1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND stock > 0
            RETURNING stock;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    let result = match remaining {
        Some(remaining) => StockDecrement::Decremented { remaining },
        None => StockDecrement::OutOfStock,
    };
    trace!("🗃️ Stock decrement for product #{id}: {result:?}");
    Ok(result)
}
