use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Order, OrderId, ProductId},
};

/// Creates a `pending` order for the product, copying the product's current price into the order amount, as long as
/// the product has stock. Returns `None` if the product does not exist or is out of stock.
///
/// The stock check and the insert are one statement, so no order is created against a stock level that was read
/// earlier.
pub async fn insert_order_for_product(
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let now = Utc::now();
    let order = sqlx::query_as::<_, Order>(
        r#"
            INSERT INTO orders (product_id, status, amount, created_at, updated_at)
            SELECT id, 'pending', price, $1, $1 FROM products WHERE id = $2 AND stock > 0
            RETURNING id, product_id, status, amount, created_at, updated_at;
        "#,
    )
    .bind(now)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let order = sqlx::query_as::<_, Order>(
        r#"
            SELECT id, product_id, status, amount, created_at, updated_at
            FROM orders
            WHERE id = $1;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Moves the order from `pending` to `paid`. Returns the updated order, or `None` if there was no pending order with
/// the given id (i.e. it does not exist, or has already been paid).
pub async fn mark_pending_order_paid(
    id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let order = sqlx::query_as::<_, Order>(
        r#"
            UPDATE orders SET status = 'paid', updated_at = $1
            WHERE id = $2 AND status = 'pending'
            RETURNING id, product_id, status, amount, created_at, updated_at;
        "#,
    )
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
