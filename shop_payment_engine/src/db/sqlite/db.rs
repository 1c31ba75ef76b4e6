use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{new_pool, orders, products, settlements, SqliteDatabaseError};
use crate::{
    db::traits::{
        MarkPaidResult,
        NewOrderResult,
        OrderManagement,
        PaymentGatewayDatabase,
        ProductManagement,
        SettleOrderResult,
        SettlementManagement,
        StockDecrement,
    },
    db_types::{NewProduct, Order, OrderId, Product, ProductId, Settlement, SettlementOutcomeType},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl ProductManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        debug!("🗃️ Product #{} ({}) saved with {} in stock at {}", product.id, product.name, product.stock, product.price);
        Ok(product)
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(id, &mut conn).await
    }

    async fn decrement_stock(&self, id: ProductId) -> Result<StockDecrement, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        products::decrement_stock(id, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn insert_order_for_product(&self, product_id: ProductId) -> Result<NewOrderResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let result = match orders::insert_order_for_product(product_id, &mut tx).await? {
            Some(order) => {
                let product = products::fetch_product(product_id, &mut tx).await?.ok_or_else(|| {
                    SqliteDatabaseError::QueryError(format!("Product #{product_id} vanished while order was placed"))
                })?;
                debug!("🗃️ Order #{} for product #{product_id} saved for {}", order.id, order.amount);
                NewOrderResult::Created { order, product }
            },
            None => match products::fetch_product(product_id, &mut tx).await? {
                Some(product) => {
                    debug!("🗃️ Product #{product_id} is out of stock. No order was created.");
                    NewOrderResult::OutOfStock(product)
                },
                None => {
                    debug!("🗃️ Product #{product_id} does not exist. No order was created.");
                    NewOrderResult::ProductNotFound
                },
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(id, &mut conn).await
    }

    async fn mark_order_paid(&self, id: OrderId) -> Result<MarkPaidResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let result = match orders::mark_pending_order_paid(id, &mut tx).await? {
            Some(order) => {
                debug!("🗃️ Order #{id} is now paid");
                MarkPaidResult::Paid(order)
            },
            None => match orders::fetch_order(id, &mut tx).await? {
                Some(order) => {
                    debug!("🗃️ Order #{id} was already {}. Nothing to do.", order.status);
                    MarkPaidResult::AlreadyPaid(order)
                },
                None => MarkPaidResult::NotFound,
            },
        };
        tx.commit().await?;
        Ok(result)
    }
}

impl SettlementManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn settle_order(&self, order: &Order) -> Result<SettleOrderResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        // The claim is the first statement so that the transaction takes the write lock before it reads anything.
        let claimed = settlements::claim_settlement(order, SettlementOutcomeType::OutOfStock, &mut tx).await?;
        if !claimed {
            debug!("🗃️ Order #{} has already been settled", order.id);
            tx.rollback().await?;
            return Ok(SettleOrderResult::AlreadySettled);
        }
        let result = match products::decrement_stock(order.product_id, &mut tx).await? {
            StockDecrement::Decremented { remaining } => {
                settlements::update_outcome(order, SettlementOutcomeType::Decremented, &mut tx).await?;
                SettleOrderResult::Decremented { remaining }
            },
            StockDecrement::OutOfStock => SettleOrderResult::OutOfStock,
        };
        tx.commit().await?;
        trace!("🗃️ Order #{} settled: {result:?}", order.id);
        Ok(result)
    }

    async fn fetch_oversold_settlements(&self) -> Result<Vec<Settlement>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        settlements::fetch_settlements_with_outcome(SettlementOutcomeType::OutOfStock, &mut conn).await
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Migrations are embedded in the binary.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}
