use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Order, Settlement, SettlementOutcomeType},
};

/// Claims the settlement for the order by inserting its ledger row with the given provisional outcome.
///
/// Returns `false` if the order already has a settlement row, in which case nothing was written.
pub async fn claim_settlement(
    order: &Order,
    outcome: SettlementOutcomeType,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            INSERT INTO settlements (order_id, product_id, outcome, created_at) VALUES ($1, $2, $3, $4)
            ON CONFLICT (order_id) DO NOTHING;
        "#,
    )
    .bind(order.id)
    .bind(order.product_id)
    .bind(outcome)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    trace!("🗃️ Settlement claim for order #{}: {} rows inserted", order.id, result.rows_affected());
    Ok(result.rows_affected() == 1)
}

pub async fn update_outcome(
    order: &Order,
    outcome: SettlementOutcomeType,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE settlements SET outcome = $1 WHERE order_id = $2").bind(outcome).bind(order.id).execute(conn).await?;
    Ok(())
}

pub async fn fetch_settlements_with_outcome(
    outcome: SettlementOutcomeType,
    conn: &mut SqliteConnection,
) -> Result<Vec<Settlement>, SqliteDatabaseError> {
    let settlements = sqlx::query_as::<_, Settlement>(
        r#"
            SELECT order_id, product_id, outcome, created_at
            FROM settlements
            WHERE outcome = $1
            ORDER BY created_at ASC, order_id ASC;
        "#,
    )
    .bind(outcome)
    .fetch_all(conn)
    .await?;
    Ok(settlements)
}
