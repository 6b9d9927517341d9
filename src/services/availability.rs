use crate::error::{AppError, AppResult};
use sqlx::SqliteExecutor;
use std::collections::BTreeSet;

/// Numbers belonging to confirmed purchases of a raffle.
///
/// Executor-generic so callers can run it on the pool for display or on an
/// open transaction when validating a reservation. The normalized
/// `purchase_numbers` table makes this an indexed lookup; the purchase ledger
/// stays the single source of truth.
pub async fn sold_numbers<'e, E>(executor: E, rifa_id: i64) -> AppResult<BTreeSet<i64>>
where
    E: SqliteExecutor<'e>,
{
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT number FROM purchase_numbers WHERE rifa_id = ? AND state = 'confirmed'",
    )
    .bind(rifa_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|(n,)| n).collect())
}

/// Rejects a reservation whose numbers intersect the sold set, carrying the
/// exact conflicting subset so the buyer knows which numbers to avoid.
pub async fn validate_request<'e, E>(
    executor: E,
    rifa_id: i64,
    requested: &BTreeSet<i64>,
) -> AppResult<()>
where
    E: SqliteExecutor<'e>,
{
    let sold = sold_numbers(executor, rifa_id).await?;
    let conflicting: Vec<i64> = requested.intersection(&sold).copied().collect();

    if conflicting.is_empty() {
        Ok(())
    } else {
        Err(AppError::NumbersUnavailable(conflicting))
    }
}
