use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::availability;
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashMap};

#[derive(Clone)]
pub struct PurchaseService {
    pool: SqlitePool,
}

impl PurchaseService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reserves numbers for a buyer. Lookup, availability check and insert
    /// run inside one transaction; the partial unique index on
    /// (rifa_id, number) for confirmed rows is the hard backstop, so a
    /// reservation that slips past a concurrent confirm still cannot turn
    /// into a double sale later.
    ///
    /// Pending purchases are allowed to overlap each other: a number is only
    /// claimed once an admin confirms.
    pub async fn create_purchase(
        &self,
        request: CreatePurchaseRequest,
    ) -> AppResult<CreatePurchaseResponse> {
        let numbers = normalize_numbers(&request.numbers)?;
        validate_buyer(&request)?;

        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let raffle: Option<(i64, i64)> =
            sqlx::query_as("SELECT price_cents, total_numbers FROM rifas WHERE id = ?")
                .bind(request.rifa_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (price_cents, total_numbers) =
            raffle.ok_or_else(|| AppError::NotFound("Raffle not found".to_string()))?;

        if let Some(&highest) = numbers.last()
            && highest > total_numbers
        {
            return Err(AppError::ValidationError(format!(
                "Numbers must be between 1 and {total_numbers}"
            )));
        }

        availability::validate_request(&mut *tx, request.rifa_id, &numbers).await?;

        let total_amount_cents = price_cents * numbers.len() as i64;

        let purchase_id = sqlx::query(
            "INSERT INTO purchases (rifa_id, buyer_name, buyer_phone, buyer_email, total_amount_cents)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(request.rifa_id)
        .bind(&request.buyer_name)
        .bind(&request.buyer_phone)
        .bind(&request.buyer_email)
        .bind(total_amount_cents)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for number in &numbers {
            sqlx::query(
                "INSERT INTO purchase_numbers (purchase_id, rifa_id, number) VALUES (?, ?, ?)",
            )
            .bind(purchase_id)
            .bind(request.rifa_id)
            .bind(number)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        log::info!(
            "Purchase {purchase_id} created for raffle {} ({} numbers, {total_amount_cents} cents)",
            request.rifa_id,
            numbers.len()
        );

        Ok(CreatePurchaseResponse {
            id: purchase_id,
            total_amount_cents,
        })
    }

    pub async fn list_all(&self) -> AppResult<Vec<PurchaseWithRaffle>> {
        let rows = sqlx::query_as::<_, PurchaseListRow>(
            "SELECT p.id, p.rifa_id, r.title AS rifa_title, p.buyer_name, p.buyer_phone,
                    p.buyer_email, p.total_amount_cents, p.status, p.created_at
             FROM purchases p
             JOIN rifas r ON r.id = p.rifa_id
             ORDER BY p.created_at DESC, p.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let number_rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT purchase_id, number FROM purchase_numbers ORDER BY purchase_id, number",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut numbers_by_purchase: HashMap<i64, Vec<i64>> = HashMap::new();
        for (purchase_id, number) in number_rows {
            numbers_by_purchase
                .entry(purchase_id)
                .or_default()
                .push(number);
        }

        Ok(rows
            .into_iter()
            .map(|row| PurchaseWithRaffle {
                numbers: numbers_by_purchase.remove(&row.id).unwrap_or_default(),
                id: row.id,
                rifa_id: row.rifa_id,
                rifa_title: row.rifa_title,
                buyer_name: row.buyer_name,
                buyer_phone: row.buyer_phone,
                buyer_email: row.buyer_email,
                total_amount_cents: row.total_amount_cents,
                status: row.status,
                created_at: row.created_at,
            })
            .collect())
    }

    /// Forward-only lifecycle: pending -> confirmed or pending -> rejected.
    /// Anything else is a validation error.
    ///
    /// The transaction starts with BEGIN IMMEDIATE, so racing confirms
    /// serialize on the write lock (the loser waits within the connection's
    /// busy timeout) and the availability re-check inside the transaction
    /// sees every previously committed confirm. The partial unique index on
    /// confirmed numbers stays in the schema as the backstop for writers
    /// that bypass this path.
    pub async fn set_status(&self, id: i64, new_status: PurchaseStatus) -> AppResult<()> {
        if new_status == PurchaseStatus::Pending {
            return Err(AppError::ValidationError(
                "Purchases cannot be moved back to pending".to_string(),
            ));
        }

        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let row: Option<(i64, PurchaseStatus)> =
            sqlx::query_as("SELECT rifa_id, status FROM purchases WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let (rifa_id, current) =
            row.ok_or_else(|| AppError::NotFound("Purchase not found".to_string()))?;

        if current != PurchaseStatus::Pending {
            return Err(AppError::ValidationError(format!(
                "Illegal status transition: {current} -> {new_status}"
            )));
        }

        match new_status {
            PurchaseStatus::Confirmed => {
                let requested: Vec<(i64,)> =
                    sqlx::query_as("SELECT number FROM purchase_numbers WHERE purchase_id = ?")
                        .bind(id)
                        .fetch_all(&mut *tx)
                        .await?;
                let requested: BTreeSet<i64> = requested.into_iter().map(|(n,)| n).collect();

                availability::validate_request(&mut *tx, rifa_id, &requested).await?;

                sqlx::query("UPDATE purchases SET status = 'confirmed' WHERE id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                sqlx::query(
                    "UPDATE purchase_numbers SET state = 'confirmed' WHERE purchase_id = ?",
                )
                .bind(id)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;

                log::info!("Purchase {id} confirmed");
            }
            PurchaseStatus::Rejected => {
                sqlx::query("UPDATE purchases SET status = 'rejected' WHERE id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("UPDATE purchase_numbers SET state = 'rejected' WHERE purchase_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;

                log::info!("Purchase {id} rejected");
            }
            PurchaseStatus::Pending => unreachable!(),
        }

        Ok(())
    }
}

/// Numbers must be a non-empty set of distinct positive integers.
fn normalize_numbers(numbers: &[i64]) -> AppResult<BTreeSet<i64>> {
    if numbers.is_empty() {
        return Err(AppError::ValidationError(
            "At least one number is required".to_string(),
        ));
    }

    if numbers.iter().any(|&n| n < 1) {
        return Err(AppError::ValidationError(
            "Numbers must be positive".to_string(),
        ));
    }

    let set: BTreeSet<i64> = numbers.iter().copied().collect();
    if set.len() != numbers.len() {
        return Err(AppError::ValidationError(
            "Numbers must be distinct".to_string(),
        ));
    }

    Ok(set)
}

fn validate_buyer(request: &CreatePurchaseRequest) -> AppResult<()> {
    if request.buyer_name.trim().is_empty()
        || request.buyer_phone.trim().is_empty()
        || request.buyer_email.trim().is_empty()
    {
        return Err(AppError::ValidationError(
            "Buyer name, phone and email are required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_numbers_rejects_bad_input() {
        assert!(normalize_numbers(&[]).is_err());
        assert!(normalize_numbers(&[0]).is_err());
        assert!(normalize_numbers(&[-3, 1]).is_err());
        assert!(normalize_numbers(&[1, 2, 2]).is_err());
    }

    #[test]
    fn test_normalize_numbers_sorts_and_keeps_distinct() {
        let set = normalize_numbers(&[3, 1, 2]).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
