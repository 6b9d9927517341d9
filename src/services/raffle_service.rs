use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::availability;
use sqlx::SqlitePool;

const RAFFLE_COLUMNS: &str =
    "id, title, description, price_cents, total_numbers, image_url, status, created_at";

#[derive(Clone)]
pub struct RaffleService {
    pool: SqlitePool,
}

impl RaffleService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_active(&self) -> AppResult<Vec<Raffle>> {
        let raffles = sqlx::query_as::<_, Raffle>(&format!(
            "SELECT {RAFFLE_COLUMNS} FROM rifas WHERE status = 'active'
             ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(raffles)
    }

    /// Fetches by id regardless of status, so soft-deleted raffles stay
    /// reachable for buyers holding old links and for purchase history.
    pub async fn get(&self, id: i64) -> AppResult<Raffle> {
        let raffle = sqlx::query_as::<_, Raffle>(&format!(
            "SELECT {RAFFLE_COLUMNS} FROM rifas WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        raffle.ok_or_else(|| AppError::NotFound("Raffle not found".to_string()))
    }

    pub async fn get_with_sold(&self, id: i64) -> AppResult<RaffleDetail> {
        let raffle = self.get(id).await?;
        let sold = availability::sold_numbers(&self.pool, id).await?;

        Ok(RaffleDetail::new(raffle, sold.into_iter().collect()))
    }

    pub async fn create(&self, request: CreateRaffleRequest) -> AppResult<i64> {
        validate_raffle_fields(&request.title, request.price_cents, request.total_numbers)?;

        let result = sqlx::query(
            "INSERT INTO rifas (title, description, price_cents, total_numbers, image_url)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.price_cents)
        .bind(request.total_numbers)
        .bind(&request.image_url)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        log::info!("Created raffle {id}: {}", request.title);
        Ok(id)
    }

    /// Full replace of the scalar fields. `image_url` is written only when a
    /// new image was supplied; otherwise the stored value is preserved.
    pub async fn update(&self, id: i64, request: UpdateRaffleRequest) -> AppResult<()> {
        validate_raffle_fields(&request.title, request.price_cents, request.total_numbers)?;

        let status = request.status.unwrap_or(RaffleStatus::Active);

        let result = if let Some(image_url) = &request.image_url {
            sqlx::query(
                "UPDATE rifas SET title = ?, description = ?, price_cents = ?,
                 total_numbers = ?, status = ?, image_url = ? WHERE id = ?",
            )
            .bind(&request.title)
            .bind(&request.description)
            .bind(request.price_cents)
            .bind(request.total_numbers)
            .bind(status)
            .bind(image_url)
            .bind(id)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                "UPDATE rifas SET title = ?, description = ?, price_cents = ?,
                 total_numbers = ?, status = ? WHERE id = ?",
            )
            .bind(&request.title)
            .bind(&request.description)
            .bind(request.price_cents)
            .bind(request.total_numbers)
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Raffle not found".to_string()));
        }

        Ok(())
    }

    /// Soft delete: flips status, keeps the row and every purchase pointing
    /// at it.
    pub async fn soft_delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("UPDATE rifas SET status = 'deleted' WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Raffle not found".to_string()));
        }

        log::info!("Soft-deleted raffle {id}");
        Ok(())
    }
}

fn validate_raffle_fields(title: &str, price_cents: i64, total_numbers: i64) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Title must not be empty".to_string(),
        ));
    }
    if price_cents <= 0 {
        return Err(AppError::ValidationError(
            "Price must be positive".to_string(),
        ));
    }
    if total_numbers <= 0 {
        return Err(AppError::ValidationError(
            "Total numbers must be positive".to_string(),
        ));
    }
    Ok(())
}
