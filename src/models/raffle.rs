use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RaffleStatus {
    Active,
    Deleted,
}

impl std::fmt::Display for RaffleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RaffleStatus::Active => write!(f, "active"),
            RaffleStatus::Deleted => write!(f, "deleted"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Raffle {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Price per number in cents.
    pub price_cents: i64,
    pub total_numbers: i64,
    pub image_url: Option<String>,
    pub status: RaffleStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RaffleDetail {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub total_numbers: i64,
    pub image_url: Option<String>,
    pub status: RaffleStatus,
    pub created_at: NaiveDateTime,
    pub sold_numbers: Vec<i64>,
}

impl RaffleDetail {
    pub fn new(raffle: Raffle, sold_numbers: Vec<i64>) -> Self {
        Self {
            id: raffle.id,
            title: raffle.title,
            description: raffle.description,
            price_cents: raffle.price_cents,
            total_numbers: raffle.total_numbers,
            image_url: raffle.image_url,
            status: raffle.status,
            created_at: raffle.created_at,
            sold_numbers,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRaffleRequest {
    #[schema(example = "iPhone 16 Raffle")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = 1000)]
    pub price_cents: i64,
    #[schema(example = 100)]
    pub total_numbers: i64,
    /// Obtained from POST /api/upload beforehand.
    pub image_url: Option<String>,
}

/// Full-replace update for the scalar fields; `image_url` is only written
/// when a new image was uploaded, otherwise the stored one is kept.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateRaffleRequest {
    pub title: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub total_numbers: i64,
    pub status: Option<RaffleStatus>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRaffleResponse {
    pub id: i64,
}
