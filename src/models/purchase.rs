use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseStatus::Pending => write!(f, "pending"),
            PurchaseStatus::Confirmed => write!(f, "confirmed"),
            PurchaseStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Purchase {
    pub id: i64,
    pub rifa_id: i64,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_email: String,
    pub total_amount_cents: i64,
    pub status: PurchaseStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePurchaseRequest {
    pub rifa_id: i64,
    #[schema(example = json!([1, 2, 3]))]
    pub numbers: Vec<i64>,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePurchaseResponse {
    pub id: i64,
    pub total_amount_cents: i64,
}

/// Admin listing row: purchase joined with its raffle title, numbers
/// re-aggregated from the normalized table.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseWithRaffle {
    pub id: i64,
    pub rifa_id: i64,
    pub rifa_title: String,
    pub numbers: Vec<i64>,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_email: String,
    pub total_amount_cents: i64,
    pub status: PurchaseStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct PurchaseListRow {
    pub id: i64,
    pub rifa_id: i64,
    pub rifa_title: String,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_email: String,
    pub total_amount_cents: i64,
    pub status: PurchaseStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetPurchaseStatusRequest {
    pub status: PurchaseStatus,
}
