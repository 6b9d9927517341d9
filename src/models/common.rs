use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error payload shape shared by every failure response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}
