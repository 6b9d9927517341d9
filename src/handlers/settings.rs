use crate::services::SettingsService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    responses(
        (status = 200, description = "Site settings as a key/value map")
    )
)]
pub async fn get_settings(settings_service: web::Data<SettingsService>) -> Result<HttpResponse> {
    match settings_service.get_all().await {
        Ok(settings) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": settings
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Settings updated"),
        (status = 500, description = "Partial failure, failed keys listed")
    )
)]
pub async fn update_settings(
    settings_service: web::Data<SettingsService>,
    request: web::Json<HashMap<String, String>>,
) -> Result<HttpResponse> {
    match settings_service.upsert(&request.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn settings_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/settings")
            .route("", web::get().to(get_settings))
            .route("", web::put().to(update_settings)),
    );
}
