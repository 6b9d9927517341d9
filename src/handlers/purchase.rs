use crate::models::*;
use crate::services::PurchaseService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/purchase",
    tag = "purchases",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 200, description = "Reservation created as pending", body = CreatePurchaseResponse),
        (status = 400, description = "Validation failure, or conflict with `unavailable` numbers"),
        (status = 404, description = "Raffle not found")
    )
)]
pub async fn create_purchase(
    purchase_service: web::Data<PurchaseService>,
    request: web::Json<CreatePurchaseRequest>,
) -> Result<HttpResponse> {
    match purchase_service.create_purchase(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/purchases",
    tag = "purchases",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All purchases joined with raffle title", body = [PurchaseWithRaffle])
    )
)]
pub async fn list_purchases(purchase_service: web::Data<PurchaseService>) -> Result<HttpResponse> {
    match purchase_service.list_all().await {
        Ok(purchases) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": purchases
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/purchases/{id}/status",
    tag = "purchases",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Purchase id")),
    request_body = SetPurchaseStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Illegal transition or number conflict"),
        (status = 404, description = "Purchase not found")
    )
)]
pub async fn set_purchase_status(
    purchase_service: web::Data<PurchaseService>,
    path: web::Path<i64>,
    request: web::Json<SetPurchaseStatusRequest>,
) -> Result<HttpResponse> {
    match purchase_service
        .set_status(path.into_inner(), request.status)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn purchase_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/purchase", web::post().to(create_purchase))
        .route("/purchases", web::get().to(list_purchases))
        .route(
            "/purchases/{id}/status",
            web::put().to(set_purchase_status),
        );
}
