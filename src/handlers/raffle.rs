use crate::models::*;
use crate::services::RaffleService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/rifas",
    tag = "raffles",
    responses(
        (status = 200, description = "Active raffles, newest first", body = [Raffle])
    )
)]
pub async fn list_raffles(raffle_service: web::Data<RaffleService>) -> Result<HttpResponse> {
    match raffle_service.list_active().await {
        Ok(raffles) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": raffles
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/rifas/{id}",
    tag = "raffles",
    params(("id" = i64, Path, description = "Raffle id")),
    responses(
        (status = 200, description = "Raffle with sold numbers", body = RaffleDetail),
        (status = 404, description = "Raffle not found")
    )
)]
pub async fn get_raffle(
    raffle_service: web::Data<RaffleService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match raffle_service.get_with_sold(path.into_inner()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/rifas",
    tag = "raffles",
    security(("bearer_auth" = [])),
    request_body = CreateRaffleRequest,
    responses(
        (status = 200, description = "Raffle created", body = CreateRaffleResponse),
        (status = 400, description = "Invalid price or total numbers")
    )
)]
pub async fn create_raffle(
    raffle_service: web::Data<RaffleService>,
    request: web::Json<CreateRaffleRequest>,
) -> Result<HttpResponse> {
    match raffle_service.create(request.into_inner()).await {
        Ok(id) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": CreateRaffleResponse { id }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/rifas/{id}",
    tag = "raffles",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Raffle id")),
    request_body = UpdateRaffleRequest,
    responses(
        (status = 200, description = "Raffle updated"),
        (status = 404, description = "Raffle not found")
    )
)]
pub async fn update_raffle(
    raffle_service: web::Data<RaffleService>,
    path: web::Path<i64>,
    request: web::Json<UpdateRaffleRequest>,
) -> Result<HttpResponse> {
    match raffle_service
        .update(path.into_inner(), request.into_inner())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/rifas/{id}",
    tag = "raffles",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Raffle id")),
    responses(
        (status = 200, description = "Raffle soft-deleted"),
        (status = 404, description = "Raffle not found")
    )
)]
pub async fn delete_raffle(
    raffle_service: web::Data<RaffleService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match raffle_service.soft_delete(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn raffle_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rifas")
            .route("", web::get().to(list_raffles))
            .route("", web::post().to(create_raffle))
            .route("/{id}", web::get().to(get_raffle))
            .route("/{id}", web::put().to(update_raffle))
            .route("/{id}", web::delete().to(delete_raffle)),
    );
}
