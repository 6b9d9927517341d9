use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::settings::get_settings,
        handlers::settings::update_settings,
        handlers::raffle::list_raffles,
        handlers::raffle::get_raffle,
        handlers::raffle::create_raffle,
        handlers::raffle::update_raffle,
        handlers::raffle::delete_raffle,
        handlers::purchase::create_purchase,
        handlers::purchase::list_purchases,
        handlers::purchase::set_purchase_status,
        handlers::upload::upload_image,
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            UserResponse,
            Raffle,
            RaffleStatus,
            RaffleDetail,
            CreateRaffleRequest,
            UpdateRaffleRequest,
            CreateRaffleResponse,
            Purchase,
            PurchaseStatus,
            CreatePurchaseRequest,
            CreatePurchaseResponse,
            PurchaseWithRaffle,
            SetPurchaseStatusRequest,
            UploadResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Admin login"),
        (name = "settings", description = "Site settings"),
        (name = "raffles", description = "Raffle management"),
        (name = "purchases", description = "Number reservations and review"),
        (name = "uploads", description = "Raffle image uploads"),
    ),
    info(
        title = "Rifas Backend API",
        version = "1.0.0",
        description = "Raffle-ticket sales REST API documentation",
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
