use crate::error::AppError;
use crate::utils::JwtService;
use actix_web::body::EitherBody;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, ResponseError,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Route visibility is method-sensitive here: GET /api/settings is public
/// while PUT /api/settings is admin-only, so the public list matches on
/// (method, path) pairs plus a few public prefixes.
struct PublicPaths {
    exact: Vec<(Method, &'static str)>,
    get_prefixes: Vec<&'static str>,
    open_prefixes: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact: vec![
                (Method::POST, "/api/login"),
                (Method::GET, "/api/settings"),
                (Method::POST, "/api/purchase"),
            ],
            // Raffle reads are public; raffle mutations are never GETs.
            get_prefixes: vec!["/api/rifas"],
            open_prefixes: vec!["/uploads/", "/swagger-ui", "/api-docs/"],
        }
    }

    fn is_public(&self, method: &Method, path: &str) -> bool {
        if self.exact.iter().any(|(m, p)| m == method && *p == path) {
            return true;
        }

        if *method == Method::GET
            && self
                .get_prefixes
                .iter()
                .any(|&prefix| path == prefix || path.starts_with(&format!("{prefix}/")))
        {
            return true;
        }

        self.open_prefixes
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflights and public routes pass straight through.
        if req.method() == Method::OPTIONS
            || self.public_paths.is_public(req.method(), req.path())
        {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(|res| res.map_into_left_body()) });
        }

        let auth_header = req.headers().get("Authorization");

        let token = if let Some(auth_value) = auth_header {
            if let Ok(auth_str) = auth_value.to_str() {
                auth_str.strip_prefix("Bearer ")
            } else {
                None
            }
        } else {
            None
        };

        // Missing token is 401; a token that fails verification (garbage,
        // wrong signature, expired) is 403.
        let error = if let Some(token) = token {
            match self.jwt_service.verify_token(token) {
                Ok(claims) => {
                    req.extensions_mut()
                        .insert(claims.sub.parse::<i64>().unwrap_or(0));
                    let fut = self.service.call(req);
                    return Box::pin(async move {
                        fut.await.map(|res| res.map_into_left_body())
                    });
                }
                Err(_) => AppError::Forbidden,
            }
        } else {
            AppError::AuthError("Missing bearer token".to_string())
        };

        let response = error.error_response().map_into_right_body();
        Box::pin(async move { Ok(req.into_response(response)) })
    }
}
