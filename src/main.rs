use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use rifas_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration file");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    std::fs::create_dir_all(&config.uploads.dir).expect("Failed to create uploads directory");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.token_expires_in);

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    let settings_service = SettingsService::new(pool.clone());
    let raffle_service = RaffleService::new(pool.clone());
    let purchase_service = PurchaseService::new(pool.clone());

    auth_service
        .ensure_admin(&config.admin.email, &config.admin.password)
        .await
        .expect("Failed to bootstrap admin user");

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let uploads_config = config.uploads.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(settings_service.clone()))
            .app_data(web::Data::new(raffle_service.clone()))
            .app_data(web::Data::new(purchase_service.clone()))
            .app_data(web::Data::new(uploads_config.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api")
                    .configure(handlers::auth_config)
                    .configure(handlers::settings_config)
                    .configure(handlers::raffle_config)
                    .configure(handlers::purchase_config)
                    .configure(handlers::upload_config),
            )
            .service(actix_files::Files::new("/uploads", uploads_config.dir.as_str()))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
