use actix_web::{App, test, web};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use rifas_backend::{
    AppError,
    config::DatabaseConfig,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::AuthMiddleware,
    models::{CreatePurchaseRequest, CreateRaffleRequest, PurchaseStatus},
    services::{AuthService, PurchaseService, RaffleService, SettingsService},
    utils::JwtService,
};

const JWT_SECRET: &str = "test-secret";
const ADMIN_EMAIL: &str = "admin@rifas.com";
const ADMIN_PASSWORD: &str = "admin123";

struct TestCtx {
    pool: SqlitePool,
    jwt: JwtService,
}

async fn setup() -> TestCtx {
    // One connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    run_migrations(&pool).await.expect("migrations");

    let jwt = JwtService::new(JWT_SECRET, 3600);
    AuthService::new(pool.clone(), jwt.clone())
        .ensure_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .expect("admin bootstrap");

    TestCtx { pool, jwt }
}

impl TestCtx {
    fn admin_token(&self) -> String {
        self.jwt.generate_token(1, ADMIN_EMAIL).expect("token")
    }
}

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new($ctx.jwt.clone()))
                .app_data(web::Data::new(AuthService::new(
                    $ctx.pool.clone(),
                    $ctx.jwt.clone(),
                )))
                .app_data(web::Data::new(SettingsService::new($ctx.pool.clone())))
                .app_data(web::Data::new(RaffleService::new($ctx.pool.clone())))
                .app_data(web::Data::new(PurchaseService::new($ctx.pool.clone())))
                .service(
                    web::scope("/api")
                        .configure(handlers::auth_config)
                        .configure(handlers::settings_config)
                        .configure(handlers::raffle_config)
                        .configure(handlers::purchase_config),
                ),
        )
        .await
    };
}

macro_rules! create_raffle {
    ($app:expr, $token:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/rifas")
            .insert_header(("Authorization", format!("Bearer {}", $token)))
            .set_json($body)
            .to_request();
        let resp = test::call_service($app, req).await;
        assert!(resp.status().is_success(), "raffle creation failed");
        let body: Value = test::read_body_json(resp).await;
        body["data"]["id"].as_i64().expect("raffle id")
    }};
}

#[actix_web::test]
async fn test_login_success_and_failure() {
    let ctx = setup().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"]["token"].as_str().is_some());
    assert_eq!(body["data"]["user"]["email"], ADMIN_EMAIL);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({ "email": ADMIN_EMAIL, "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_auth_gate_status_codes() {
    let ctx = setup().await;
    let app = init_app!(ctx);

    let update = json!({
        "title": "t", "description": null,
        "price_cents": 1000, "total_numbers": 10
    });

    // No token at all.
    let req = test::TestRequest::put()
        .uri("/api/rifas/1")
        .set_json(update.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    // Garbage token.
    let req = test::TestRequest::put()
        .uri("/api/rifas/1")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .set_json(update.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    // Well-formed but expired (past the validator's leeway).
    let expired = JwtService::new(JWT_SECRET, -300)
        .generate_token(1, ADMIN_EMAIL)
        .unwrap();
    let req = test::TestRequest::put()
        .uri("/api/rifas/1")
        .insert_header(("Authorization", format!("Bearer {expired}")))
        .set_json(update)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_raffle_create_validation() {
    let ctx = setup().await;
    let app = init_app!(ctx);
    let token = ctx.admin_token();

    for bad in [
        json!({ "title": "r", "price_cents": 0, "total_numbers": 10 }),
        json!({ "title": "r", "price_cents": -100, "total_numbers": 10 }),
        json!({ "title": "r", "price_cents": 1000, "total_numbers": 0 }),
        json!({ "title": "  ", "price_cents": 1000, "total_numbers": 10 }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/rifas")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(bad)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}

#[actix_web::test]
async fn test_update_preserves_image_unless_replaced() {
    let ctx = setup().await;
    let app = init_app!(ctx);
    let token = ctx.admin_token();

    let id = create_raffle!(&app, &token, json!({
            "title": "With image", "price_cents": 500, "total_numbers": 50,
            "image_url": "/uploads/original.png"
        }));

    // Update without a new image keeps the stored one.
    let req = test::TestRequest::put()
        .uri(&format!("/api/rifas/{id}"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "title": "Renamed", "price_cents": 700, "total_numbers": 50
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/rifas/{id}"))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["title"], "Renamed");
    assert_eq!(body["data"]["price_cents"], 700);
    assert_eq!(body["data"]["image_url"], "/uploads/original.png");

    // Supplying a new image replaces it.
    let req = test::TestRequest::put()
        .uri(&format!("/api/rifas/{id}"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "title": "Renamed", "price_cents": 700, "total_numbers": 50,
            "image_url": "/uploads/new.png"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/rifas/{id}"))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["image_url"], "/uploads/new.png");
}

#[actix_web::test]
async fn test_soft_delete_hides_from_listing_but_keeps_detail() {
    let ctx = setup().await;
    let app = init_app!(ctx);
    let token = ctx.admin_token();

    let id = create_raffle!(&app, &token, json!({ "title": "Doomed", "price_cents": 100, "total_numbers": 10 }));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/rifas/{id}"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get().uri("/api/rifas").to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|r| r["id"].as_i64() != Some(id))
    );

    // Detail endpoint still serves the original data.
    let req = test::TestRequest::get()
        .uri(&format!("/api/rifas/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["title"], "Doomed");
    assert_eq!(body["data"]["status"], "deleted");
}

#[actix_web::test]
async fn test_purchase_lifecycle_scenario() {
    let ctx = setup().await;
    let app = init_app!(ctx);
    let token = ctx.admin_token();

    let rifa_id = create_raffle!(&app, &token, json!({ "title": "Scenario", "price_cents": 1000, "total_numbers": 100 }));

    let buyer = |numbers: Value| {
        json!({
            "rifa_id": rifa_id, "numbers": numbers,
            "buyer_name": "Maria", "buyer_phone": "+5511999999999",
            "buyer_email": "maria@example.com"
        })
    };

    // A reserves {1,2,3}: exact total, pending.
    let req = test::TestRequest::post()
        .uri("/api/purchase")
        .set_json(buyer(json!([1, 2, 3])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let purchase_a = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["total_amount_cents"], 3000);

    // Nothing is sold yet, so B overlapping a pending purchase succeeds.
    let req = test::TestRequest::post()
        .uri("/api/purchase")
        .set_json(buyer(json!([3, 4])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let purchase_b = body["data"]["id"].as_i64().unwrap();

    // Confirm A.
    let req = test::TestRequest::put()
        .uri(&format!("/api/purchases/{purchase_a}/status"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "status": "confirmed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // Sold numbers now reflect A only.
    let req = test::TestRequest::get()
        .uri(&format!("/api/rifas/{rifa_id}"))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["sold_numbers"], json!([1, 2, 3]));

    // C reserving {3} conflicts with exactly [3] and persists nothing.
    let req = test::TestRequest::post()
        .uri("/api/purchase")
        .set_json(buyer(json!([3])))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "NUMBERS_UNAVAILABLE");
    assert_eq!(body["error"]["unavailable"], json!([3]));

    // Confirming B must now fail the same way: 3 is already sold.
    let req = test::TestRequest::put()
        .uri(&format!("/api/purchases/{purchase_b}/status"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "status": "confirmed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["unavailable"], json!([3]));

    // Only A and B exist in the ledger; the conflicting C was not persisted.
    let req = test::TestRequest::get()
        .uri("/api/purchases")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let purchases = body["data"].as_array().unwrap();
    assert_eq!(purchases.len(), 2);
    // Newest first.
    assert_eq!(purchases[0]["id"].as_i64(), Some(purchase_b));
    assert_eq!(purchases[0]["rifa_title"], "Scenario");
    assert_eq!(purchases[0]["numbers"], json!([3, 4]));
    assert_eq!(purchases[1]["status"], "confirmed");
}

#[actix_web::test]
async fn test_status_transitions_are_forward_only() {
    let ctx = setup().await;
    let app = init_app!(ctx);
    let token = ctx.admin_token();

    let rifa_id = create_raffle!(&app, &token, json!({ "title": "Lifecycle", "price_cents": 100, "total_numbers": 10 }));

    let req = test::TestRequest::post()
        .uri("/api/purchase")
        .set_json(json!({
            "rifa_id": rifa_id, "numbers": [1],
            "buyer_name": "Jo", "buyer_phone": "1", "buyer_email": "jo@example.com"
        }))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let set_status = |status: &str| {
        test::TestRequest::put()
            .uri(&format!("/api/purchases/{id}/status"))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({ "status": status }))
            .to_request()
    };

    // Back to pending is never allowed.
    let resp = test::call_service(&app, set_status("pending")).await;
    assert_eq!(resp.status(), 400);

    let resp = test::call_service(&app, set_status("confirmed")).await;
    assert_eq!(resp.status(), 200);

    // Confirmed is terminal.
    let resp = test::call_service(&app, set_status("rejected")).await;
    assert_eq!(resp.status(), 400);

    // Unknown purchase.
    let req = test::TestRequest::put()
        .uri("/api/purchases/9999/status")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "status": "rejected" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_rejected_purchase_frees_its_numbers() {
    let ctx = setup().await;
    let app = init_app!(ctx);
    let token = ctx.admin_token();

    let rifa_id = create_raffle!(&app, &token, json!({ "title": "Second chance", "price_cents": 100, "total_numbers": 10 }));

    let reserve = |numbers: Value| {
        test::TestRequest::post()
            .uri("/api/purchase")
            .set_json(json!({
                "rifa_id": rifa_id, "numbers": numbers,
                "buyer_name": "Jo", "buyer_phone": "1", "buyer_email": "jo@example.com"
            }))
            .to_request()
    };

    let body: Value = test::read_body_json(test::call_service(&app, reserve(json!([5]))).await).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/purchases/{id}/status"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "status": "rejected" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    // Rejected numbers are not sold; a new reservation and confirmation work.
    let body: Value = test::read_body_json(test::call_service(&app, reserve(json!([5]))).await).await;
    let second = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/purchases/{second}/status"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "status": "confirmed" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/rifas/{rifa_id}"))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["sold_numbers"], json!([5]));
}

#[actix_web::test]
async fn test_purchase_validation_errors() {
    let ctx = setup().await;
    let app = init_app!(ctx);
    let token = ctx.admin_token();

    let rifa_id = create_raffle!(&app, &token, json!({ "title": "Strict", "price_cents": 100, "total_numbers": 10 }));

    let purchase = |rifa: i64, numbers: Value| {
        test::TestRequest::post()
            .uri("/api/purchase")
            .set_json(json!({
                "rifa_id": rifa, "numbers": numbers,
                "buyer_name": "Jo", "buyer_phone": "1", "buyer_email": "jo@example.com"
            }))
            .to_request()
    };

    // Empty set, non-positive, duplicates, out of range.
    for bad in [json!([]), json!([0]), json!([-1]), json!([2, 2]), json!([11])] {
        let resp = test::call_service(&app, purchase(rifa_id, bad)).await;
        assert_eq!(resp.status(), 400);
    }

    // Unknown raffle.
    let resp = test::call_service(&app, purchase(9999, json!([1]))).await;
    assert_eq!(resp.status(), 404);

    // Missing buyer contact.
    let req = test::TestRequest::post()
        .uri("/api/purchase")
        .set_json(json!({
            "rifa_id": rifa_id, "numbers": [1],
            "buyer_name": "", "buyer_phone": "1", "buyer_email": "jo@example.com"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn test_settings_roundtrip_and_auth() {
    let ctx = setup().await;
    let app = init_app!(ctx);
    let token = ctx.admin_token();

    // Seeded defaults are publicly readable.
    let req = test::TestRequest::get().uri("/api/settings").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["site_title"], "Sistema de Rifas");

    // Writing requires a token.
    let update = json!({ "site_title": "Minha Rifa", "pix_key": "abc-123" });
    let req = test::TestRequest::put()
        .uri("/api/settings")
        .set_json(update.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::put()
        .uri("/api/settings")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(update)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get().uri("/api/settings").to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["site_title"], "Minha Rifa");
    assert_eq!(body["data"]["pix_key"], "abc-123");
    // Untouched keys survive the batch.
    assert_eq!(body["data"]["primary_color"], "#3b82f6");
}

#[actix_web::test]
async fn test_concurrent_confirms_serialize_and_report_the_overlap() {
    // File-backed pool with several connections, built the way the binary
    // builds it, so the two confirms really race on separate connections.
    let db_path = std::env::temp_dir().join(format!(
        "rifas-test-{}.db",
        uuid::Uuid::new_v4().simple()
    ));
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", db_path.display()),
        max_connections: 4,
    };
    let pool = create_pool(&config).await.expect("file-backed pool");
    run_migrations(&pool).await.expect("migrations");

    let raffles = RaffleService::new(pool.clone());
    let purchases = PurchaseService::new(pool.clone());

    let rifa_id = raffles
        .create(CreateRaffleRequest {
            title: "Race".to_string(),
            description: None,
            price_cents: 100,
            total_numbers: 10,
            image_url: None,
        })
        .await
        .expect("raffle");

    let reserve = |numbers: Vec<i64>| CreatePurchaseRequest {
        rifa_id,
        numbers,
        buyer_name: "Jo".to_string(),
        buyer_phone: "1".to_string(),
        buyer_email: "jo@example.com".to_string(),
    };
    let a = purchases
        .create_purchase(reserve(vec![1, 2, 3]))
        .await
        .expect("reserve a")
        .id;
    let b = purchases
        .create_purchase(reserve(vec![3, 4]))
        .await
        .expect("reserve b")
        .id;

    // Whichever confirm wins, the other must get the overlapping numbers
    // back, never a raw database error.
    let (result_a, result_b) = tokio::join!(
        purchases.set_status(a, PurchaseStatus::Confirmed),
        purchases.set_status(b, PurchaseStatus::Confirmed),
    );
    let (winner, loss) = match (result_a, result_b) {
        (Ok(()), Err(e)) => (a, e),
        (Err(e), Ok(())) => (b, e),
        other => panic!("expected exactly one confirm to win, got {other:?}"),
    };
    assert!(
        matches!(&loss, AppError::NumbersUnavailable(n) if n.as_slice() == [3]),
        "loser should see the overlapping number, got {loss:?}"
    );

    // Number 3 is confirmed exactly once, by the winner.
    let owners: Vec<(i64,)> = sqlx::query_as(
        "SELECT purchase_id FROM purchase_numbers
         WHERE rifa_id = ? AND number = 3 AND state = 'confirmed'",
    )
    .bind(rifa_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(owners, vec![(winner,)]);

    pool.close().await;
    let _ = std::fs::remove_file(&db_path);
}

#[actix_web::test]
async fn test_pool_enforces_foreign_keys() {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    let pool = create_pool(&config).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");

    // A number row pointing at a purchase that does not exist must be
    // rejected by the schema, not just by the service layer.
    let orphan = sqlx::query(
        "INSERT INTO purchase_numbers (purchase_id, rifa_id, number) VALUES (999, 999, 1)",
    )
    .execute(&pool)
    .await;
    assert!(orphan.is_err());
}

#[actix_web::test]
async fn test_sold_numbers_stay_within_range() {
    let ctx = setup().await;
    let app = init_app!(ctx);
    let token = ctx.admin_token();

    let rifa_id = create_raffle!(&app, &token, json!({ "title": "Bounds", "price_cents": 100, "total_numbers": 5 }));

    let req = test::TestRequest::post()
        .uri("/api/purchase")
        .set_json(json!({
            "rifa_id": rifa_id, "numbers": [1, 5],
            "buyer_name": "Jo", "buyer_phone": "1", "buyer_email": "jo@example.com"
        }))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/purchases/{id}/status"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "status": "confirmed" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/rifas/{rifa_id}"))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let total = body["data"]["total_numbers"].as_i64().unwrap();
    let sold = body["data"]["sold_numbers"].as_array().unwrap();
    assert!(
        sold.iter()
            .all(|n| (1..=total).contains(&n.as_i64().unwrap()))
    );
}
