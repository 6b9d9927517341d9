use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{JwtService, hash_password, verify_password};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: SqlitePool, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let user: Option<User> = sqlx::query_as(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = ?",
        )
        .bind(&request.email)
        .fetch_optional(&self.pool)
        .await?;

        // Same message for unknown email and wrong password.
        let user =
            user.ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }

        let token = self.jwt_service.generate_token(user.id, &user.email)?;

        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }

    /// Creates the admin account from configuration if it does not exist yet.
    /// Runs once at startup; an existing account is left untouched.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> AppResult<()> {
        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        if existing.is_some() {
            return Ok(());
        }

        let password_hash = hash_password(password)?;
        sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, ?)")
            .bind(email)
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;

        log::info!("Bootstrapped admin user {email}");
        Ok(())
    }
}
