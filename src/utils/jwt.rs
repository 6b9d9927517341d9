use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

/// Stateless HS256 tokens against a shared secret. No revocation list and no
/// refresh flow; expired tokens simply fail verification.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expires_in: expires_in,
        }
    }

    pub fn generate_token(&self, user_id: i64, email: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.token_expires_in);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn get_token_expires_in(&self) -> i64 {
        self.token_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let service = JwtService::new("test-secret", 3600);
        let token = service.generate_token(1, "admin@rifas.com").unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.email, "admin@rifas.com");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Negative expiry puts `exp` in the past.
        let service = JwtService::new("test-secret", -120);
        let token = service.generate_token(1, "admin@rifas.com").unwrap();

        assert!(service.verify_token(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let service = JwtService::new("test-secret", 3600);
        let other = JwtService::new("other-secret", 3600);
        let token = service.generate_token(1, "admin@rifas.com").unwrap();

        assert!(other.verify_token(&token).is_err());
    }
}
