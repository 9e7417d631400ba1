use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::ApiError;
use crate::policy::Caller;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(username: String, is_admin: bool, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: username,
            is_admin,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn caller(&self) -> Caller {
        if self.is_admin {
            Caller::Admin(self.sub.clone())
        } else {
            Caller::User(self.sub.clone())
        }
    }
}

/// Sign a token for the given identity with an explicit secret.
pub fn sign_token(claims: &Claims, secret: &str) -> Result<String, ApiError> {
    if secret.is_empty() {
        return Err(ApiError::internal_server_error("JWT secret not configured"));
    }
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("JWT generation failed: {}", e);
        ApiError::internal_server_error("Failed to generate token")
    })
}

/// Verify a token and return its claims with an explicit secret.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    if secret.is_empty() {
        return Err(ApiError::internal_server_error("JWT secret not configured"));
    }
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;
    Ok(token_data.claims)
}

/// Mint a token for a username/role pair using the configured secret.
pub fn create_token(username: &str, is_admin: bool) -> Result<String, ApiError> {
    let security = &config::config().security;
    let claims = Claims::new(username.to_string(), is_admin, security.jwt_expiry_hours);
    sign_token(&claims, &security.jwt_secret)
}

/// Hash a password for storage (argon2, salted).
pub fn hash_password(password: &str) -> String {
    password_auth::generate_hash(password)
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    password_auth::verify_password(password, hash).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_claims() {
        let claims = Claims::new("u1".to_string(), false, 1);
        let token = sign_token(&claims, "test-secret").unwrap();
        let decoded = verify_token(&token, "test-secret").unwrap();
        assert_eq!(decoded.sub, "u1");
        assert!(!decoded.is_admin);
        assert_eq!(decoded.caller(), Caller::User("u1".to_string()));
    }

    #[test]
    fn admin_claims_produce_admin_caller() {
        let claims = Claims::new("admin".to_string(), true, 1);
        assert_eq!(claims.caller(), Caller::Admin("admin".to_string()));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::new("u1".to_string(), false, 1);
        let token = sign_token(&claims, "test-secret").unwrap();
        let err = verify_token(&token, "other-secret").unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn empty_secret_is_a_server_error() {
        let claims = Claims::new("u1".to_string(), false, 1);
        assert_eq!(sign_token(&claims, "").unwrap_err().status_code(), 500);
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("password1");
        assert_ne!(hash, "password1");
        assert!(verify_password("password1", &hash));
        assert!(!verify_password("password2", &hash));
    }
}
