use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecurityError {
    #[error("Hash error: {0}")]
    Hash(String),
    #[error("Token creation failed: {0}")]
    TokenCreation(String),
    #[error("Token validation failed: {0}")]
    TokenValidation(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, SecurityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| SecurityError::Hash(err.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, SecurityError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|err| SecurityError::Hash(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn generate_token(
    secret: &str,
    staff_id: i32,
    role: &str,
    ttl_seconds: i64,
) -> Result<String, SecurityError> {
    let now = Utc::now();
    let claims = Claims {
        sub: staff_id,
        role: role.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| SecurityError::TokenCreation(err.to_string()))
}

pub fn validate_token(secret: &str, token: &str) -> Result<Claims, SecurityError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|err| SecurityError::TokenValidation(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("same input").unwrap();
        let second = hash_password("same input").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let token = generate_token("secret", 42, "cashier", 3600).unwrap();
        let claims = validate_token("secret", &token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "cashier");
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = generate_token("secret", 42, "cashier", 3600).unwrap();
        assert!(validate_token("other-secret", &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = generate_token("secret", 42, "cashier", -120).unwrap();
        assert!(validate_token("secret", &token).is_err());
    }
}
