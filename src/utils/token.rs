use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    error::{ErrorMessage, HttpError},
    models::usermodel::UserRole,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub iat: usize,
    pub exp: usize,
}

/// `expires_in` is in minutes.
pub fn create_token(
    user_id: &str,
    email: &str,
    role: UserRole,
    secret: &[u8],
    expires_in: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    if user_id.is_empty() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidSubject.into());
    }

    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::minutes(expires_in)).timestamp() as usize;
    let claims = TokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        iat,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

pub fn decode_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<TokenClaims, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    );

    match decoded {
        Ok(token) => Ok(token.claims),
        Err(_) => Err(HttpError::unauthorized(ErrorMessage::InvalidToken.to_string())),
    }
}

/// Issues a fresh token for the holder of a still-valid one.
pub fn refresh_token(token: &str, secret: &[u8], expires_in: i64) -> Result<String, HttpError> {
    let claims = decode_token(token, secret)?;

    create_token(&claims.sub, &claims.email, claims.role, secret, expires_in)
        .map_err(|e| HttpError::server_error(e.to_string()))
}

/// Seconds until the token expires, never negative.
pub fn remaining_lifetime(claims: &TokenClaims) -> u64 {
    let now = Utc::now().timestamp();
    (claims.exp as i64 - now).max(0) as u64
}

/// Redis key for a revoked token. The raw token is hashed so keys stay short.
pub fn blacklist_key(token: &str) -> String {
    format!("token_blacklist:{}", hex::encode(Sha256::digest(token.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"helpdesk-test-secret";

    #[test]
    fn create_and_decode_round_trip() {
        let token = create_token("user-1", "ada@example.com", UserRole::Agent, SECRET, 60).unwrap();
        let claims = decode_token(token, SECRET).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, UserRole::Agent);
        assert!(claims.exp > claims.iat);
        assert!(remaining_lifetime(&claims) > 0);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("user-1", "ada@example.com", UserRole::Customer, SECRET, 60).unwrap();
        let err = decode_token(token, b"another-secret").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn expired_token_is_rejected() {
        // well past the default 60s leeway
        let token = create_token("user-1", "ada@example.com", UserRole::Customer, SECRET, -10).unwrap();
        assert!(decode_token(token, SECRET).is_err());
    }

    #[test]
    fn empty_subject_is_refused() {
        assert!(create_token("", "ada@example.com", UserRole::Admin, SECRET, 60).is_err());
    }

    #[test]
    fn refresh_keeps_identity() {
        let token = create_token("user-9", "lin@example.com", UserRole::Admin, SECRET, 60).unwrap();
        let refreshed = refresh_token(&token, SECRET, 120).unwrap();
        let claims = decode_token(refreshed, SECRET).unwrap();

        assert_eq!(claims.sub, "user-9");
        assert_eq!(claims.role, UserRole::Admin);
        assert!(refresh_token("garbage", SECRET, 60).is_err());
    }

    #[test]
    fn blacklist_key_is_stable_and_opaque() {
        let key = blacklist_key("abc.def.ghi");
        assert_eq!(key, blacklist_key("abc.def.ghi"));
        assert!(key.starts_with("token_blacklist:"));
        assert!(!key.contains("abc.def.ghi"));
        assert_eq!(key.len(), "token_blacklist:".len() + 64);
    }
}
