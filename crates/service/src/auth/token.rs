use std::time::Duration;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::errors::AuthError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    username: String,
    exp: usize,
}

/// HS256 session tokens carrying the caller's username.
///
/// Expiry is stamped from system time since that is what verification
/// checks against.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sign(&self, username: &str) -> Result<String, AuthError> {
        let ttl = chrono::Duration::from_std(self.ttl).map_err(|e| AuthError::TokenError(e.to_string()))?;
        let exp = (chrono::Utc::now() + ttl).timestamp() as usize;
        let claims = Claims { username: username.to_string(), exp };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Username carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::Unauthorized)?;
        Ok(data.claims.username)
    }
}
