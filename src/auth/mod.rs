pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Ten years. Longer lifetimes are clamped.
const MAX_EXPIRY_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Account id, as a decimal string.
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("expired token")]
    Expired,

    #[error("invalid subject")]
    InvalidSubject,

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Signing material built once from configuration and shared through state.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    expiry_hours: i64,
}

impl std::fmt::Debug for AuthKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthKeys")
            .field("issuer", &self.issuer)
            .field("expiry_hours", &self.expiry_hours)
            .finish_non_exhaustive()
    }
}

impl AuthKeys {
    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        if security.auth_key.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        let secret = security.auth_key.as_bytes();
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: security.jwt_issuer.clone(),
            expiry_hours: i64::try_from(security.jwt_expiry_hours)
                .unwrap_or(MAX_EXPIRY_HOURS)
                .min(MAX_EXPIRY_HOURS),
        })
    }

    pub fn claims_for(&self, uid: i32) -> Claims {
        let now = Utc::now();
        Claims {
            sub: uid.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        }
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Issues a session token for `uid`.
    pub fn issue(&self, uid: i32) -> Result<String, JwtError> {
        self.sign(&self.claims_for(uid))
    }

    /// Checks the signature, then expiry against the current clock.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is checked below without leeway
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;
        if data.claims.exp < Utc::now().timestamp() {
            return Err(JwtError::Expired);
        }
        Ok(data.claims)
    }
}

impl Claims {
    pub fn uid(&self) -> Result<i32, JwtError> {
        self.sub.parse().map_err(|_| JwtError::InvalidSubject)
    }
}
