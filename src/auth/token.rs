use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Claims carried by an access token. `sub` is the user's email.
///
/// `iat` and `exp` are the registered whole-second claims; `exp_ns` is the
/// exact expiry instant in nanoseconds since the epoch and is the one checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub exp_ns: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Token lifetime out of range: {0} minutes")]
    InvalidTtl(u64),

    #[error("JWT generation error: {0}")]
    Generation(String),
}

/// Issues and verifies signed, time-limited bearer tokens.
///
/// Built once from `SecurityConfig` and shared read-only afterwards. A token
/// issued at `T` is accepted for every instant in `[T, T + ttl)`.
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(security: &SecurityConfig) -> Result<Self, TokenError> {
        if security.jwt_secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        let minutes = security.token_ttl_minutes;
        let ttl = i64::try_from(minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(TokenError::InvalidTtl(minutes))?;

        let secret = security.jwt_secret.as_bytes();
        Ok(Self {
            algorithm: security.jwt_algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Generation("expiry out of range".to_string()))?;
        let exp_ns = expires
            .timestamp_nanos_opt()
            .ok_or_else(|| TokenError::Generation("expiry out of range".to_string()))?;

        // Registered `exp` is rounded up so it never precedes the real expiry
        let exp = if expires.timestamp_subsec_nanos() > 0 {
            expires.timestamp() + 1
        } else {
            expires.timestamp()
        };

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp,
            exp_ns,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Verify a token and return its subject
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::InvalidToken);
        }

        // Expiry is checked below against the supplied clock, with no leeway
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                TokenError::InvalidToken
            })?
            .claims;

        // Past the representable range means past any expiry we could issue
        let now_ns = now.timestamp_nanos_opt().unwrap_or(i64::MAX);
        if now_ns >= claims.exp_ns {
            return Err(TokenError::ExpiredToken);
        }

        Ok(claims.sub)
    }
}
