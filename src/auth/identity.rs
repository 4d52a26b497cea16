use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use thiserror::Error;

use super::token::{TokenError, TokenService};
use crate::database::{StoreError, User, UserStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("{0}")]
    MalformedHeader(&'static str),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token subject no longer exists")]
    UnknownUser,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::ExpiredToken => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        }
    }
}

/// Resolves the caller of a request to a stored `User`.
#[derive(Clone)]
pub struct IdentityResolver {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
}

impl IdentityResolver {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    /// Bearer token → verified subject → user record (one read-only lookup)
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<User, AuthError> {
        let token = extract_bearer(headers)?;
        let email = self.tokens.verify(token)?;

        match self.users.find_user_by_email(&email).await? {
            Some(user) => Ok(user),
            None => {
                tracing::warn!("Valid token presented for unknown user '{}'", email);
                Err(AuthError::UnknownUser)
            }
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::MalformedHeader("Invalid Authorization header format"))?;

    let (scheme, token) = auth_str
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader("Authorization header must use Bearer token format"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader(
            "Authorization header must use Bearer token format",
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader("Empty bearer token"));
    }

    Ok(token)
}
