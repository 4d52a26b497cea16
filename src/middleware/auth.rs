use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::database::User;
use crate::error::ApiError;

/// Authenticated caller, injected into request extensions by `require_user`
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Resolve the bearer token to a stored user before the handler runs.
/// Any failure ends the request with 401.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state
        .identity
        .resolve(request.headers())
        .await
        .map_err(|e| {
            tracing::debug!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
            ApiError::from(e)
        })?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
