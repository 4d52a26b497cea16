// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::extract::ValidForm;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::AccessToken;

/// OAuth2 password-grant style form. `username` carries the email; any other
/// form fields (grant_type, scope, ...) are ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// POST /api/auth/login - Authenticate and receive a bearer token
///
/// Expected Input (`application/x-www-form-urlencoded`):
/// `username=a%40x.com&password=pw1`
///
/// Expected Output (200):
/// ```json
/// { "access_token": "eyJhbGciOiJIUzI1NiI...", "token_type": "bearer" }
/// ```
///
/// Unknown email and wrong password both yield the same 401
/// `INVALID_CREDENTIALS` response.
pub async fn login_post(
    State(state): State<AppState>,
    ValidForm(form): ValidForm<LoginForm>,
) -> ApiResult<AccessToken> {
    let token = state.accounts.login(&form.username, &form.password).await?;
    Ok(ApiResponse::success(token))
}
