// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::extract::State;

use crate::app::AppState;
use crate::database::UserPublic;
use crate::extract::ValidJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::RegisterRequest;

/// POST /api/auth/register - Register new user account
///
/// Expected Input:
/// ```json
/// {
///   "user_name": "alice",
///   "user_email": "a@x.com",
///   "password": "pw1"
/// }
/// ```
///
/// Expected Output (201):
/// ```json
/// { "user_id": "…", "user_name": "alice", "user_email": "a@x.com" }
/// ```
///
/// Fails with 400 `EMAIL_CONFLICT` when the email is taken and 422
/// `VALIDATION_ERROR` for a malformed body or a password the policy rejects.
pub async fn register_post(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> ApiResult<UserPublic> {
    let user = state.accounts.register(request).await?;
    Ok(ApiResponse::created(user))
}
