use axum::extract::{Extension, State};

use crate::app::AppState;
use crate::database::{Note, NoteDraft};
use crate::extract::ValidJson;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/notes/ - All notes owned by the caller
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<Note>> {
    let notes = state.notes.list(&user).await?;
    Ok(ApiResponse::success(notes))
}

/// POST /api/notes/ - Create a note owned by the caller
///
/// Expected Input:
/// ```json
/// { "note_title": "Groceries", "note_content": "milk, eggs" }
/// ```
pub async fn post(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidJson(draft): ValidJson<NoteDraft>,
) -> ApiResult<Note> {
    let note = state.notes.create(&user, draft).await?;
    Ok(ApiResponse::created(note))
}
