use axum::extract::{Extension, Path, State};

use crate::app::AppState;
use crate::database::{Note, NoteDraft};
use crate::extract::ValidJson;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/notes/:note_id
pub async fn get(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(note_id): Path<String>,
) -> ApiResult<Note> {
    let note = state.notes.get(&user, &note_id).await?;
    Ok(ApiResponse::success(note))
}

/// PUT /api/notes/:note_id - Replace title and content
pub async fn put(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(note_id): Path<String>,
    ValidJson(draft): ValidJson<NoteDraft>,
) -> ApiResult<Note> {
    let note = state.notes.update(&user, &note_id, draft).await?;
    Ok(ApiResponse::success(note))
}

/// DELETE /api/notes/:note_id
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(note_id): Path<String>,
) -> ApiResult<()> {
    state.notes.delete(&user, &note_id).await?;
    Ok(ApiResponse::no_content())
}
