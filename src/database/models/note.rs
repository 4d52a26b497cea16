use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub note_id: String,
    pub owner_id: String,
    pub note_title: String,
    pub note_content: String,
    pub created_on: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

/// Client-supplied note body for create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub note_title: String,
    pub note_content: String,
}

/// Owner-scoped replacement of a note's editable fields
#[derive(Debug, Clone)]
pub struct NoteChanges<'a> {
    pub note_id: &'a str,
    pub owner_id: &'a str,
    pub note_title: &'a str,
    pub note_content: &'a str,
    pub last_update: DateTime<Utc>,
}
