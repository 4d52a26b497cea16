use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::database::{Note, NoteChanges, NoteDraft, NoteStore, StoreError, User};

#[derive(Debug, Error)]
pub enum NoteError {
    /// Missing, or owned by someone else. The two are deliberately not told apart.
    #[error("Note not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Owner-scoped note CRUD
#[derive(Clone)]
pub struct NoteService {
    notes: Arc<dyn NoteStore>,
}

impl NoteService {
    pub fn new(notes: Arc<dyn NoteStore>) -> Self {
        Self { notes }
    }

    pub async fn create(&self, owner: &User, draft: NoteDraft) -> Result<Note, NoteError> {
        let now = now();
        let note = Note {
            note_id: Uuid::new_v4().to_string(),
            owner_id: owner.user_id.clone(),
            note_title: draft.note_title,
            note_content: draft.note_content,
            created_on: now,
            last_update: now,
        };

        self.notes.insert_note(&note).await?;
        tracing::debug!("User {} created note {}", owner.user_id, note.note_id);
        Ok(note)
    }

    pub async fn list(&self, owner: &User) -> Result<Vec<Note>, NoteError> {
        Ok(self.notes.find_notes_by_owner(&owner.user_id).await?)
    }

    pub async fn get(&self, owner: &User, note_id: &str) -> Result<Note, NoteError> {
        self.owned(owner, note_id).await
    }

    pub async fn update(&self, owner: &User, note_id: &str, draft: NoteDraft) -> Result<Note, NoteError> {
        let existing = self.owned(owner, note_id).await?;

        let changes = NoteChanges {
            note_id,
            owner_id: &owner.user_id,
            note_title: &draft.note_title,
            note_content: &draft.note_content,
            last_update: next_update_time(existing.last_update),
        };

        // None here means the note vanished between the lookup and the write
        let updated = self.notes.update_note(changes).await?.ok_or(NoteError::NotFound)?;
        tracing::debug!("User {} updated note {}", owner.user_id, note_id);
        Ok(updated)
    }

    pub async fn delete(&self, owner: &User, note_id: &str) -> Result<(), NoteError> {
        self.owned(owner, note_id).await?;

        if !self.notes.delete_note(note_id, &owner.user_id).await? {
            return Err(NoteError::NotFound);
        }
        tracing::debug!("User {} deleted note {}", owner.user_id, note_id);
        Ok(())
    }

    /// Ownership guard shared by every by-id operation
    async fn owned(&self, owner: &User, note_id: &str) -> Result<Note, NoteError> {
        match self.notes.find_note(note_id).await? {
            Some(note) if note.owner_id == owner.user_id => Ok(note),
            Some(_) => {
                tracing::debug!("User {} asked for note {} owned by another user", owner.user_id, note_id);
                Err(NoteError::NotFound)
            }
            None => Err(NoteError::NotFound),
        }
    }
}

/// Current time at microsecond precision, the finest PostgreSQL keeps
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Strictly later than `previous`, even if the clock has not advanced
fn next_update_time(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
