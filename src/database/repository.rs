use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Note, NoteChanges, User};

/// Errors surfaced by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Credential store: user documents keyed by unique email.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Must fail with `StoreError::Duplicate` when the
    /// email is already taken, even under concurrent inserts.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

/// Note documents keyed by note id and tagged with an owner id.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert_note(&self, note: &Note) -> Result<(), StoreError>;

    async fn find_note(&self, note_id: &str) -> Result<Option<Note>, StoreError>;

    /// All notes owned by `owner_id`, oldest first
    async fn find_notes_by_owner(&self, owner_id: &str) -> Result<Vec<Note>, StoreError>;

    /// Replace title/content and `last_update` of the note matching both
    /// `note_id` and `owner_id`. Returns the updated note, or `None` when no
    /// document matched.
    async fn update_note(&self, changes: NoteChanges<'_>) -> Result<Option<Note>, StoreError>;

    /// Delete the note matching both ids. Returns whether a document was removed.
    async fn delete_note(&self, note_id: &str, owner_id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Store handles shared by the services
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub notes: Arc<dyn NoteStore>,
    pub health: Arc<dyn StoreHealth>,
}

impl Stores {
    /// Use one backend for every collection
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + NoteStore + StoreHealth + 'static,
    {
        Self {
            users: backend.clone(),
            notes: backend.clone(),
            health: backend,
        }
    }
}
