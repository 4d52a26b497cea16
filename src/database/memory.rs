use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::{Note, NoteChanges, User};
use super::repository::{NoteStore, StoreError, StoreHealth, UserStore};

/// In-process store for local development and tests.
///
/// Users are keyed by email so the unique-email constraint is enforced under
/// the same write lock that performs the insert.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    notes: RwLock<HashMap<String, Note>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.user_email) {
            return Err(StoreError::Duplicate("users_user_email_key".to_string()));
        }
        if users.values().any(|u| u.user_id == user.user_id) {
            return Err(StoreError::Duplicate("users_pkey".to_string()));
        }
        users.insert(user.user_email.clone(), user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(email).cloned())
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn insert_note(&self, note: &Note) -> Result<(), StoreError> {
        let mut notes = self.notes.write().await;
        if notes.contains_key(&note.note_id) {
            return Err(StoreError::Duplicate("notes_pkey".to_string()));
        }
        notes.insert(note.note_id.clone(), note.clone());
        Ok(())
    }

    async fn find_note(&self, note_id: &str) -> Result<Option<Note>, StoreError> {
        Ok(self.notes.read().await.get(note_id).cloned())
    }

    async fn find_notes_by_owner(&self, owner_id: &str) -> Result<Vec<Note>, StoreError> {
        let notes = self.notes.read().await;
        let mut owned: Vec<Note> = notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_on.cmp(&b.created_on).then_with(|| a.note_id.cmp(&b.note_id)));
        Ok(owned)
    }

    async fn update_note(&self, changes: NoteChanges<'_>) -> Result<Option<Note>, StoreError> {
        let mut notes = self.notes.write().await;
        match notes.get_mut(changes.note_id) {
            Some(note) if note.owner_id == changes.owner_id => {
                note.note_title = changes.note_title.to_string();
                note.note_content = changes.note_content.to_string();
                note.last_update = changes.last_update;
                Ok(Some(note.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_note(&self, note_id: &str, owner_id: &str) -> Result<bool, StoreError> {
        let mut notes = self.notes.write().await;
        match notes.get(note_id) {
            Some(note) if note.owner_id == owner_id => {
                notes.remove(note_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
