use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{Note, NoteChanges, User};
use super::repository::{NoteStore, StoreError, StoreHealth, UserStore};

const USER_COLUMNS: &str = "user_id, user_name, user_email, hashed_password";
const NOTE_COLUMNS: &str = "note_id, owner_id, note_title, note_content, created_on, last_update";

/// PostgreSQL-backed store. Expects the schema created by
/// `DatabaseManager::migrate`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map unique-constraint violations to `Duplicate`, keep everything else
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return StoreError::Duplicate(constraint);
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (user_id, user_name, user_email, hashed_password)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&user.user_id)
        .bind(&user.user_name)
        .bind(&user.user_email)
        .bind(&user.hashed_password)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE user_email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl NoteStore for PgStore {
    async fn insert_note(&self, note: &Note) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO notes (note_id, owner_id, note_title, note_content, created_on, last_update)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&note.note_id)
        .bind(&note.owner_id)
        .bind(&note.note_title)
        .bind(&note.note_content)
        .bind(note.created_on)
        .bind(note.last_update)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn find_note(&self, note_id: &str) -> Result<Option<Note>, StoreError> {
        let query = format!("SELECT {} FROM notes WHERE note_id = $1", NOTE_COLUMNS);
        let note = sqlx::query_as::<_, Note>(&query)
            .bind(note_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(note)
    }

    async fn find_notes_by_owner(&self, owner_id: &str) -> Result<Vec<Note>, StoreError> {
        let query = format!(
            "SELECT {} FROM notes WHERE owner_id = $1 ORDER BY created_on, note_id",
            NOTE_COLUMNS
        );
        let notes = sqlx::query_as::<_, Note>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(notes)
    }

    async fn update_note(&self, changes: NoteChanges<'_>) -> Result<Option<Note>, StoreError> {
        let query = format!(
            "UPDATE notes SET note_title = $3, note_content = $4, last_update = $5
             WHERE note_id = $1 AND owner_id = $2
             RETURNING {}",
            NOTE_COLUMNS
        );
        let note = sqlx::query_as::<_, Note>(&query)
            .bind(changes.note_id)
            .bind(changes.owner_id)
            .bind(changes.note_title)
            .bind(changes.note_content)
            .bind(changes.last_update)
            .fetch_optional(&self.pool)
            .await?;

        Ok(note)
    }

    async fn delete_note(&self, note_id: &str, owner_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE note_id = $1 AND owner_id = $2")
            .bind(note_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
