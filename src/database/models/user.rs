use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored user record. Carries the password hash, so it is never serialized
/// to clients; use `UserPublic` for responses.
#[derive(Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub hashed_password: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("user_id", &self.user_id)
            .field("user_name", &self.user_name)
            .field("user_email", &self.user_email)
            .field("hashed_password", &"<redacted>")
            .finish()
    }
}

/// Client-facing view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPublic {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            user_name: user.user_name,
            user_email: user.user_email,
        }
    }
}
