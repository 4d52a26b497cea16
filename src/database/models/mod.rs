pub mod note;
pub mod user;

pub use note::{Note, NoteChanges, NoteDraft};
pub use user::{User, UserPublic};
