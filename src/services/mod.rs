pub mod account_service;
pub mod note_service;

pub use account_service::{AccessToken, AccountError, AccountService, RegisterRequest};
pub use note_service::{NoteError, NoteService};
