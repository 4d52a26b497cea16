pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use models::{Note, NoteChanges, NoteDraft, User, UserPublic};
pub use postgres::PgStore;
pub use repository::{NoteStore, StoreError, StoreHealth, Stores, UserStore};
