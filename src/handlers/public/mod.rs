// handlers/public/mod.rs - Public handlers (no authentication)

pub mod auth;
pub mod status;

pub use status::{health, welcome};
