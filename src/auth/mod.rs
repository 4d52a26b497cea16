//! Authentication core: password hashing, bearer token issue/verify, and
//! per-request identity resolution.

pub mod identity;
pub mod password;
pub mod token;

pub use identity::{extract_bearer, AuthError, IdentityResolver};
pub use password::{PasswordError, PasswordHasher, PasswordPolicy};
pub use token::{Claims, TokenError, TokenService};
