// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition endpoints that do not require authentication.

pub mod login;    // POST /api/auth/login - authenticate and get JWT
pub mod register; // POST /api/auth/register - create new account

pub use login::login_post;
pub use register::register_post;

/*
AUTHENTICATION FLOW:

1. **Register**: POST /api/auth/register
   - Input: JSON { user_name, user_email, password }
   - Password is hashed before anything is stored
   - Returns: public user view (no password hash)

2. **Login**: POST /api/auth/login
   - Input: form { username (the email), password }
   - Returns: { access_token, token_type: "bearer" }
   - The token subject is the user's email; send it back as
     `Authorization: Bearer <token>` on the /api/notes routes
*/
