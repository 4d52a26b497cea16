// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here sits behind `middleware::require_user`, which resolves the
// token to a stored user and injects `CurrentUser` before the handler runs.

pub mod notes;

/*
OWNERSHIP MODEL:

Notes carry a single owner_id. Every by-id operation first loads the note and
compares owner_id with the caller; a note that exists but belongs to someone
else is reported exactly like a missing one (404 "Note not found"), so callers
cannot probe for other users' note ids. Updates and deletes are additionally
filtered on (note_id, owner_id) at the store.
*/
