//! Client-side session state for the estate marketplace.
//!
//! The session is the pairing of an opaque access credential with the role
//! the backend assigned at login. It is owned by a [`SessionStore`]; the HTTP
//! layer and the front-end only read or replace it through that interface.

mod cookie_store;
mod role;
mod session_store;

pub use cookie_store::CookieDotJson;
pub use cookie_store::clear_cookies;
pub use cookie_store::get_cookie_file;
pub use cookie_store::read_cookies;
pub use cookie_store::write_cookies;
pub use role::Role;
pub use session_store::FileSessionStore;
pub use session_store::InMemorySessionStore;
pub use session_store::Session;
pub use session_store::SessionDotJson;
pub use session_store::SessionStore;
pub use session_store::get_session_file;
pub use session_store::remove_local_state;
