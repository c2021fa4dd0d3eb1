pub mod auth;

pub use auth::{authenticate, authorize, require_admin, AuthUser};
