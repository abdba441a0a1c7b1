//! Authentication Module
//! Mission: Session-based login with a single active session per user

pub mod api;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

pub use middleware::require_session;
pub use models::{Session, User};
pub use password::PasswordHasher;
pub use service::{AuthError, AuthService};
pub use store::{CredentialStore, SessionStore, SqliteAuthStore};
