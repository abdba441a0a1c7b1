//! Asset Vault Library
//!
//! Session-authenticated, owner-scoped binary asset storage over HTTP.
//! Exposes the modules used by the `asset-vault` binary and the integration tests.

pub mod api;
pub mod assets;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod sweep;

pub use api::{router, AppState};
pub use config::Config;
