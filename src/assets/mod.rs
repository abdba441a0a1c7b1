//! Asset Module
//! Mission: Owner-scoped binary storage behind session auth

pub mod api;
pub mod store;

pub use store::{Asset, AssetStore, AssetSummary, SqliteAssetStore};
