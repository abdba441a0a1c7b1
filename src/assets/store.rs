//! Asset Storage
//! Mission: Owner-scoped blob storage keyed by (owner, name)

use crate::db::{format_ts, parse_ts, Database};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored asset, including its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub owner_id: Uuid,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Listing entry (no data bytes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSummary {
    pub name: String,
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Every call is scoped by owner; there is no lookup by name alone.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `asset`, replacing an earlier asset of the same owner and name
    async fn put(&self, asset: &Asset) -> Result<()>;

    async fn get(&self, owner_id: Uuid, name: &str) -> Result<Option<Asset>>;

    async fn list(&self, owner_id: Uuid) -> Result<Vec<AssetSummary>>;

    /// Returns whether a row was removed
    async fn delete(&self, owner_id: Uuid, name: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct SqliteAssetStore {
    db: Database,
}

impl SqliteAssetStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn parse_owner(raw: &str, column: usize) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[async_trait]
impl AssetStore for SqliteAssetStore {
    async fn put(&self, asset: &Asset) -> Result<()> {
        let conn = self.db.lock().await;
        conn.execute(
            "INSERT INTO assets (name, uid, data, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (name, uid) DO UPDATE SET
                data = excluded.data,
                created_at = excluded.created_at",
            params![
                asset.name,
                asset.owner_id.to_string(),
                asset.data,
                format_ts(&asset.created_at),
            ],
        )
        .context("Failed to store asset")?;
        Ok(())
    }

    async fn get(&self, owner_id: Uuid, name: &str) -> Result<Option<Asset>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT name, uid, data, created_at FROM assets WHERE name = ?1 AND uid = ?2",
        )?;
        stmt.query_row(params![name, owner_id.to_string()], |row| {
            Ok(Asset {
                name: row.get(0)?,
                owner_id: parse_owner(&row.get::<_, String>(1)?, 1)?,
                data: row.get(2)?,
                created_at: parse_ts(&row.get::<_, String>(3)?)?,
            })
        })
        .optional()
        .context("Failed to load asset")
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<AssetSummary>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT name, uid, created_at FROM assets WHERE uid = ?1
             ORDER BY created_at ASC, name ASC",
        )?;
        let assets = stmt
            .query_map(params![owner_id.to_string()], |row| {
                Ok(AssetSummary {
                    name: row.get(0)?,
                    owner: parse_owner(&row.get::<_, String>(1)?, 1)?,
                    created_at: parse_ts(&row.get::<_, String>(2)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list assets")?;
        Ok(assets)
    }

    async fn delete(&self, owner_id: Uuid, name: &str) -> Result<bool> {
        let conn = self.db.lock().await;
        let removed = conn
            .execute(
                "DELETE FROM assets WHERE name = ?1 AND uid = ?2",
                params![name, owner_id.to_string()],
            )
            .context("Failed to delete asset")?;
        Ok(removed > 0)
    }
}
