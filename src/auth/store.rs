//! Credential & Session Storage
//! Mission: Persist users and the single active session per user in SQLite

use crate::auth::models::{Session, User};
use crate::db::{format_ts, parse_ts, Database};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Read access to user records, plus the admin-only insert
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>>;

    async fn create_user(&self, user: &User) -> Result<()>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find(&self, token: &str) -> Result<Option<Session>>;

    /// Delete every session of `session.owner_id`, then insert `session`.
    /// The delete must be visible before the insert lands.
    async fn replace_for_owner(&self, session: &Session) -> Result<()>;

    /// Remove sessions created before `cutoff`. Returns rows removed.
    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// SQLite implementation of both auth stores
#[derive(Clone)]
pub struct SqliteAuthStore {
    db: Database,
}

impl SqliteAuthStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(User {
        id,
        login: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_ts(&row.get::<_, String>(3)?)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let owner: String = row.get(1)?;
    let owner_id = Uuid::parse_str(&owner).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Session {
        token: row.get(0)?,
        owner_id,
        client_ip: row.get(2)?,
        created_at: parse_ts(&row.get::<_, String>(3)?)?,
    })
}

#[async_trait]
impl CredentialStore for SqliteAuthStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, login, password_hash, created_at FROM users WHERE login = ?1",
        )?;
        stmt.query_row(params![login], user_from_row)
            .optional()
            .context("Failed to look up user by login")
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        let conn = self.db.lock().await;
        conn.execute(
            "INSERT INTO users (id, login, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id.to_string(),
                user.login,
                user.password_hash,
                format_ts(&user.created_at),
            ],
        )
        .context("Failed to insert user")?;

        info!("✅ Created user: {} ({})", user.login, user.id);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteAuthStore {
    async fn find(&self, token: &str) -> Result<Option<Session>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, uid, ip_address, created_at FROM sessions WHERE id = ?1",
        )?;
        stmt.query_row(params![token], session_from_row)
            .optional()
            .context("Failed to look up session")
    }

    async fn replace_for_owner(&self, session: &Session) -> Result<()> {
        let mut conn = self.db.lock().await;
        let tx = conn.transaction().context("Failed to open session transaction")?;

        let removed = tx
            .execute(
                "DELETE FROM sessions WHERE uid = ?1",
                params![session.owner_id.to_string()],
            )
            .context("Failed to clear previous sessions")?;

        tx.execute(
            "INSERT INTO sessions (id, uid, ip_address, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token,
                session.owner_id.to_string(),
                session.client_ip,
                format_ts(&session.created_at),
            ],
        )
        .context("Failed to insert session")?;

        tx.commit().context("Failed to commit session replace")?;

        debug!(
            owner = %session.owner_id,
            replaced = removed,
            "Session replaced"
        );
        Ok(())
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let conn = self.db.lock().await;
        let removed = conn
            .execute(
                "DELETE FROM sessions WHERE created_at < ?1",
                params![format_ts(&cutoff)],
            )
            .context("Failed to delete expired sessions")?;
        Ok(removed as u64)
    }
}
