//! Session Authentication Service
//! Mission: Log users in, validate bearer tokens, keep one live session per user
//!
//! No state is cached here: every login reads the credential store and every
//! validation reads the session store.

use crate::auth::{
    models::{Session, User},
    password::PasswordHasher,
    store::{CredentialStore, SessionStore},
    token::generate_token,
};
use crate::clock::{Clock, SystemClock};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Default session lifetime
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown login or wrong password; callers cannot tell which
    #[error("invalid login/password")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("session expired")]
    SessionExpired,

    #[error("login must not be empty")]
    EmptyLogin,

    #[error("store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: Arc<PasswordHasher>,
    clock: Arc<dyn Clock>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<PasswordHasher>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            hasher,
            clock: Arc::new(SystemClock),
            session_ttl: Duration::hours(SESSION_TTL_HOURS),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Authenticate `login`/`password` and open a fresh session, dropping
    /// every earlier session of the same user.
    pub async fn login(
        &self,
        login: &str,
        password: &str,
        client_ip: &str,
    ) -> Result<String, AuthError> {
        let user = self.credentials.find_by_login(login).await?;

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let valid = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => {
                hasher.verify_decoy(&password);
                false
            }
        })
        .await
        .context("password verification task failed")?;

        let user = match user {
            Some(user) if valid => user,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let session = Session {
            token: generate_token()?,
            owner_id: user.id,
            client_ip: client_ip.to_string(),
            created_at: self.clock.now(),
        };
        self.sessions.replace_for_owner(&session).await?;

        info!(user = %user.id, login = %user.login, client_ip, "🔐 Session opened");
        Ok(session.token)
    }

    /// Resolve a bearer token to its session. Read-only: expired rows are
    /// left for the sweeper.
    pub async fn validate_token(&self, token: &str) -> Result<Session, AuthError> {
        let session = self
            .sessions
            .find(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if session.age(self.clock.now()) > self.session_ttl {
            return Err(AuthError::SessionExpired);
        }

        debug!(user = %session.owner_id, "Validated session");
        Ok(session)
    }

    /// Delete every session already past the TTL
    pub async fn sweep_expired(&self) -> Result<u64, AuthError> {
        let cutoff = self.expiry_cutoff(self.clock.now());
        Ok(self.sessions.delete_created_before(cutoff).await?)
    }

    fn expiry_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.session_ttl
    }

    /// Provision an account. Only reachable from the admin CLI.
    pub async fn create_user(&self, login: &str, password: &str) -> Result<User, AuthError> {
        let login = login.trim();
        if login.is_empty() {
            return Err(AuthError::EmptyLogin);
        }

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("password hashing task failed")??;

        let user = User {
            id: Uuid::new_v4(),
            login: login.to_string(),
            password_hash,
            created_at: self.clock.now(),
        };
        self.credentials.create_user(&user).await?;
        Ok(user)
    }
}
