//! Service Configuration
//! Mission: Resolve runtime settings from the environment with safe defaults

use chrono::Duration;
use std::env;

/// Runtime settings for the HTTP service and its stores
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the API listens on
    pub bind_addr: String,
    /// SQLite database file holding users, sessions and assets
    pub db_path: String,
    /// Fixed session lifetime measured from login
    pub session_ttl: Duration,
    /// Interval between expired-session sweeps (0 disables the sweeper)
    pub sweep_interval_secs: u64,
    /// Upper bound for a single upload body
    pub max_upload_bytes: usize,
    /// bcrypt work factor for newly created users
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8443".to_string(),
            db_path: "asset_vault.db".to_string(),
            session_ttl: Duration::hours(24),
            sweep_interval_secs: 3600,
            max_upload_bytes: 10 * 1024 * 1024,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = env::var("BIND_ADDR") {
            if !v.trim().is_empty() {
                config.bind_addr = v;
            }
        }
        if let Ok(v) = env::var("DB_PATH") {
            if !v.trim().is_empty() {
                config.db_path = v;
            }
        }
        if let Some(hours) = parse_var::<i64>("SESSION_TTL_HOURS").filter(|&h| h > 0) {
            config.session_ttl = Duration::hours(hours);
        }
        if let Some(secs) = parse_var::<u64>("SESSION_SWEEP_SECS") {
            config.sweep_interval_secs = secs;
        }
        if let Some(bytes) = parse_var::<usize>("MAX_UPLOAD_BYTES").filter(|&b| b > 0) {
            config.max_upload_bytes = bytes;
        }
        if let Some(cost) = parse_var::<u32>("BCRYPT_COST") {
            config.bcrypt_cost = cost.clamp(4, 31);
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
