//! Expired Session Sweeper
//! Mission: Periodically delete session rows past their TTL
//!
//! Validation never deletes; stale rows are only removed here.

use crate::auth::AuthService;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Run one sweep and log the outcome
pub async fn sweep_once(auth: &AuthService) -> u64 {
    match auth.sweep_expired().await {
        Ok(removed) => {
            if removed > 0 {
                info!("🧹 Swept {} expired sessions", removed);
            }
            removed
        }
        Err(e) => {
            warn!("session sweep failed: {}", e);
            0
        }
    }
}

/// Spawn the sweeper loop. Returns `None` when `every_secs` is 0.
pub fn spawn_session_sweeper(auth: AuthService, every_secs: u64) -> Option<JoinHandle<()>> {
    if every_secs == 0 {
        info!("🧹 Session sweeper disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(every_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_once(&auth).await;
        }
    }))
}
