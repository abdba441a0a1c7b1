//! Asset Vault - authenticated file storage service
//! Mission: One live session per user, every asset scoped to its owner

use anyhow::{Context, Result};
use asset_vault::{
    api::{router, AppState},
    assets::SqliteAssetStore,
    auth::{AuthService, PasswordHasher, SqliteAuthStore},
    config::Config,
    db::Database,
    sweep::spawn_session_sweeper,
};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "asset-vault", version, about = "Session-authenticated asset storage")]
struct Cli {
    /// SQLite database path (overrides DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Listen address (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Provision a user account
    CreateUser {
        #[arg(long)]
        login: String,
        #[arg(long, env = "ASSET_VAULT_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    let _ = dotenv();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let db = Database::open(&config.db_path)?;
    let auth_store = SqliteAuthStore::new(db.clone());
    let auth = AuthService::new(
        Arc::new(auth_store.clone()),
        Arc::new(auth_store),
        Arc::new(PasswordHasher::new(config.bcrypt_cost)),
    )
    .with_session_ttl(config.session_ttl);

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            serve(config, db, auth).await
        }
        Command::CreateUser { login, password } => {
            let user = auth
                .create_user(&login, &password)
                .await
                .with_context(|| format!("Failed to create user {login}"))?;
            println!("{}", user.id);
            Ok(())
        }
    }
}

async fn serve(config: Config, db: Database, auth: AuthService) -> Result<()> {
    info!("🚀 Asset Vault starting");
    info!(
        "🔐 Session TTL: {}h, sweep every {}s",
        config.session_ttl.num_hours(),
        config.sweep_interval_secs
    );

    let _sweeper = spawn_session_sweeper(auth.clone(), config.sweep_interval_secs);

    let state = AppState {
        auth,
        assets: Arc::new(SqliteAssetStore::new(db)),
    };
    let app = router(state, config.max_upload_bytes);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asset_vault=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
