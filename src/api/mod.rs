//! HTTP Routing
//! Mission: Wire the public, login and session-protected routes together

use crate::assets::{api as assets_api, api::AssetState, AssetStore};
use crate::auth::{api as auth_api, require_session, AuthService};
use crate::error::ApiError;
use crate::middleware::request_logging;
use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, FromRef},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub assets: Arc<dyn AssetStore>,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for AssetState {
    fn from_ref(state: &AppState) -> Self {
        state.assets.clone()
    }
}

/// Build the full API router. `max_upload_bytes` caps request bodies on the
/// protected routes.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let auth_routes = Router::new().route("/api/auth", post(auth_api::login));

    let protected_routes = Router::new()
        .route("/api/upload-asset/:name", post(assets_api::upload_asset))
        .route(
            "/api/upload-asset/",
            post(assets_api::upload_asset_missing_name),
        )
        .route(
            "/api/asset/:name",
            get(assets_api::get_asset).delete(assets_api::delete_asset),
        )
        .route("/api/assets", get(assets_api::list_assets))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    let public_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(protected_routes)
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health endpoint - GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Peer IP for log lines; empty when the server runs without connect info
pub(crate) fn client_ip(connect_info: Option<ConnectInfo<SocketAddr>>) -> String {
    connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}
