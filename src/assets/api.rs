//! Asset API Endpoints
//! Mission: Upload, fetch, list and delete the caller's own assets
//!
//! Every handler runs behind `require_session` and scopes store calls by the
//! session owner.

use crate::api::client_ip;
use crate::assets::store::{Asset, AssetStore};
use crate::auth::Session;
use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        ConnectInfo, Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Longest accepted asset name, in bytes
pub const MAX_ASSET_NAME_LEN: usize = 255;

pub type AssetState = Arc<dyn AssetStore>;

fn asset_name(path: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    let Path(name) = path.map_err(|_| ApiError::BadRequest("bad request"))?;
    if name.trim().is_empty() || name.len() > MAX_ASSET_NAME_LEN {
        return Err(ApiError::BadRequest("bad request"));
    }
    Ok(name)
}

fn ok_status() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Upload endpoint - POST /api/upload-asset/:name (raw body = file bytes)
pub async fn upload_asset(
    State(assets): State<AssetState>,
    Extension(session): Extension<Session>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    let ip = client_ip(connect_info);
    let user = session.owner_id;

    let name = asset_name(path).inspect_err(|_| {
        warn!(user = %user, client_ip = %ip, "Bad request (missing or invalid asset name)");
    })?;

    let data = body.map_err(|e| {
        warn!(user = %user, client_ip = %ip, "Failed to read upload body: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest("failed to read body")
        }
    })?;

    let asset = Asset {
        name,
        owner_id: user,
        data: data.to_vec(),
        created_at: Utc::now(),
    };

    assets.put(&asset).await.map_err(|e| {
        error!(user = %user, name = %asset.name, client_ip = %ip, "Failed to save asset: {:#}", e);
        ApiError::Internal
    })?;

    info!(
        user = %user,
        name = %asset.name,
        bytes = asset.data.len(),
        client_ip = %ip,
        "📤 Asset uploaded"
    );
    Ok(ok_status())
}

/// Upload without a name - POST /api/upload-asset/
pub async fn upload_asset_missing_name(Extension(session): Extension<Session>) -> ApiError {
    warn!(user = %session.owner_id, "Bad request (missing asset name)");
    ApiError::BadRequest("bad request")
}

/// Fetch endpoint - GET /api/asset/:name (raw bytes)
pub async fn get_asset(
    State(assets): State<AssetState>,
    Extension(session): Extension<Session>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let ip = client_ip(connect_info);
    let user = session.owner_id;
    let name = asset_name(path)?;

    let asset = match assets.get(user, &name).await {
        Ok(Some(asset)) => asset,
        Ok(None) => {
            warn!(user = %user, name = %name, client_ip = %ip, "Asset not found");
            return Err(ApiError::NotFound);
        }
        Err(e) => {
            error!(user = %user, name = %name, client_ip = %ip, "Failed to load asset: {:#}", e);
            return Err(ApiError::Internal);
        }
    };

    info!(user = %user, name = %name, client_ip = %ip, "Asset retrieved");
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        asset.data,
    )
        .into_response())
}

/// List endpoint - GET /api/assets
pub async fn list_assets(
    State(assets): State<AssetState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, ApiError> {
    let user = session.owner_id;
    let listed = assets.list(user).await.map_err(|e| {
        error!(user = %user, "Failed to list assets: {:#}", e);
        ApiError::Internal
    })?;

    Ok(Json(json!({ "assets": listed })))
}

/// Delete endpoint - DELETE /api/asset/:name
pub async fn delete_asset(
    State(assets): State<AssetState>,
    Extension(session): Extension<Session>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let ip = client_ip(connect_info);
    let user = session.owner_id;
    let name = asset_name(path)?;

    let removed = assets.delete(user, &name).await.map_err(|e| {
        error!(user = %user, name = %name, client_ip = %ip, "Failed to delete asset: {:#}", e);
        ApiError::Internal
    })?;

    info!(user = %user, name = %name, removed, client_ip = %ip, "🗑️  Asset deleted");
    Ok(ok_status())
}
