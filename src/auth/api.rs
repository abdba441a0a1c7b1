//! Authentication API Endpoints
//! Mission: Exchange login/password for a bearer session token

use crate::api::client_ip;
use crate::auth::{
    models::{LoginRequest, LoginResponse},
    service::AuthError,
    AuthService,
};
use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, ConnectInfo, State},
    http::StatusCode,
    Json,
};
use std::net::SocketAddr;
use tracing::{error, info, warn};

/// Login endpoint - POST /api/auth
///
/// The body is decoded as JSON whatever `Content-Type` the client sends.
pub async fn login(
    State(auth): State<AuthService>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let client_ip = client_ip(connect_info);
    info!(client_ip = %client_ip, "/api/auth called");

    let body = body.map_err(|e| {
        warn!(client_ip = %client_ip, "Failed to read login body: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest("invalid JSON")
        }
    })?;

    let payload: LoginRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(client_ip = %client_ip, "Failed to decode login body: {}", e);
        ApiError::BadRequest("invalid JSON")
    })?;

    match auth
        .login(&payload.login, &payload.password, &client_ip)
        .await
    {
        Ok(token) => {
            info!(login = %payload.login, client_ip = %client_ip, "✅ Login successful");
            Ok(Json(LoginResponse { token }))
        }
        Err(AuthError::Store(e)) => {
            error!(login = %payload.login, client_ip = %client_ip, "Login failed on store: {:#}", e);
            Err(ApiError::Internal)
        }
        Err(e) => {
            warn!(login = %payload.login, client_ip = %client_ip, reason = %e, "❌ Failed login attempt");
            Err(e.into())
        }
    }
}
