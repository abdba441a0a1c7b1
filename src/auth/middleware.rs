//! Authentication Middleware
//! Mission: Protect asset endpoints with bearer session validation

use crate::api::client_ip;
use crate::auth::{models::Session, service::AuthError, AuthService};
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tracing::warn;

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of `Authorization: Bearer <token>`. The prefix is
/// case-sensitive and the token must be non-empty.
pub fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .filter(|t| !t.is_empty())
}

/// Auth middleware that resolves the bearer token to a session and stores
/// it in request extensions for the handlers.
pub async fn require_session(
    State(auth): State<AuthService>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client_ip = client_ip(connect_info);
    let path = req.uri().path().to_string();

    let Some(token) = bearer_token(&req).map(str::to_owned) else {
        warn!(client_ip = %client_ip, path = %path, "Missing or malformed Authorization header");
        return Err(ApiError::Unauthorized);
    };

    let session = match auth.validate_token(&token).await {
        Ok(session) => session,
        Err(AuthError::Store(e)) => {
            warn!(client_ip = %client_ip, path = %path, "Session lookup failed: {:#}", e);
            return Err(ApiError::Internal);
        }
        Err(e) => {
            warn!(client_ip = %client_ip, path = %path, reason = %e, "Rejected bearer token");
            return Err(ApiError::Unauthorized);
        }
    };

    req.extensions_mut().insert::<Session>(session);

    Ok(next.run(req).await)
}
