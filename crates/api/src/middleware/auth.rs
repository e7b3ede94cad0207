//! JWT-based authentication extractors for Axum handlers.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use boardsync_core::error::CoreError;
use boardsync_core::types::DbId;
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user from the `Authorization: Bearer <token>` header.
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            unauthorized("Invalid Authorization format. Expected: Bearer <token>")
        })?;

        authenticate(token, state).map(|user_id| AuthUser { user_id })
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Authenticated user from the `?token=<jwt>` query parameter.
///
/// Browsers cannot set headers on a WebSocket handshake, so the upgrade
/// route takes the token from the query string instead. Place it before
/// `WebSocketUpgrade` in the handler signature so unauthenticated requests
/// are rejected with 401 before the upgrade is inspected.
#[derive(Debug, Clone)]
pub struct WsAuthUser {
    pub user_id: DbId,
}

impl FromRequestParts<AppState> for WsAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .map_err(|_| unauthorized("Malformed query string"))?;
        let token = query
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| unauthorized("Missing token query parameter"))?;

        authenticate(&token, state).map(|user_id| WsAuthUser { user_id })
    }
}

fn authenticate(token: &str, state: &AppState) -> Result<DbId, AppError> {
    validate_token(token, &state.config.jwt)
        .map(|claims| claims.sub)
        .map_err(|_| unauthorized("Invalid or expired token"))
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.into()))
}
