//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the caller of a REST route, from a Bearer token.
//! - [`auth::WsAuthUser`] -- the caller of the WebSocket upgrade, from `?token=`.

pub mod auth;
