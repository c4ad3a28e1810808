//! Admin authentication.
//!
//! Admin calls carry `Authorization: Bearer <admin_key>`; anything else is rejected
//! before the request body is read.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use metrics::counter;

use crate::{config::AppConfig, metrics::AUTH_FAILED, AppState, Error};

/// Proof that the request was made with the admin key.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(());

/// Check the bearer token on `headers` against the configured admin key.
pub fn authorize(headers: &HeaderMap, config: &AppConfig) -> Result<AdminUser, Error> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if token == config.admin_key => Ok(AdminUser(())),
        _ => {
            counter!(AUTH_FAILED).increment(1);
            Err(Error::unauthorized())
        }
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(&parts.headers, &state.config)
    }
}
