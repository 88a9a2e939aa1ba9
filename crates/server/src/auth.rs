//! Bearer-token guard. Every proxied route calls [`require_bearer`] before
//! doing anything else; a missing or blank `Authorization` header
//! short-circuits with a 401 envelope and no backend call.

use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;

use portico_core::domain::actor::BearerToken;
use portico_core::envelope::Envelope;

use crate::routes::ApiReply;

pub const MISSING_AUTH_MESSAGE: &str = "Authentication required. Please sign in and try again.";

pub fn require_bearer(headers: &HeaderMap) -> Result<BearerToken, ApiReply> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(BearerToken::new)
        .ok_or_else(|| {
            (StatusCode::UNAUTHORIZED, Json(Envelope::failure(MISSING_AUTH_MESSAGE)))
        })
}
