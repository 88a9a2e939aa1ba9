//! Proxied notification routes.
//!
//! - `GET /api/notifications`          - list (query forwarded; `all=true` drains)
//! - `GET /api/notifications/settings` - per-user delivery settings
//! - `PUT /api/notifications/settings` - update settings (JSON body forwarded)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use portico_upstream::client::NOTIFICATIONS_PATH;

use crate::auth::require_bearer;
use crate::routes::{
    body_rejection_reply, drain_reply, envelope_reply, transport_reply, wants_full_drain,
    ApiReply, AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/settings", get(get_settings).put(update_settings))
}

async fn list_notifications(
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;

    if wants_full_drain(&query) {
        return Ok(drain_reply(&state, NOTIFICATIONS_PATH, &token, &query).await);
    }

    let normalized =
        state.client.list_notifications(&token, query).await.map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}

async fn get_settings(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let normalized =
        state.client.notification_settings(&token).await.map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}

async fn update_settings(
    headers: HeaderMap,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let Json(body) = body.map_err(body_rejection_reply)?;
    let normalized = state
        .client
        .update_notification_settings(&token, body)
        .await
        .map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}
