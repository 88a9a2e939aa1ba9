//! Proxied user routes.
//!
//! - `GET    /api/users`      - list users (query forwarded; `all=true` drains)
//! - `GET    /api/users/me`   - the authenticated user
//! - `GET    /api/users/{id}` - user detail
//! - `PUT    /api/users/{id}` - update (JSON body forwarded)
//! - `DELETE /api/users/{id}` - remove

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use portico_upstream::client::USERS_PATH;

use crate::auth::require_bearer;
use crate::routes::{
    body_rejection_reply, drain_reply, envelope_reply, transport_reply, wants_full_drain,
    ApiReply, AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(current_user))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
}

async fn list_users(
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;

    if wants_full_drain(&query) {
        return Ok(drain_reply(&state, USERS_PATH, &token, &query).await);
    }

    let normalized = state.client.list_users(&token, query).await.map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}

async fn current_user(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let normalized = state.client.current_user(&token).await.map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}

async fn get_user(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let normalized = state.client.get_user(&token, &id).await.map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}

async fn update_user(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let Json(body) = body.map_err(body_rejection_reply)?;
    let normalized =
        state.client.update_user(&token, &id, body).await.map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}

async fn delete_user(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let normalized = state.client.delete_user(&token, &id).await.map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}
