//! Proxied subrole lookup.
//!
//! - `GET /api/subroles` - the full subrole catalog

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::Router;

use crate::auth::require_bearer;
use crate::routes::{envelope_reply, transport_reply, ApiReply, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/subroles", get(list_subroles))
}

async fn list_subroles(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let normalized = state.client.list_subroles(&token).await.map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}
