//! API router assembly and the reply helpers shared by every resource
//! module. All browser-facing routes live under `/api` behind the CORS and
//! trace layers; every handler replies with the normalized envelope and the
//! backend's (or a synthesized) status code.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use portico_core::config::AppConfig;
use portico_core::domain::actor::BearerToken;
use portico_core::envelope::Envelope;
use portico_upstream::client::PlatformClient;
use portico_upstream::drain::{drain_pages, DrainError};
use portico_upstream::normalize::NormalizedResponse;
use portico_upstream::transport::TransportError;

use crate::{notifications, requests, subroles, users};

pub const BACKEND_UNREACHABLE_MESSAGE: &str =
    "Could not reach the platform backend. Please try again later.";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: PlatformClient,
}

/// Status code plus envelope, the reply shape of every API handler.
pub type ApiReply = (StatusCode, Json<Envelope>);

pub fn api_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.server.allowed_origin.as_deref());

    let api = Router::new()
        .merge(users::router())
        .merge(subroles::router())
        .merge(requests::router())
        .merge(notifications::router());

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    match allowed_origin.and_then(|origin| origin.parse::<HeaderValue>().ok()) {
        Some(origin) => {
            CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}

pub fn envelope_reply(normalized: NormalizedResponse) -> ApiReply {
    (status_code(normalized.status), Json(normalized.envelope))
}

pub fn transport_reply(_error: TransportError) -> ApiReply {
    (StatusCode::BAD_GATEWAY, Json(Envelope::failure(BACKEND_UNREACHABLE_MESSAGE)))
}

/// Maps a body-extractor rejection (malformed JSON, wrong content type) into
/// the failure envelope, keeping the extractor's status code.
pub fn body_rejection_reply(rejection: JsonRejection) -> ApiReply {
    (rejection.status(), Json(Envelope::failure(rejection.body_text())))
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}

/// `all=true` on a listing route asks the gateway to drain every page
/// server-side instead of forwarding a single page.
pub fn wants_full_drain(query: &[(String, String)]) -> bool {
    query.iter().any(|(key, value)| key == "all" && value == "true")
}

fn listing_base_query(query: &[(String, String)]) -> Vec<(String, String)> {
    query
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "all" | "page" | "limit"))
        .cloned()
        .collect()
}

/// Run the whole-listing drain and shape the reply: gathered items plus
/// page count and completion flag, with a message when the drain stopped
/// early. First-page failures forward the backend's own failure.
pub async fn drain_reply(
    state: &AppState,
    path: &str,
    token: &BearerToken,
    query: &[(String, String)],
) -> ApiReply {
    let base_query = listing_base_query(query);
    let page_size = state.config.listing.page_size;

    match drain_pages(&state.client, path, token, base_query, page_size).await {
        Ok(outcome) => {
            let data = json!({
                "items": outcome.items,
                "pages": outcome.pages,
                "complete": outcome.complete,
            });
            let envelope = match outcome.failure_message {
                Some(message) => Envelope::success_with_message(data, message),
                None => Envelope::success(data),
            };
            (StatusCode::OK, Json(envelope))
        }
        Err(DrainError::Backend(normalized)) => envelope_reply(normalized),
        Err(DrainError::Transport(error)) => transport_reply(error),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use portico_core::config::{AppConfig, LoadOptions};
    use portico_upstream::client::PlatformClient;
    use portico_upstream::transport::NoopPlatformTransport;

    use super::{api_router, wants_full_drain, AppState};

    fn noop_state() -> AppState {
        let config = AppConfig::load(LoadOptions::default()).expect("default config");
        AppState {
            config: Arc::new(config),
            client: PlatformClient::new(Arc::new(NoopPlatformTransport), "/health"),
        }
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn drain_is_opt_in() {
        assert!(wants_full_drain(&pairs(&[("all", "true")])));
        assert!(!wants_full_drain(&pairs(&[("all", "1")])));
        assert!(!wants_full_drain(&pairs(&[("page", "2")])));
    }

    #[tokio::test]
    async fn unknown_api_path_is_not_found() {
        let app = api_router(noop_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/nonexistent")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn routes_require_authorization() {
        let app = api_router(noop_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/users/me")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authorized_route_reaches_the_backend() {
        let app = api_router(noop_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/subroles")
                    .header("Authorization", "Bearer token")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_body_replies_with_an_envelope() {
        let app = api_router(noop_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/api/project-requests/req-1/status")
                    .header("Authorization", "Bearer token")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{not json"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes =
            axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let reply: serde_json::Value = serde_json::from_slice(&bytes).expect("json envelope");
        assert_eq!(reply["success"], json!(false));
        assert!(reply["message"].is_string());
    }

    #[tokio::test]
    async fn malformed_optional_body_replies_with_an_envelope() {
        let app = api_router(noop_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/project-requests/req-1/approve")
                    .header("Authorization", "Bearer token")
                    .header("Content-Type", "application/json")
                    .body(Body::from("[1, 2,"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes =
            axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let reply: serde_json::Value = serde_json::from_slice(&bytes).expect("json envelope");
        assert_eq!(reply["success"], json!(false));
    }
}
