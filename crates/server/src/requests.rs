//! Proxied project-request routes.
//!
//! - `GET    /api/project-requests`                   - list (query forwarded)
//! - `GET    /api/project-requests/deleted`           - soft-deleted listing
//! - `GET    /api/project-requests/{id}`              - detail
//! - `POST   /api/project-requests/{id}/approve`      - approve (optional body)
//! - `POST   /api/project-requests/{id}/reject`       - reject (optional body)
//! - `PATCH  /api/project-requests/{id}/status`       - status change (validated here)
//! - `DELETE /api/project-requests/{id}`              - soft delete
//! - `GET    /api/project-requests/{id}/document`     - binary document download
//! - `GET    /api/project-requests/{id}/permissions`  - server-side capability evaluation

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use portico_core::badge::StatusBadge;
use portico_core::domain::actor::Actor;
use portico_core::domain::request::{ProjectRequest, RequestStatus};
use portico_core::envelope::Envelope;
use portico_core::permissions::evaluate;
use portico_upstream::normalize::normalize;

use crate::auth::require_bearer;
use crate::routes::{body_rejection_reply, envelope_reply, transport_reply, ApiReply, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/project-requests", get(list_requests))
        .route("/project-requests/deleted", get(deleted_requests))
        .route("/project-requests/{id}", get(request_detail).delete(remove_request))
        .route("/project-requests/{id}/approve", post(approve_request))
        .route("/project-requests/{id}/reject", post(reject_request))
        .route("/project-requests/{id}/status", patch(set_status))
        .route("/project-requests/{id}/document", get(download_document))
        .route("/project-requests/{id}/permissions", get(request_permissions))
}

async fn list_requests(
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let normalized =
        state.client.list_project_requests(&token, query).await.map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}

async fn deleted_requests(
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let normalized =
        state.client.deleted_project_requests(&token, query).await.map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}

async fn request_detail(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let normalized =
        state.client.project_request(&token, &id).await.map_err(transport_reply)?;
    Ok(envelope_reply(normalized))
}

async fn approve_request(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Result<Option<Json<Value>>, JsonRejection>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let body = body.map_err(body_rejection_reply)?.map(|Json(value)| value);

    let normalized = state
        .client
        .approve_project_request(&token, &id, body)
        .await
        .map_err(transport_reply)?;

    info!(
        event_name = "portico.request.approve_forwarded",
        correlation_id = %uuid_v4(),
        request_id = %id,
        backend_status = normalized.status,
        "approval forwarded to backend"
    );
    Ok(envelope_reply(normalized))
}

async fn reject_request(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Result<Option<Json<Value>>, JsonRejection>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let body = body.map_err(body_rejection_reply)?.map(|Json(value)| value);

    let normalized = state
        .client
        .reject_project_request(&token, &id, body)
        .await
        .map_err(transport_reply)?;

    info!(
        event_name = "portico.request.reject_forwarded",
        correlation_id = %uuid_v4(),
        request_id = %id,
        backend_status = normalized.status,
        "rejection forwarded to backend"
    );
    Ok(envelope_reply(normalized))
}

/// Status changes are validated here before anything leaves the gateway:
/// the body's `status` must parse into one of the five known values, and
/// the forwarded body carries the canonical spelling.
async fn set_status(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let Json(body) = body.map_err(body_rejection_reply)?;

    let requested = body.get("status").and_then(Value::as_str).unwrap_or_default();
    let Some(status) = RequestStatus::parse(requested) else {
        let allowed =
            RequestStatus::ALL.map(|status| status.as_str()).join(", ");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(Envelope::failure(format!(
                "Invalid status value. Expected one of: {allowed}."
            ))),
        ));
    };

    let mut outbound = body;
    if let Some(map) = outbound.as_object_mut() {
        map.insert("status".to_string(), Value::String(status.as_str().to_string()));
    }

    let normalized = state
        .client
        .set_project_request_status(&token, &id, outbound)
        .await
        .map_err(transport_reply)?;

    info!(
        event_name = "portico.request.status_forwarded",
        correlation_id = %uuid_v4(),
        request_id = %id,
        status = status.as_str(),
        backend_status = normalized.status,
        "status change forwarded to backend"
    );
    Ok(envelope_reply(normalized))
}

async fn remove_request(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;
    let normalized =
        state.client.delete_project_request(&token, &id).await.map_err(transport_reply)?;

    info!(
        event_name = "portico.request.delete_forwarded",
        correlation_id = %uuid_v4(),
        request_id = %id,
        backend_status = normalized.status,
        "deletion forwarded to backend"
    );
    Ok(envelope_reply(normalized))
}

/// Streams the stored document back with the backend's `Content-Type` and
/// `Content-Disposition`. Upstream failures are normalized into an envelope
/// like any other route.
async fn download_document(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiReply> {
    let token = require_bearer(&headers)?;
    let raw =
        state.client.download_document(&token, &id).await.map_err(transport_reply)?;

    if raw.is_success() {
        let mut reply_headers = HeaderMap::new();
        if let Some(value) =
            raw.content_type.as_deref().and_then(|v| HeaderValue::from_str(v).ok())
        {
            reply_headers.insert(header::CONTENT_TYPE, value);
        }
        if let Some(value) =
            raw.content_disposition.as_deref().and_then(|v| HeaderValue::from_str(v).ok())
        {
            reply_headers.insert(header::CONTENT_DISPOSITION, value);
        }
        let status = StatusCode::from_u16(raw.status).unwrap_or(StatusCode::OK);
        return Ok((status, reply_headers, raw.body).into_response());
    }

    Ok(envelope_reply(normalize(&raw)).into_response())
}

/// Evaluates the capability set for the calling user against one request:
/// fetches the request detail, resolves the actor via `users/me`, and runs
/// the evaluator and badge mapper. A failed actor lookup degrades to the
/// read-only capability set rather than failing the route.
async fn request_permissions(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<ApiReply, ApiReply> {
    let token = require_bearer(&headers)?;

    let detail =
        state.client.project_request(&token, &id).await.map_err(transport_reply)?;
    if !detail.envelope.success {
        return Ok(envelope_reply(detail));
    }
    let payload = detail.envelope.data.unwrap_or(Value::Null);
    let request = ProjectRequest::from_payload(&payload);

    let actor = match state.client.current_user(&token).await {
        Ok(me) if me.envelope.success => {
            me.envelope.data.as_ref().and_then(Actor::from_payload)
        }
        _ => None,
    };

    let permissions = evaluate(Some(&request), actor.as_ref());
    let badge = StatusBadge::for_status(request.status, permissions.can_edit);

    let data = json!({
        "request": payload,
        "permissions": permissions,
        "badge": badge,
    });
    Ok((StatusCode::OK, Json(Envelope::success(data))))
}

fn uuid_v4() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, HeaderValue, StatusCode};
    use bytes::Bytes;
    use serde_json::json;
    use tokio::sync::Mutex;

    use portico_core::config::{AppConfig, LoadOptions};
    use portico_upstream::client::PlatformClient;
    use portico_upstream::transport::{
        PlatformTransport, RawResponse, TransportError, UpstreamRequest,
    };

    use crate::routes::AppState;

    use super::{download_document, request_permissions, set_status};

    struct ScriptedState {
        replies: VecDeque<Result<RawResponse, TransportError>>,
        calls: Vec<UpstreamRequest>,
    }

    struct ScriptedTransport {
        state: Mutex<ScriptedState>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<RawResponse, TransportError>>) -> Self {
            ScriptedTransport {
                state: Mutex::new(ScriptedState { replies: replies.into(), calls: Vec::new() }),
            }
        }

        async fn calls(&self) -> Vec<UpstreamRequest> {
            self.state.lock().await.calls.clone()
        }
    }

    #[async_trait]
    impl PlatformTransport for ScriptedTransport {
        async fn execute(
            &self,
            request: UpstreamRequest,
        ) -> Result<RawResponse, TransportError> {
            let mut state = self.state.lock().await;
            state.calls.push(request);
            state.replies.pop_front().unwrap_or_else(|| {
                Err(TransportError::Request("scripted transport exhausted".to_string()))
            })
        }
    }

    fn json_reply(status: u16, body: serde_json::Value) -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status,
            content_type: Some("application/json".to_string()),
            content_disposition: None,
            body: Bytes::from(body.to_string()),
        })
    }

    fn app_state(transport: Arc<ScriptedTransport>) -> AppState {
        let config = AppConfig::load(LoadOptions::default()).expect("default config");
        AppState {
            config: Arc::new(config),
            client: PlatformClient::new(transport, "/health"),
        }
    }

    fn authed_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer test"));
        headers
    }

    #[tokio::test]
    async fn unknown_status_is_rejected_without_a_backend_call() {
        let transport = Arc::new(ScriptedTransport::new(Vec::new()));

        let (status, body) = set_status(
            authed_headers(),
            Path("req-1".to_string()),
            State(app_state(transport.clone())),
            Ok(axum::Json(json!({"status": "archived"}))),
        )
        .await
        .expect_err("rejection");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert!(body.message.as_deref().unwrap_or_default().contains("on_hold"));
        assert!(transport.calls().await.is_empty());
    }

    #[tokio::test]
    async fn status_is_canonicalized_before_forwarding() {
        let transport = Arc::new(ScriptedTransport::new(vec![json_reply(
            200,
            json!({"success": true}),
        )]));

        let (status, _) = set_status(
            authed_headers(),
            Path("req-1".to_string()),
            State(app_state(transport.clone())),
            Ok(axum::Json(json!({"status": " Under_Review ", "reason": "needs more eyes"}))),
        )
        .await
        .expect("reply");

        assert_eq!(status, StatusCode::OK);
        let calls = transport.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method.as_str(), "PATCH");
        assert_eq!(calls[0].path, "/project-requests/req-1/status");
        let body = calls[0].body.clone().expect("body");
        assert_eq!(body["status"], json!("under_review"));
        assert_eq!(body["reason"], json!("needs more eyes"));
    }

    #[tokio::test]
    async fn permissions_route_evaluates_admin_capabilities() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            json_reply(
                200,
                json!({
                    "success": true,
                    "data": {
                        "_id": "req-1",
                        "status": "approved",
                        "submittedBy": "u-owner",
                    },
                }),
            ),
            json_reply(
                200,
                json!({"success": true, "data": {"_id": "u-admin", "role": "admin"}}),
            ),
        ]));

        let (status, body) = request_permissions(
            authed_headers(),
            Path("req-1".to_string()),
            State(app_state(transport.clone())),
        )
        .await
        .expect("reply");

        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        let data = body.data.clone().expect("data");
        assert_eq!(data["permissions"]["canEdit"], json!(true));
        assert_eq!(data["permissions"]["showAdminBadge"], json!(true));
        assert_eq!(data["permissions"]["isOwner"], json!(false));
        assert_eq!(data["badge"]["badge"], json!("Admin-Only Editing"));
        assert_eq!(transport.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn failed_actor_lookup_degrades_to_read_only() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            json_reply(
                200,
                json!({
                    "success": true,
                    "data": {"_id": "req-1", "status": "pending", "submittedBy": "u1"},
                }),
            ),
            json_reply(401, json!({"success": false})),
        ]));

        let (status, body) = request_permissions(
            authed_headers(),
            Path("req-1".to_string()),
            State(app_state(transport)),
        )
        .await
        .expect("reply");

        assert_eq!(status, StatusCode::OK);
        let data = body.data.clone().expect("data");
        assert_eq!(data["permissions"]["canEdit"], json!(false));
        assert_eq!(data["permissions"]["isReadOnly"], json!(true));
    }

    #[tokio::test]
    async fn missing_request_forwards_the_backend_failure() {
        let transport = Arc::new(ScriptedTransport::new(vec![json_reply(
            404,
            json!({"success": false, "message": "not found"}),
        )]));

        let (status, body) = request_permissions(
            authed_headers(),
            Path("req-gone".to_string()),
            State(app_state(transport.clone())),
        )
        .await
        .expect("reply");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.success);
        assert_eq!(transport.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn document_download_forwards_binary_and_headers() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(RawResponse {
            status: 200,
            content_type: Some("application/pdf".to_string()),
            content_disposition: Some("attachment; filename=\"plan.pdf\"".to_string()),
            body: Bytes::from_static(b"%PDF-1.7 fake"),
        })]));

        let response = download_document(
            authed_headers(),
            Path("req-1".to_string()),
            State(app_state(transport)),
        )
        .await
        .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("application/pdf")
        );
        assert_eq!(
            response.headers().get("content-disposition").and_then(|v| v.to_str().ok()),
            Some("attachment; filename=\"plan.pdf\"")
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&bytes[..], b"%PDF-1.7 fake");
    }

    #[tokio::test]
    async fn document_download_failure_becomes_an_envelope() {
        let transport = Arc::new(ScriptedTransport::new(vec![json_reply(
            404,
            json!({"error": "document missing"}),
        )]));

        let response = download_document(
            authed_headers(),
            Path("req-1".to_string()),
            State(app_state(transport)),
        )
        .await
        .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let envelope: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(envelope["success"], json!(false));
        assert_eq!(envelope["message"], json!("document missing"));
    }
}
