use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use portico_upstream::client::PlatformClient;

#[derive(Clone)]
pub struct HealthState {
    client: PlatformClient,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub backend: HealthCheck,
    pub checked_at: String,
}

pub fn router(client: PlatformClient) -> Router {
    Router::new().route("/healthz", get(health)).with_state(HealthState { client })
}

pub async fn spawn(bind_address: &str, port: u16, client: PlatformClient) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "portico.health.start",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(client)).await {
            error!(
                event_name = "portico.health.error",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let backend = backend_check(&state.client).await;
    let ready = backend.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "portico-server runtime initialized".to_string(),
        },
        backend,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

/// Any HTTP reply from the backend counts as reachable, whatever the status;
/// only a transport-level failure marks it degraded.
async fn backend_check(client: &PlatformClient) -> HealthCheck {
    match client.probe_health().await {
        Ok(raw) => HealthCheck {
            status: "ready",
            detail: format!("backend responded with status {}", raw.status),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("backend probe failed: {error}") }
        }
    }
}
