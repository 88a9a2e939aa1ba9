use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use portico_core::config::UpstreamConfig;
use portico_core::domain::actor::BearerToken;

use crate::normalize::{normalize, NormalizedResponse};
use crate::transport::{
    HttpPlatformTransport, Method, PlatformTransport, RawResponse, TransportError,
    UpstreamRequest,
};

pub const USERS_PATH: &str = "/users";
pub const CURRENT_USER_PATH: &str = "/users/me";
pub const SUBROLES_PATH: &str = "/subroles";
pub const PROJECT_REQUESTS_PATH: &str = "/project-requests";
pub const DELETED_PROJECT_REQUESTS_PATH: &str = "/project-requests/deleted";
pub const NOTIFICATIONS_PATH: &str = "/notifications";
pub const NOTIFICATION_SETTINGS_PATH: &str = "/notifications/settings";

/// Typed facade over the platform backend. Cheap to clone; every route
/// handler shares the one underlying transport.
#[derive(Clone)]
pub struct PlatformClient {
    transport: Arc<dyn PlatformTransport>,
    health_path: String,
}

impl PlatformClient {
    pub fn new(transport: Arc<dyn PlatformTransport>, health_path: impl Into<String>) -> Self {
        PlatformClient { transport, health_path: health_path.into() }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, TransportError> {
        let transport = HttpPlatformTransport::new(config)?;
        Ok(PlatformClient::new(Arc::new(transport), config.health_path.clone()))
    }

    /// Execute one backend call and translate the reply into an envelope.
    /// Transport failures bubble up for the caller to map to a 502.
    pub async fn request(
        &self,
        request: UpstreamRequest,
    ) -> Result<NormalizedResponse, TransportError> {
        let method = request.method.as_str();
        let path = request.path.clone();

        match self.transport.execute(request).await {
            Ok(raw) => {
                debug!(method, path = %path, status = raw.status, "backend call completed");
                Ok(normalize(&raw))
            }
            Err(err) => {
                warn!(method, path = %path, error = %err, "backend call failed");
                Err(err)
            }
        }
    }

    /// Execute one backend call and hand back the raw reply. Document
    /// download uses this so binary bodies skip JSON translation.
    pub async fn request_raw(
        &self,
        request: UpstreamRequest,
    ) -> Result<RawResponse, TransportError> {
        let method = request.method.as_str();
        let path = request.path.clone();

        match self.transport.execute(request).await {
            Ok(raw) => {
                debug!(method, path = %path, status = raw.status, "backend call completed");
                Ok(raw)
            }
            Err(err) => {
                warn!(method, path = %path, error = %err, "backend call failed");
                Err(err)
            }
        }
    }

    pub async fn list_users(
        &self,
        token: &BearerToken,
        query: Vec<(String, String)>,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(UpstreamRequest::get(USERS_PATH).with_token(token).with_query(query)).await
    }

    pub async fn current_user(
        &self,
        token: &BearerToken,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(UpstreamRequest::get(CURRENT_USER_PATH).with_token(token)).await
    }

    pub async fn get_user(
        &self,
        token: &BearerToken,
        id: &str,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(UpstreamRequest::get(user_path(id)).with_token(token)).await
    }

    pub async fn update_user(
        &self,
        token: &BearerToken,
        id: &str,
        body: Value,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(
            UpstreamRequest::new(Method::Put, user_path(id)).with_token(token).with_body(body),
        )
        .await
    }

    pub async fn delete_user(
        &self,
        token: &BearerToken,
        id: &str,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(UpstreamRequest::new(Method::Delete, user_path(id)).with_token(token)).await
    }

    pub async fn list_subroles(
        &self,
        token: &BearerToken,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(UpstreamRequest::get(SUBROLES_PATH).with_token(token)).await
    }

    pub async fn list_project_requests(
        &self,
        token: &BearerToken,
        query: Vec<(String, String)>,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(
            UpstreamRequest::get(PROJECT_REQUESTS_PATH).with_token(token).with_query(query),
        )
        .await
    }

    pub async fn deleted_project_requests(
        &self,
        token: &BearerToken,
        query: Vec<(String, String)>,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(
            UpstreamRequest::get(DELETED_PROJECT_REQUESTS_PATH)
                .with_token(token)
                .with_query(query),
        )
        .await
    }

    pub async fn project_request(
        &self,
        token: &BearerToken,
        id: &str,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(UpstreamRequest::get(project_request_path(id)).with_token(token)).await
    }

    pub async fn approve_project_request(
        &self,
        token: &BearerToken,
        id: &str,
        body: Option<Value>,
    ) -> Result<NormalizedResponse, TransportError> {
        let path = format!("{}/approve", project_request_path(id));
        let mut request = UpstreamRequest::new(Method::Post, path).with_token(token);
        if let Some(body) = body {
            request = request.with_body(body);
        }
        self.request(request).await
    }

    pub async fn reject_project_request(
        &self,
        token: &BearerToken,
        id: &str,
        body: Option<Value>,
    ) -> Result<NormalizedResponse, TransportError> {
        let path = format!("{}/reject", project_request_path(id));
        let mut request = UpstreamRequest::new(Method::Post, path).with_token(token);
        if let Some(body) = body {
            request = request.with_body(body);
        }
        self.request(request).await
    }

    pub async fn set_project_request_status(
        &self,
        token: &BearerToken,
        id: &str,
        body: Value,
    ) -> Result<NormalizedResponse, TransportError> {
        let path = format!("{}/status", project_request_path(id));
        self.request(UpstreamRequest::new(Method::Patch, path).with_token(token).with_body(body))
            .await
    }

    pub async fn delete_project_request(
        &self,
        token: &BearerToken,
        id: &str,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(
            UpstreamRequest::new(Method::Delete, project_request_path(id)).with_token(token),
        )
        .await
    }

    pub async fn download_document(
        &self,
        token: &BearerToken,
        id: &str,
    ) -> Result<RawResponse, TransportError> {
        let path = format!("{}/document", project_request_path(id));
        self.request_raw(UpstreamRequest::get(path).with_token(token)).await
    }

    pub async fn list_notifications(
        &self,
        token: &BearerToken,
        query: Vec<(String, String)>,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(UpstreamRequest::get(NOTIFICATIONS_PATH).with_token(token).with_query(query))
            .await
    }

    pub async fn notification_settings(
        &self,
        token: &BearerToken,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(UpstreamRequest::get(NOTIFICATION_SETTINGS_PATH).with_token(token)).await
    }

    pub async fn update_notification_settings(
        &self,
        token: &BearerToken,
        body: Value,
    ) -> Result<NormalizedResponse, TransportError> {
        self.request(
            UpstreamRequest::new(Method::Put, NOTIFICATION_SETTINGS_PATH)
                .with_token(token)
                .with_body(body),
        )
        .await
    }

    /// Unauthenticated reachability probe against the configured health
    /// path. Any HTTP reply counts as reachable; only transport failures
    /// surface as errors.
    pub async fn probe_health(&self) -> Result<RawResponse, TransportError> {
        self.request_raw(UpstreamRequest::get(self.health_path.clone())).await
    }
}

pub fn user_path(id: &str) -> String {
    format!("{USERS_PATH}/{id}")
}

pub fn project_request_path(id: &str) -> String {
    format!("{PROJECT_REQUESTS_PATH}/{id}")
}
