use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use portico_core::config::{AppConfig, ConfigError, LoadOptions};
use portico_upstream::client::PlatformClient;
use portico_upstream::transport::TransportError;

pub struct Application {
    pub config: Arc<AppConfig>,
    pub client: PlatformClient,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("backend http client construction failed: {0}")]
    HttpClient(#[source] TransportError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "portico.bootstrap.start",
        upstream = %config.upstream.base_url,
        "starting application bootstrap"
    );

    let client =
        PlatformClient::from_config(&config.upstream).map_err(BootstrapError::HttpClient)?;
    info!(
        event_name = "portico.bootstrap.client_ready",
        timeout_secs = config.upstream.timeout_secs,
        "backend http client constructed"
    );

    Ok(Application { config: Arc::new(config), client })
}
