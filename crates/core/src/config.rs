use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub listing: ListingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_port: u16,
    /// Origin allowed to call the API. Absent means permissive CORS, which
    /// is only appropriate while the console runs off a dev server.
    pub allowed_origin: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub health_path: String,
}

impl UpstreamConfig {
    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url_trimmed(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[derive(Clone, Debug)]
pub struct ListingConfig {
    pub page_size: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub upstream_base_url: Option<String>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                health_port: 8081,
                allowed_origin: None,
            },
            upstream: UpstreamConfig {
                base_url: "http://localhost:4000/api".to_string(),
                timeout_secs: 30,
                health_path: "/health".to_string(),
            },
            listing: ListingConfig { page_size: 50 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("portico.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_port) = server.health_port {
                self.server.health_port = health_port;
            }
            if let Some(allowed_origin) = server.allowed_origin {
                self.server.allowed_origin = Some(allowed_origin);
            }
        }

        if let Some(upstream) = patch.upstream {
            if let Some(base_url) = upstream.base_url {
                self.upstream.base_url = base_url;
            }
            if let Some(timeout_secs) = upstream.timeout_secs {
                self.upstream.timeout_secs = timeout_secs;
            }
            if let Some(health_path) = upstream.health_path {
                self.upstream.health_path = health_path;
            }
        }

        if let Some(listing) = patch.listing {
            if let Some(page_size) = listing.page_size {
                self.listing.page_size = page_size;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PORTICO_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PORTICO_SERVER_PORT") {
            self.server.port = parse_u16("PORTICO_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PORTICO_SERVER_HEALTH_PORT") {
            self.server.health_port = parse_u16("PORTICO_SERVER_HEALTH_PORT", &value)?;
        }
        if let Some(value) = read_env("PORTICO_SERVER_ALLOWED_ORIGIN") {
            self.server.allowed_origin = Some(value);
        }

        if let Some(value) = read_env("PORTICO_UPSTREAM_BASE_URL") {
            self.upstream.base_url = value;
        }
        if let Some(value) = read_env("PORTICO_UPSTREAM_TIMEOUT_SECS") {
            self.upstream.timeout_secs = parse_u64("PORTICO_UPSTREAM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PORTICO_UPSTREAM_HEALTH_PATH") {
            self.upstream.health_path = value;
        }

        if let Some(value) = read_env("PORTICO_LISTING_PAGE_SIZE") {
            self.listing.page_size = parse_u32("PORTICO_LISTING_PAGE_SIZE", &value)?;
        }

        let log_level = read_env("PORTICO_LOGGING_LEVEL").or_else(|| read_env("PORTICO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PORTICO_LOGGING_FORMAT").or_else(|| read_env("PORTICO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(upstream_base_url) = overrides.upstream_base_url {
            self.upstream.base_url = upstream_base_url;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_upstream(&self.upstream)?;
        validate_listing(&self.listing)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("portico.toml"), PathBuf::from("config/portico.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.health_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_port must be greater than zero".to_string(),
        ));
    }

    if server.port == server.health_port {
        return Err(ConfigError::Validation(
            "server.health_port must differ from server.port".to_string(),
        ));
    }

    if let Some(origin) = &server.allowed_origin {
        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            return Err(ConfigError::Validation(
                "server.allowed_origin must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_upstream(upstream: &UpstreamConfig) -> Result<(), ConfigError> {
    let base_url = upstream.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "upstream.base_url must start with http:// or https:// (the platform backend API root)"
                .to_string(),
        ));
    }

    if upstream.timeout_secs == 0 || upstream.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "upstream.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !upstream.health_path.starts_with('/') {
        return Err(ConfigError::Validation(
            "upstream.health_path must start with `/`".to_string(),
        ));
    }

    Ok(())
}

fn validate_listing(listing: &ListingConfig) -> Result<(), ConfigError> {
    if listing.page_size == 0 || listing.page_size > 500 {
        return Err(ConfigError::Validation(
            "listing.page_size must be in range 1..=500".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    upstream: Option<UpstreamPatch>,
    listing: Option<ListingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_port: Option<u16>,
    allowed_origin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    health_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListingPatch {
    page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
