use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use portico_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let doc = config_file_doc.as_ref();
    let path = config_file_path.as_deref();

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        field_source("server.bind_address", &["PORTICO_SERVER_BIND_ADDRESS"], doc, path),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        field_source("server.port", &["PORTICO_SERVER_PORT"], doc, path),
    ));
    lines.push(render_line(
        "server.health_port",
        &config.server.health_port.to_string(),
        field_source("server.health_port", &["PORTICO_SERVER_HEALTH_PORT"], doc, path),
    ));
    lines.push(render_line(
        "server.allowed_origin",
        config.server.allowed_origin.as_deref().unwrap_or("<unset>"),
        field_source("server.allowed_origin", &["PORTICO_SERVER_ALLOWED_ORIGIN"], doc, path),
    ));
    lines.push(render_line(
        "upstream.base_url",
        &config.upstream.base_url,
        field_source("upstream.base_url", &["PORTICO_UPSTREAM_BASE_URL"], doc, path),
    ));
    lines.push(render_line(
        "upstream.timeout_secs",
        &config.upstream.timeout_secs.to_string(),
        field_source("upstream.timeout_secs", &["PORTICO_UPSTREAM_TIMEOUT_SECS"], doc, path),
    ));
    lines.push(render_line(
        "upstream.health_path",
        &config.upstream.health_path,
        field_source("upstream.health_path", &["PORTICO_UPSTREAM_HEALTH_PATH"], doc, path),
    ));
    lines.push(render_line(
        "listing.page_size",
        &config.listing.page_size.to_string(),
        field_source("listing.page_size", &["PORTICO_LISTING_PAGE_SIZE"], doc, path),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source("logging.level", &["PORTICO_LOGGING_LEVEL", "PORTICO_LOG_LEVEL"], doc, path),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            &["PORTICO_LOGGING_FORMAT", "PORTICO_LOG_FORMAT"],
            doc,
            path,
        ),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("portico.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/portico.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    for env_key in env_keys {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
