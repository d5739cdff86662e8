use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use snapshop_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let doc = config_file_doc.as_ref();
    let file = config_file_path.as_deref();

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        field_source("database.url", Some("SNAPSHOP_DATABASE_URL"), doc, file),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        field_source("database.max_connections", Some("SNAPSHOP_DATABASE_MAX_CONNECTIONS"), doc, file),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        field_source("database.timeout_secs", Some("SNAPSHOP_DATABASE_TIMEOUT_SECS"), doc, file),
    ));

    lines.push(render_line(
        "catalog.base_url",
        &config.catalog.base_url,
        field_source("catalog.base_url", Some("SNAPSHOP_CATALOG_BASE_URL"), doc, file),
    ));
    lines.push(render_line(
        "catalog.timeout_secs",
        &config.catalog.timeout_secs.to_string(),
        field_source("catalog.timeout_secs", Some("SNAPSHOP_CATALOG_TIMEOUT_SECS"), doc, file),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        field_source("server.bind_address", Some("SNAPSHOP_SERVER_BIND_ADDRESS"), doc, file),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        field_source("server.port", Some("SNAPSHOP_SERVER_PORT"), doc, file),
    ));
    lines.push(render_line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        field_source("server.health_check_port", Some("SNAPSHOP_SERVER_HEALTH_CHECK_PORT"), doc, file),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        field_source(
            "server.graceful_shutdown_secs",
            Some("SNAPSHOP_SERVER_GRACEFUL_SHUTDOWN_SECS"),
            doc,
            file,
        ),
    ));

    lines.push(render_line(
        "auth.session_ttl_hours",
        &config.auth.session_ttl_hours.to_string(),
        field_source("auth.session_ttl_hours", Some("SNAPSHOP_AUTH_SESSION_TTL_HOURS"), doc, file),
    ));
    lines.push(render_line(
        "auth.min_password_len",
        &config.auth.min_password_len.to_string(),
        field_source("auth.min_password_len", Some("SNAPSHOP_AUTH_MIN_PASSWORD_LEN"), doc, file),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source("logging.level", Some("SNAPSHOP_LOGGING_LEVEL"), doc, file),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source("logging.format", Some("SNAPSHOP_LOGGING_FORMAT"), doc, file),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("snapshop.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/snapshop.toml");
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
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
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
