//! Runtime contract tests for the operator CLI commands.
//!
//! Commands are invoked in-process; environment mutation is serialized through
//! a shared lock so the attribution and failure cases stay deterministic.

use serde_json::Value;
use snapshop_cli::commands::{config, doctor, migrate, seed};
use std::env;
use std::sync::{Mutex, OnceLock};

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("SNAPSHOP_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_fails_with_config_validation_error() {
    with_env(&[("SNAPSHOP_SERVER_PORT", "not-a-port")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_returns_demo_dataset_summary() {
    with_env(&[("SNAPSHOP_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected successful seed run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("demo dataset loaded"));
        assert!(message.contains("sign in as `demo`"));
    });
}

#[test]
fn seed_is_deterministic_across_runs() {
    with_env(&[("SNAPSHOP_DATABASE_URL", "sqlite::memory:")], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["status"], "ok");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        assert_eq!(second_payload["status"], "ok");

        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn config_attributes_env_overrides_and_defaults() {
    with_env(&[("SNAPSHOP_DATABASE_URL", "sqlite::memory:")], || {
        let output = config::run();

        assert!(output.starts_with("effective config (source precedence: env > file > default):"));
        assert!(output
            .contains("- database.url = sqlite::memory: (source: env (SNAPSHOP_DATABASE_URL))"));
        assert!(output.contains("- catalog.base_url = https://fakestoreapi.com (source: default)"));
        assert!(output.contains("- auth.session_ttl_hours = 720 (source: default)"));
    });
}

#[test]
fn doctor_json_passes_all_checks_with_valid_env() {
    with_env(&[("SNAPSHOP_DATABASE_URL", "sqlite::memory:")], || {
        let output = doctor::run(true);
        let report: Value = serde_json::from_str(&output).expect("doctor --json emits JSON");

        assert_eq!(report["overall_status"], "pass");
        let names: Vec<&str> = report["checks"]
            .as_array()
            .expect("checks array")
            .iter()
            .filter_map(|check| check["name"].as_str())
            .collect();
        assert_eq!(names, ["config_validation", "catalog_endpoint", "database_connectivity"]);
    });
}

#[test]
fn doctor_skips_downstream_checks_when_config_is_invalid() {
    with_env(&[("SNAPSHOP_SERVER_PORT", "not-a-port")], || {
        let output = doctor::run(false);

        assert!(output.contains("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation:"));
        assert!(output.contains("- [skip] catalog_endpoint:"));
        assert!(output.contains("- [skip] database_connectivity:"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SNAPSHOP_DATABASE_URL",
        "SNAPSHOP_DATABASE_MAX_CONNECTIONS",
        "SNAPSHOP_DATABASE_TIMEOUT_SECS",
        "SNAPSHOP_CATALOG_BASE_URL",
        "SNAPSHOP_CATALOG_TIMEOUT_SECS",
        "SNAPSHOP_SERVER_BIND_ADDRESS",
        "SNAPSHOP_SERVER_PORT",
        "SNAPSHOP_SERVER_HEALTH_CHECK_PORT",
        "SNAPSHOP_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "SNAPSHOP_AUTH_SESSION_TTL_HOURS",
        "SNAPSHOP_AUTH_MIN_PASSWORD_LEN",
        "SNAPSHOP_LOGGING_LEVEL",
        "SNAPSHOP_LOGGING_FORMAT",
        "SNAPSHOP_LOG_LEVEL",
        "SNAPSHOP_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
