use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.database_url, "sqlite://garage.sqlite3?mode=rwc");
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.bot_token.is_none());
    assert_eq!(cfg.telegram_api_url, "https://api.telegram.org");
    assert_eq!(cfg.poll_timeout_secs, 30);
    assert_eq!(cfg.db_max_connections, 5);
    assert_eq!(cfg.db_acquire_timeout_secs, 10);
    assert_eq!(cfg.catalogue_base_url, "https://www.exist.ru");
    assert_eq!(cfg.catalogue_timeout_secs, 30);
    assert!(cfg.catalogue_user_agent.starts_with("Mozilla/5.0"));
    assert_eq!(cfg.zbarimg_path.to_str(), Some("zbarimg"));
}

#[test]
fn require_bot_token_fails_when_unset() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let err = cfg.require_bot_token().unwrap_err();
    assert!(
        matches!(err, ConfigError::MissingEnvVar(ref v) if v == "GARAGE_BOT_TOKEN"),
        "expected MissingEnvVar(GARAGE_BOT_TOKEN), got: {err:?}"
    );
}

#[test]
fn blank_bot_token_counts_as_unset() {
    let mut map = HashMap::new();
    map.insert("GARAGE_BOT_TOKEN", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.bot_token.is_none());
}

#[test]
fn bot_token_is_redacted_in_debug_output() {
    let mut map = HashMap::new();
    map.insert("GARAGE_BOT_TOKEN", "123456:secret-token");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.require_bot_token().unwrap(), "123456:secret-token");
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("secret-token"), "token leaked: {rendered}");
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn catalogue_base_url_trailing_slash_is_stripped() {
    let mut map = HashMap::new();
    map.insert("GARAGE_CATALOGUE_BASE_URL", "http://127.0.0.1:8080/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.catalogue_base_url, "http://127.0.0.1:8080");
}

#[test]
fn catalogue_base_url_without_scheme_fails() {
    let mut map = HashMap::new();
    map.insert("GARAGE_CATALOGUE_BASE_URL", "www.exist.ru");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GARAGE_CATALOGUE_BASE_URL"),
        "expected InvalidEnvVar(GARAGE_CATALOGUE_BASE_URL), got: {result:?}"
    );
}

#[test]
fn catalogue_timeout_override() {
    let mut map = HashMap::new();
    map.insert("GARAGE_CATALOGUE_TIMEOUT_SECS", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.catalogue_timeout_secs, 5);
}

#[test]
fn catalogue_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("GARAGE_CATALOGUE_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GARAGE_CATALOGUE_TIMEOUT_SECS"),
        "expected InvalidEnvVar(GARAGE_CATALOGUE_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn db_max_connections_invalid() {
    let mut map = HashMap::new();
    map.insert("GARAGE_DB_MAX_CONNECTIONS", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GARAGE_DB_MAX_CONNECTIONS"),
        "expected InvalidEnvVar(GARAGE_DB_MAX_CONNECTIONS), got: {result:?}"
    );
}

#[test]
fn poll_timeout_override() {
    let mut map = HashMap::new();
    map.insert("GARAGE_POLL_TIMEOUT_SECS", "50");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.poll_timeout_secs, 50);
}

#[test]
fn database_url_override() {
    let mut map = HashMap::new();
    map.insert("DATABASE_URL", "sqlite::memory:");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.database_url, "sqlite::memory:");
}
