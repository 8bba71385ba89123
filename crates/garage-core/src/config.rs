use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_CATALOGUE_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can feed a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_url = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        let trimmed = raw.trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected an http(s) URL, got \"{raw}\""),
            });
        }
        Ok(trimmed.to_string())
    };

    let database_url = or_default("DATABASE_URL", "sqlite://garage.sqlite3?mode=rwc");
    let log_level = or_default("GARAGE_LOG_LEVEL", "info");
    let bot_token = lookup("GARAGE_BOT_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty());
    let telegram_api_url = parse_url("GARAGE_TELEGRAM_API_URL", "https://api.telegram.org")?;
    let poll_timeout_secs = parse_u64("GARAGE_POLL_TIMEOUT_SECS", "30")?;

    let db_max_connections = parse_u32("GARAGE_DB_MAX_CONNECTIONS", "5")?;
    let db_acquire_timeout_secs = parse_u64("GARAGE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let catalogue_base_url = parse_url("GARAGE_CATALOGUE_BASE_URL", "https://www.exist.ru")?;
    let catalogue_timeout_secs = parse_u64("GARAGE_CATALOGUE_TIMEOUT_SECS", "30")?;
    let catalogue_user_agent =
        or_default("GARAGE_CATALOGUE_USER_AGENT", DEFAULT_CATALOGUE_USER_AGENT);

    let zbarimg_path = PathBuf::from(or_default("GARAGE_ZBARIMG_PATH", "zbarimg"));

    Ok(AppConfig {
        database_url,
        log_level,
        bot_token,
        telegram_api_url,
        poll_timeout_secs,
        db_max_connections,
        db_acquire_timeout_secs,
        catalogue_base_url,
        catalogue_timeout_secs,
        catalogue_user_agent,
        zbarimg_path,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
