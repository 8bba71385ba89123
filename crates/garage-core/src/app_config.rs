use std::path::PathBuf;

use crate::ConfigError;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub bot_token: Option<String>,
    pub telegram_api_url: String,
    pub poll_timeout_secs: u64,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub catalogue_base_url: String,
    pub catalogue_timeout_secs: u64,
    pub catalogue_user_agent: String,
    pub zbarimg_path: PathBuf,
}

impl AppConfig {
    /// Returns the Telegram bot token, which only the `run` command needs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `GARAGE_BOT_TOKEN` was not set.
    pub fn require_bot_token(&self) -> Result<&str, ConfigError> {
        self.bot_token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("GARAGE_BOT_TOKEN".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("log_level", &self.log_level)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[redacted]"))
            .field("telegram_api_url", &self.telegram_api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("catalogue_base_url", &self.catalogue_base_url)
            .field("catalogue_timeout_secs", &self.catalogue_timeout_secs)
            .field("catalogue_user_agent", &self.catalogue_user_agent)
            .field("zbarimg_path", &self.zbarimg_path)
            .finish()
    }
}
