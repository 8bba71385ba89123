mod app_config;
mod config;
pub mod garage;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use garage::{
    normalize_car_name, Car, CatalogueOption, NewPart, PartCandidate, PartListing, PartRecord,
    NO_CAR_LABEL,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Rejected user input that never reaches storage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("car name must not be empty")]
    EmptyCarName,

    #[error("part code must not be empty")]
    EmptyPartCode,
}
