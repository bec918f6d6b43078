//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field has a serde default so an empty source loads.

pub mod channels;
pub mod database;
pub mod logging;
pub mod worker;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::channels::{ChannelsConfig, EmailChannelConfig, GatewayConfig, WebPushChannelConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay) and
/// `HEARTH__*` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Persistence settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Email delivery worker settings.
    #[serde(default)]
    #[validate(nested)]
    pub worker: WorkerConfig,
    /// Outbound channel gateways.
    #[serde(default)]
    #[validate(nested)]
    pub channels: ChannelsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default`, the environment-specific overlay
    /// `config/{env}`, and environment variables prefixed with `HEARTH__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let source = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("HEARTH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = source
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config
            .validate()
            .map_err(|e| AppError::configuration(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }
}
