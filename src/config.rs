use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::models::{GeoPoint, MatchingConfig};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Which store implementation backs the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local store, lost on restart
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationSettings {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,
    #[serde(default = "default_min_age")]
    pub default_min_age: u32,
    #[serde(default = "default_max_age")]
    pub default_max_age: u32,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    /// Origin for requesters without a stored location
    #[serde(default)]
    pub fallback_location: Option<LocationSettings>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            max_distance_km: default_max_distance_km(),
            default_min_age: default_min_age(),
            default_max_age: default_max_age(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            fallback_location: None,
        }
    }
}

fn default_max_distance_km() -> f64 { 50.0 }
fn default_min_age() -> u32 { 18 }
fn default_max_age() -> u32 { 100 }
fn default_limit() -> usize { 20 }
fn default_max_limit() -> usize { 100 }

impl MatchingSettings {
    /// Convert into the core matching configuration
    pub fn to_matching_config(&self) -> MatchingConfig {
        MatchingConfig {
            max_distance_km: self.max_distance_km,
            default_min_age: self.default_min_age,
            default_max_age: self.default_max_age,
            default_limit: self.default_limit,
            max_limit: self.max_limit,
            fallback_location: self.fallback_location.as_ref().map(|loc| GeoPoint {
                latitude: loc.latitude,
                longitude: loc.longitude,
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    #[serde(default)]
    pub leeway_secs: u64,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directives, e.g. `info` or `campus_match=debug,sqlx=warn`
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }

impl LoggingSettings {
    /// Build the subscriber filter from the configured directives
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.level)
            .map_err(|e| ConfigError::Message(format!("invalid logging.level '{}': {}", self.level, e)))
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CAMPUS_MATCH__)
    /// 5. `DATABASE_URL`, `JWT_SECRET`, `LOG_LEVEL` and `LOG_FORMAT`
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CAMPUS_MATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("CAMPUS_MATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }
}

/// Apply the conventional unprefixed variables on top of loaded settings
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(secret) = env::var("JWT_SECRET") {
        builder = builder.set_override("auth.jwt_secret", secret)?;
    }
    if let Ok(level) = env::var("LOG_LEVEL") {
        builder = builder.set_override("logging.level", level)?;
    }
    if let Ok(format) = env::var("LOG_FORMAT") {
        builder = builder.set_override("logging.format", format.to_lowercase())?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_matching() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.max_distance_km, 50.0);
        assert_eq!(matching.default_limit, 20);
        assert!(matching.to_matching_config().fallback_location.is_none());
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Compact);
        assert!(logging.env_filter().is_ok());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let logging = LoggingSettings {
            level: "campus_match=loud".to_string(),
            format: LogFormat::Compact,
        };
        assert!(logging.env_filter().is_err());
    }

    #[test]
    fn test_default_backend_is_postgres() {
        assert_eq!(StorageBackend::default(), StorageBackend::Postgres);
    }

    #[test]
    fn test_settings_from_toml() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 5000

            [database]
            backend = "memory"

            [matching]
            max_distance_km = 25.0

            [matching.fallback_location]
            latitude = 43.4723
            longitude = -80.5449

            [auth]
            jwt_secret = "test"

            [logging]
            level = "campus_match=debug,sqlx=warn"
            format = "pretty"
        "#;

        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.database.backend, StorageBackend::Memory);
        let matching = settings.matching.to_matching_config();
        assert_eq!(matching.max_distance_km, 25.0);
        assert_eq!(matching.default_max_age, 100);
        assert_eq!(
            matching.fallback_location,
            Some(GeoPoint { latitude: 43.4723, longitude: -80.5449 })
        );
        assert_eq!(settings.logging.format, LogFormat::Pretty);
        assert!(settings.logging.env_filter().is_ok());
    }

    #[test]
    fn test_log_overrides_replace_file_values() {
        let toml = r#"
            [logging]
            level = "info"
            format = "compact"
        "#;

        let logging: LoggingSettings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .set_override("logging.level", "debug")
            .unwrap()
            .set_override("logging.format", "json")
            .unwrap()
            .build()
            .unwrap()
            .get("logging")
            .unwrap();

        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Json);
    }
}
