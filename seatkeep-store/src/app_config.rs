use serde::Deserialize;
use std::env;
use std::time::Duration;

use config::{Environment, File, FileFormat};

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub reconciler: ReconcilerConfig,
    pub archiver: ArchiverConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct ReconcilerConfig {
    /// How long a vehicle must stay quiet before its seats are reconciled.
    pub settle_delay_seconds: u64,
}

impl ReconcilerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArchiverConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// IANA zone the daily run is pinned to.
    pub timezone: String,
    /// Local time of day, "HH:MM".
    pub run_at: String,
}

fn default_enabled() -> bool { true }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        config::Config::builder()
            // Built-in defaults so the binary starts without any files around
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(File::with_name("config/local").required(false))
            // Eg. `SEATKEEP__STORE__BACKEND=postgres`
            .add_source(Environment::with_prefix("SEATKEEP").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults overlaid with a TOML snippet.
    pub fn from_toml(overrides: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(File::from_str(overrides, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.max_connections, 5);
        assert_eq!(config.reconciler.settle_delay(), Duration::from_secs(180));
        assert!(config.archiver.enabled);
        assert_eq!(config.archiver.timezone, "Africa/Lagos");
        assert_eq!(config.archiver.run_at, "00:00");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_toml(
            r#"
            [store]
            backend = "postgres"
            database_url = "postgres://localhost/seatkeep"

            [reconciler]
            settle_delay_seconds = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.store.database_url.as_deref(), Some("postgres://localhost/seatkeep"));
        assert_eq!(config.reconciler.settle_delay_seconds, 5);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(Config::from_toml("[store]\nbackend = \"firestore\"").is_err());
    }
}
