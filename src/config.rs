use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::aggregator::{FACILITY_RADIUS_M, MISSING_COMMUTE_MINUTES};
use crate::core::engine::EngineSettings;
use crate::core::retriever::DEFAULT_TARGET_COUNT;

/// Environment variable prefix, e.g. RENTAL__SERVER__PORT -> server.port
const ENV_PREFIX: &str = "RENTAL";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    #[serde(default = "default_facility_radius_m")]
    pub facility_radius_m: f64,
    #[serde(default = "default_missing_commute_minutes")]
    pub missing_commute_minutes: f64,
    /// Result count when a request gives no limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_count: default_target_count(),
            facility_radius_m: default_facility_radius_m(),
            missing_commute_minutes: default_missing_commute_minutes(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl EngineConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            target_count: self.target_count,
            facility_radius_m: self.facility_radius_m,
            missing_commute_minutes: self.missing_commute_minutes,
        }
    }

    /// Effective result count for a requested limit
    pub fn clamp_limit(&self, requested: Option<u16>) -> usize {
        requested
            .map(usize::from)
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }
}

fn default_target_count() -> usize { DEFAULT_TARGET_COUNT }
fn default_facility_radius_m() -> f64 { FACILITY_RADIUS_M }
fn default_missing_commute_minutes() -> f64 { MISSING_COMMUTE_MINUTES }
fn default_limit() -> usize { 50 }
fn default_max_limit() -> usize { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with RENTAL__)
    /// 5. DATABASE_URL, when set
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        apply_database_url(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        apply_database_url(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// DATABASE_URL takes precedence over every other database.url source
fn apply_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_engine_config() {
        let engine = EngineConfig::default();
        assert_eq!(engine.target_count, 50);
        assert_eq!(engine.facility_radius_m, 2000.0);
        assert_eq!(engine.missing_commute_minutes, 9999.0);

        let settings = engine.engine_settings();
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn test_clamp_limit() {
        let engine = EngineConfig::default();
        assert_eq!(engine.clamp_limit(None), 50);
        assert_eq!(engine.clamp_limit(Some(10)), 10);
        assert_eq!(engine.clamp_limit(Some(500)), 100);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("rental-settings-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nhost = \"127.0.0.1\"\nport = 9000\n\n[database]\nurl = \"postgres://localhost/rental\"\n\n[engine]\nmax_limit = 20"
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.engine.max_limit, 20);
        assert_eq!(settings.engine.target_count, 50);
        assert_eq!(settings.logging.format, "json");
    }
}
