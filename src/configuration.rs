use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use config::{Config, ConfigError, File};
use secrecy::SecretString;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::ConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub store: StoreSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Redis,
    Memory,
}

#[derive(Debug, Deserialize)]
pub struct StoreSettings {
    pub backend: StoreBackend,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub acquire_timeout_secs: u64,

    pub sqlite: SqliteSettings,
    pub redis: RedisSettings,
}

impl StoreSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct SqliteSettings {
    pub path: PathBuf,
    pub create_if_missing: bool,
}

impl SqliteSettings {
    pub fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(self.create_if_missing)
            .log_statements(tracing_log::log::LevelFilter::Trace)
    }
}

#[derive(Debug, Deserialize)]
pub struct RedisSettings {
    pub url: SecretString,

    /// Namespace for appointment hashes, the key-value counterpart of a table name.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_key_prefix() -> String {
    "appointments".into()
}

#[derive(Debug, Deserialize)]
pub struct TelemetrySettings {
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("local") {
            Ok(Self::Local)
        } else if value.eq_ignore_ascii_case("production") {
            Ok(Self::Production)
        } else {
            Err(format!(
                "unknown APP_ENVIRONMENT `{value}`, expected `local` or `production`"
            ))
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| ConfigError::Foreign(Box::new(e)))?;
    let environment = match std::env::var("APP_ENVIRONMENT") {
        Ok(name) => name.parse().map_err(ConfigError::Message)?,
        Err(_) => Environment::Local,
    };
    get_configuration_from(&base_path, environment)
}

/// Layers `configurations/base`, the per-environment file and `APP_*` variables.
pub fn get_configuration_from(
    base_path: &Path,
    environment: Environment,
) -> Result<Settings, ConfigError> {
    let configuration_directory = base_path.join("configurations");
    let settings = Config::builder()
        .add_source(File::from(configuration_directory.join("base")))
        .add_source(File::from(
            configuration_directory.join(environment.as_str()),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"), // APP_STORE__BACKEND=redis
        );

    settings.build()?.try_deserialize()
}
