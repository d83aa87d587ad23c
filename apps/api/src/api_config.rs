use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use triggermesh_core::AppError;
use url::Url;


const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: i64 = 8080;
const DEFAULT_MAX_BODY_SIZE: i64 = 1 << 20;
const MAX_BODY_SIZE_CEILING: i64 = 100 << 20;
const DEFAULT_DATABASE_PATH: &str = "./triggermesh.db";
const DEFAULT_JENKINS_TIMEOUT_SECS: i64 = 30;
const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

/// Command line interface of the gateway binary.
#[derive(Debug, Parser)]
#[command(name = "triggermesh", version, about = "Authenticated gateway for triggering CI builds")]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, env = "TRIGGERMESH_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Apply database migrations and exit.
    #[arg(long)]
    pub migrate_only: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    server: RawServerConfig,
    database: RawDatabaseConfig,
    jenkins: RawJenkinsConfig,
    api: RawApiKeysConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawServerConfig {
    port: i64,
    host: String,
    allowed_origins: Vec<String>,
    max_body_size: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDatabaseConfig {
    path: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawJenkinsConfig {
    url: String,
    username: String,
    token: String,
    timeout: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawApiKeysConfig {
    keys: Vec<String>,
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub max_body_size: usize,
}

/// Jenkins connection settings.
#[derive(Debug, Clone)]
pub struct JenkinsSettings {
    pub url: String,
    pub username: String,
    pub token: String,
    pub timeout: Duration,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub server: ServerSettings,
    pub database_path: String,
    pub jenkins: JenkinsSettings,
    pub api_keys: Vec<String>,
}

impl ApiConfig {
    /// Loads configuration from a YAML file overlaid with `TRIGGERMESH_*` variables.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path).map_err(|error| {
            AppError::Validation(format!(
                "failed to read config file '{}': {error}",
                path.display()
            ))
        })?;

        Self::from_yaml_str(contents.as_str(), |name| env::var(name).ok())
    }

    /// Parses YAML, applies the environment overlay from `lookup`, fills defaults and validates.
    pub fn from_yaml_str<F>(contents: &str, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut raw = if contents.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str::<RawConfig>(contents)
                .map_err(|error| AppError::Validation(format!("invalid config file: {error}")))?
        };

        raw.apply_env_overrides(&lookup);
        raw.apply_defaults();
        raw.validate()
    }

    /// Returns the listen address, letting a `PORT` value override the configured port.
    #[must_use]
    pub fn bind_address(&self, port_override: Option<&str>) -> (String, u16) {
        let port = port_override
            .and_then(|value| value.trim().parse::<u16>().ok())
            .filter(|port| *port > 0)
            .unwrap_or(self.server.port);

        (self.server.host.clone(), port)
    }
}

impl RawConfig {
    fn apply_env_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let port = non_empty("TRIGGERMESH_SERVER_PORT").and_then(|value| value.parse::<i64>().ok());
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(host) = non_empty("TRIGGERMESH_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(path) = non_empty("TRIGGERMESH_DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(url) = non_empty("TRIGGERMESH_JENKINS_URL") {
            self.jenkins.url = url;
        }
        if let Some(username) = non_empty("TRIGGERMESH_JENKINS_USERNAME") {
            self.jenkins.username = username;
        }
        if let Some(token) = non_empty("TRIGGERMESH_JENKINS_TOKEN") {
            self.jenkins.token = token;
        }
        let timeout = non_empty("TRIGGERMESH_JENKINS_TIMEOUT")
            .and_then(|value| value.parse::<i64>().ok())
            .filter(|timeout| *timeout > 0);
        if let Some(timeout) = timeout {
            self.jenkins.timeout = timeout;
        }
    }

    fn apply_defaults(&mut self) {
        if self.server.port == 0 {
            self.server.port = DEFAULT_PORT;
        }
        if self.server.host.is_empty() {
            self.server.host = DEFAULT_HOST.to_owned();
        }
        if self.server.max_body_size == 0 {
            self.server.max_body_size = DEFAULT_MAX_BODY_SIZE;
        }
        if self.database.path.is_empty() {
            self.database.path = DEFAULT_DATABASE_PATH.to_owned();
        }
        if self.jenkins.timeout == 0 {
            self.jenkins.timeout = DEFAULT_JENKINS_TIMEOUT_SECS;
        }
        if self.jenkins.username.is_empty() {
            self.jenkins.username = self.jenkins.token.clone();
        }
    }

    fn validate(self) -> Result<ApiConfig, AppError> {
        let port = u16::try_from(self.server.port)
            .ok()
            .filter(|port| *port > 0)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "invalid server.port: {} (must be between 1 and 65535)",
                    self.server.port
                ))
            })?;

        if self.server.max_body_size < 0 {
            return Err(AppError::Validation(format!(
                "invalid server.max_body_size: {} (must be non-negative)",
                self.server.max_body_size
            )));
        }
        if self.server.max_body_size > MAX_BODY_SIZE_CEILING {
            return Err(AppError::Validation(format!(
                "invalid server.max_body_size: {} (must be less than 100MB)",
                self.server.max_body_size
            )));
        }
        let max_body_size = usize::try_from(self.server.max_body_size).map_err(|error| {
            AppError::Validation(format!("invalid server.max_body_size: {error}"))
        })?;

        if self.jenkins.url.is_empty() {
            return Err(AppError::Validation("jenkins.url is required".to_owned()));
        }
        let jenkins_url = Url::parse(self.jenkins.url.as_str())
            .map_err(|error| AppError::Validation(format!("invalid jenkins.url: {error}")))?;
        if !matches!(jenkins_url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "invalid jenkins.url: unsupported scheme '{}'",
                jenkins_url.scheme()
            )));
        }
        if self.jenkins.token.is_empty() {
            return Err(AppError::Validation("jenkins.token is required".to_owned()));
        }
        let timeout_secs = u64::try_from(self.jenkins.timeout)
            .ok()
            .filter(|timeout| *timeout > 0)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "invalid jenkins.timeout: {} (must be positive)",
                    self.jenkins.timeout
                ))
            })?;

        if self.api.keys.is_empty() {
            return Err(AppError::Validation(
                "at least one api.key is required".to_owned(),
            ));
        }
        if let Some(index) = self.api.keys.iter().position(|key| key.is_empty()) {
            return Err(AppError::Validation(format!(
                "api.keys[{index}] cannot be empty"
            )));
        }

        Ok(ApiConfig {
            server: ServerSettings {
                host: self.server.host,
                port,
                allowed_origins: self.server.allowed_origins,
                max_body_size,
            },
            database_path: self.database.path,
            jenkins: JenkinsSettings {
                url: self.jenkins.url,
                username: self.jenkins.username,
                token: self.jenkins.token,
                timeout: Duration::from_secs(timeout_secs),
            },
            api_keys: self.api.keys,
        })
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `TRIGGERMESH_LOG_LEVEL`.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(log_level(env::var("TRIGGERMESH_LOG_LEVEL").ok().as_deref()))
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn log_level(value: Option<&str>) -> &'static str {
    value
        .and_then(|value| LOG_LEVELS.iter().find(|level| **level == value))
        .copied()
        .unwrap_or("info")
}
