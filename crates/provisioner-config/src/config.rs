// crates/provisioner-config/src/config.rs
// ============================================================================
// Module: Provisioner Configuration
// Description: Configuration loading and validation for the provisioner.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: provisioner-core, provisioner-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed. Per-service tables under
//! `[service.<name>]` are kept as raw TOML and flattened into
//! `service.<name>.<field>` properties for the layered lookup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use provisioner_core::ConfigValue;
use provisioner_core::InMemoryJobStore;
use provisioner_core::JobStore;
use provisioner_core::PollPolicy;
use provisioner_store_sqlite::SqliteJobStore;
use provisioner_store_sqlite::SqliteJournalMode;
use provisioner_store_sqlite::SqliteStoreConfig;
use provisioner_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "provisioner.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PROVISIONER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Largest accepted poll growth factor.
const MAX_POLL_MULTIPLIER: u32 = 16;
/// Default busy timeout for the sqlite job store (ms).
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Broker Config
// ============================================================================

/// Root configuration of the provisioner.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrokerConfig {
    /// Job polling configuration.
    #[serde(default)]
    pub jobs: JobsConfig,
    /// Job store configuration.
    #[serde(default)]
    pub job_store: JobStoreConfig,
    /// Per-service override tables keyed by service name.
    #[serde(default)]
    pub service: BTreeMap<String, toml::Table>,
}

impl BrokerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jobs.validate()?;
        self.job_store.validate()?;
        for (name, table) in &self.service {
            validate_service_name(name)?;
            if let Some(field) = table.keys().find(|field| field.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!("service.{name} has an empty field name {field:?}")));
            }
        }
        Ok(())
    }

    /// Flattens `[service.<name>]` tables into `service.<name>.<field>` properties.
    #[must_use]
    pub fn service_properties(&self) -> BTreeMap<String, ConfigValue> {
        let mut properties = BTreeMap::new();
        for (name, table) in &self.service {
            for (field, value) in table {
                properties.insert(format!("service.{name}.{field}"), toml_to_config_value(value));
            }
        }
        properties
    }
}

// ============================================================================
// SECTION: Jobs Config
// ============================================================================

/// Polling configuration for blocking job waits.
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// First poll delay in milliseconds.
    #[serde(default = "default_poll_initial_ms")]
    pub poll_initial_ms: u64,
    /// Poll delay cap in milliseconds.
    #[serde(default = "default_poll_max_ms")]
    pub poll_max_ms: u64,
    /// Growth factor between polls.
    #[serde(default = "default_poll_multiplier")]
    pub poll_multiplier: u32,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_initial_ms: default_poll_initial_ms(),
            poll_max_ms: default_poll_max_ms(),
            poll_multiplier: default_poll_multiplier(),
        }
    }
}

impl JobsConfig {
    /// Validates polling bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_initial_ms == 0 {
            return Err(ConfigError::Invalid("jobs.poll_initial_ms must be greater than zero".to_string()));
        }
        if self.poll_max_ms < self.poll_initial_ms {
            return Err(ConfigError::Invalid(
                "jobs.poll_max_ms must be greater than or equal to jobs.poll_initial_ms".to_string(),
            ));
        }
        if !(1..=MAX_POLL_MULTIPLIER).contains(&self.poll_multiplier) {
            return Err(ConfigError::Invalid(format!(
                "jobs.poll_multiplier must be between 1 and {MAX_POLL_MULTIPLIER}"
            )));
        }
        Ok(())
    }

    /// Returns the configured poll policy.
    #[must_use]
    pub const fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            initial: Duration::from_millis(self.poll_initial_ms),
            max: Duration::from_millis(self.poll_max_ms),
            multiplier: self.poll_multiplier,
        }
    }
}

/// Returns the default first poll delay.
const fn default_poll_initial_ms() -> u64 {
    500
}

/// Returns the default poll delay cap.
const fn default_poll_max_ms() -> u64 {
    10_000
}

/// Returns the default poll growth factor.
const fn default_poll_multiplier() -> u32 {
    2
}

// ============================================================================
// SECTION: Job Store Config
// ============================================================================

/// Job store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: JobStoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Optional max versions to retain per job.
    #[serde(default)]
    pub max_versions: Option<u64>,
}

impl Default for JobStoreConfig {
    fn default() -> Self {
        Self {
            store_type: JobStoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
            max_versions: None,
        }
    }
}

impl JobStoreConfig {
    /// Validates job store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            JobStoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory job_store must not set path".to_string()));
                }
                Ok(())
            }
            JobStoreType::Sqlite => {
                let path = self
                    .path
                    .as_ref()
                    .ok_or_else(|| ConfigError::Invalid("sqlite job_store requires path".to_string()))?;
                validate_store_path(path)?;
                if self.max_versions == Some(0) {
                    return Err(ConfigError::Invalid(
                        "job_store max_versions must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Builds the configured job store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid or the
    /// store cannot be opened.
    pub fn open(&self) -> Result<Arc<dyn JobStore>, ConfigError> {
        self.validate()?;
        match (self.store_type, &self.path) {
            (JobStoreType::Memory, _) => Ok(Arc::new(InMemoryJobStore::new())),
            (JobStoreType::Sqlite, Some(path)) => {
                let store = SqliteJobStore::open(SqliteStoreConfig {
                    path: path.clone(),
                    busy_timeout_ms: self.busy_timeout_ms,
                    journal_mode: self.journal_mode,
                    sync_mode: self.sync_mode,
                    max_versions: self.max_versions,
                })
                .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(store))
            }
            (JobStoreType::Sqlite, None) => {
                Err(ConfigError::Invalid("sqlite job_store requires path".to_string()))
            }
        }
    }
}

/// Job store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against length limits, naming the field in errors.
fn check_path_limits(field: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if path.components().any(|component| component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH) {
        return Err(ConfigError::Invalid(format!("{field} component too long")));
    }
    Ok(())
}

/// Validates the resolved config path.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    check_path_limits("config path", path)
}

/// Validates job store paths.
fn validate_store_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("job_store path must be non-empty".to_string()));
    }
    check_path_limits("job_store path", path)
}

/// Validates a `[service.<name>]` table name.
fn validate_service_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid("service name must be non-empty".to_string()));
    }
    if name.contains('.') {
        return Err(ConfigError::Invalid(format!("service name {name:?} must not contain '.'")));
    }
    Ok(())
}

/// Converts a TOML value into a configuration value.
///
/// Tables and arrays become JSON so that definitions and plan lists may be
/// written natively in TOML.
fn toml_to_config_value(value: &toml::Value) -> ConfigValue {
    match value {
        toml::Value::Boolean(flag) => ConfigValue::Bool(*flag),
        toml::Value::Integer(number) => ConfigValue::Integer(*number),
        toml::Value::Float(number) => ConfigValue::Float(*number),
        toml::Value::String(text) => ConfigValue::String(text.clone()),
        toml::Value::Datetime(datetime) => ConfigValue::String(datetime.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => serde_json::to_value(value)
            .map_or_else(|_| ConfigValue::String(value.to_string()), ConfigValue::Json),
    }
}
