// crates/provisioner-config/tests/common/mod.rs
// ============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for configuration tests.
// Purpose: Keep config fixtures short and failure messages readable.
// Dependencies: provisioner-config, tempfile
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::PathBuf;

use provisioner_config::BrokerConfig;
use provisioner_config::ConfigError;
use tempfile::TempDir;

pub type TestResult = Result<(), String>;

/// Parses TOML into a validated config.
pub fn config_from_toml(toml_str: &str) -> Result<BrokerConfig, ConfigError> {
    BrokerConfig::from_toml_str(toml_str)
}

/// Writes a config file into a fresh temp dir.
pub fn write_config(contents: &str) -> Result<(TempDir, PathBuf), String> {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("provisioner.toml");
    fs::write(&path, contents).map_err(|err| err.to_string())?;
    Ok((dir, path))
}

/// Asserts a config result is invalid and the error mentions `needle`.
pub fn assert_invalid(result: Result<BrokerConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Ok(_) => Err(format!("expected invalid config containing {needle:?}")),
        Err(err) => {
            let message = err.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message:?} does not contain {needle:?}"))
            }
        }
    }
}
