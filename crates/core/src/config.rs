//! Application configuration.
//!
//! Settings are layered: built-in defaults, then `config.toml` under the
//! user's config directory, then `AEROLINES_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{directory::DEFAULT_EMAIL_DOMAIN, save::DEFAULT_USERS_FILE};

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "aerolines";

/// Prefix of the environment variables that override the file layer.
pub const ENV_PREFIX: &str = "AEROLINES";

const DEFAULT_INITIAL_FLIGHTS: i64 = 10;

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Aerolines configuration

# Directory holding the user store. Defaults to the platform data directory.
# data_dir = "/home/me/.local/share/aerolines"

# File name of the user store inside data_dir.
users_file = "users.json"

# Random flights generated at startup.
initial_flights = 10

# Logins must use an address at this domain.
email_domain = "gmail.com"

# Give seats back when a booking is cancelled.
restore_seats_on_cancel = false

# Fix the flight generator seed for a reproducible board.
# rng_seed = 42
"#;

/// Runtime settings for the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the user store.
    pub data_dir: PathBuf,
    /// File name of the user store.
    pub users_file: String,
    /// Random flights generated at startup.
    pub initial_flights: usize,
    /// Required login email domain.
    pub email_domain: String,
    /// Whether cancellation restores deducted seats.
    pub restore_seats_on_cancel: bool,
    /// Seed for the flight generator; random when absent.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            users_file: DEFAULT_USERS_FILE.to_string(),
            initial_flights: DEFAULT_INITIAL_FLIGHTS as usize,
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
            restore_seats_on_cancel: false,
            rng_seed: None,
        }
    }
}

impl AppConfig {
    /// Load from the default config file location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load with `path` as the file layer. A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    /// Load with `path` as the file layer and `env` as the top layer.
    pub fn load_with(path: impl AsRef<Path>, env: Environment) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .set_default("data_dir", default_data_dir().to_string_lossy().to_string())?
            .set_default("users_file", DEFAULT_USERS_FILE)?
            .set_default("initial_flights", DEFAULT_INITIAL_FLIGHTS)?
            .set_default("email_domain", DEFAULT_EMAIL_DOMAIN)?
            .set_default("restore_seats_on_cancel", false)?
            .add_source(File::from(path).required(false))
            .add_source(env)
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Full path of the user store.
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }
}

/// Location of `config.toml` under the platform config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write the commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write default config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_from(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(map))
    }

    #[test]
    fn default_template_matches_builtin_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("aerolines/config.toml");
        write_default_config(&path)?;
        assert!(path.exists());

        let config = AppConfig::load_with(&path, env_from(&[]))?;
        let defaults = AppConfig::default();
        assert_eq!(config.users_file, defaults.users_file);
        assert_eq!(config.initial_flights, 10);
        assert_eq!(config.email_domain, "gmail.com");
        assert!(!config.restore_seats_on_cancel);
        assert_eq!(config.rng_seed, None);
        Ok(())
    }

    #[test]
    fn existing_config_is_not_overwritten() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
data_dir = "/tmp/aerolines-test"
users_file = "people.json"
initial_flights = 3
restore_seats_on_cancel = true
rng_seed = 42
"#,
        )?;
        write_default_config(&path)?;

        let config = AppConfig::load_with(&path, env_from(&[]))?;
        assert_eq!(config.initial_flights, 3);
        assert!(config.restore_seats_on_cancel);
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(
            config.users_path(),
            PathBuf::from("/tmp/aerolines-test/people.json")
        );
        Ok(())
    }

    #[test]
    fn missing_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_with(dir.path().join("absent.toml"), env_from(&[]))?;
        assert_eq!(config.users_file, DEFAULT_USERS_FILE);
        assert_eq!(config.email_domain, DEFAULT_EMAIL_DOMAIN);
        Ok(())
    }

    #[test]
    fn environment_overrides_file_values() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
initial_flights = 4
email_domain = "airline.test"
restore_seats_on_cancel = false
rng_seed = 1
"#,
        )?;

        let env = env_from(&[
            ("AEROLINES_EMAIL_DOMAIN", "example.org"),
            ("AEROLINES_RESTORE_SEATS_ON_CANCEL", "true"),
            ("AEROLINES_RNG_SEED", "7"),
        ]);
        let config = AppConfig::load_with(&path, env)?;
        assert_eq!(config.email_domain, "example.org");
        assert!(config.restore_seats_on_cancel);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.initial_flights, 4);
        Ok(())
    }
}
