//! Scaffolder configuration.
//!
//! [`ScaffoldConfig::load`] reads the `[scaffold]` section of
//! `config/config.toml` (optional) layered under environment variables such
//! as `MSSQL_SCAFFOLD__SCAFFOLD__CONNECTION_STRING`.

use crate::emit::Language;
use config::{Config, ConfigError, Environment, File};
use log::warn;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "MSSQL_SCAFFOLD";
const SECTION: &str = "scaffold";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScaffoldConfig {
    #[serde(default = "default_connection_string")]
    pub connection_string: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub safe_mode: bool,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            connection_string: default_connection_string(),
            language: Language::default(),
            safe_mode: false,
        }
    }
}

fn default_connection_string() -> String {
    "Server=tcp:localhost,1433;Trusted_Connection=False;TrustServerCertificate=True;".to_string()
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__")
}

impl ScaffoldConfig {
    /// Load from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from `path` (optional) layered under env vars.
    ///
    /// A file that exists but cannot be parsed is reported with a warning and
    /// ignored. A missing `[scaffold]` section yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(environment());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if path.exists() {
                    warn!(
                        "Failed to load config file {}, falling back to env: {}",
                        path.display(),
                        err
                    );
                }
                Config::builder()
                    .add_source(environment())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        match settings.get::<ScaffoldConfig>(SECTION) {
            Ok(cfg) => Ok(cfg),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Scaffold configuration could not be loaded from file or environment: {}",
                e
            ))),
        }
    }

    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = connection_string.into();
        self
    }
}
