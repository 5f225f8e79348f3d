//! Profiles of the `oli` command line
//!
//! A profile names one configured service:
//!
//! ```toml
//! [profiles.cache]
//! type = "redis"
//! endpoint = "tcp://127.0.0.1:6379"
//! root = "/oli"
//! ```
//!
//! The same profile can come from the environment as
//! `OLI_PROFILES__CACHE__TYPE=redis`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, Environment, File, FileFormat, Value};
use opendal_common::Scheme;
use thiserror::Error;
use tracing::debug;

const ENV_PREFIX: &str = "OLI";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("profile '{0}' not found")]
    NotFound(String),

    #[error("profile '{0}' has no 'type'")]
    MissingType(String),

    #[error("profile '{profile}' has invalid type '{scheme}'")]
    InvalidScheme { profile: String, scheme: String },

    #[error("profile '{profile}' has invalid value for '{key}'")]
    InvalidValue { profile: String, key: String },
}

/// One resolved profile, ready for `opendal_services::build`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub scheme: Scheme,
    pub options: HashMap<String, String>,
}

/// All profiles from the config file and the environment
#[derive(Debug, Clone)]
pub struct Profiles {
    config: Config,
}

impl Profiles {
    /// `$HOME/.config/oli/config.toml`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(".config/oli/config.toml")
    }

    /// Load profiles from `path` (optional) and `OLI_*` variables, the
    /// environment wins.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        debug!(path = %path.display(), "loading oli profiles");

        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(Self { config })
    }

    /// Load from an in-memory TOML document, used by tests.
    pub fn from_toml(content: &str) -> Result<Self, ProfileError> {
        let config = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;
        Ok(Self { config })
    }

    pub fn get(&self, name: &str) -> Result<Profile, ProfileError> {
        let table = self
            .config
            .get_table(&format!("profiles.{name}"))
            .map_err(|_| ProfileError::NotFound(name.to_string()))?;

        let mut options = HashMap::with_capacity(table.len());
        for (key, value) in table {
            let value = to_string(value).ok_or_else(|| ProfileError::InvalidValue {
                profile: name.to_string(),
                key: key.clone(),
            })?;
            options.insert(key, value);
        }

        let ty = options
            .remove("type")
            .ok_or_else(|| ProfileError::MissingType(name.to_string()))?;
        let scheme = Scheme::from_str(&ty).map_err(|_| ProfileError::InvalidScheme {
            profile: name.to_string(),
            scheme: ty.clone(),
        })?;

        Ok(Profile { scheme, options })
    }
}

fn to_string(value: Value) -> Option<String> {
    // Tables and arrays can't be passed to a builder map.
    value.into_string().ok()
}
