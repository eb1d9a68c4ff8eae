//! On-disk configuration: client settings and registered environments.
//!
//! Configuration lives in `~/.mictl/main_config.yaml` unless a config
//! directory is given with `--config-dir` or `MICTL_CONFIG_DIR`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::parse_url;

/// Default configuration directory name under the home directory.
pub(crate) const DEFAULT_BASE_DIR: &str = ".mictl";
/// Main configuration filename.
pub(crate) const MAIN_CONFIG_FILE: &str = "main_config.yaml";
/// Credential store filename.
pub(crate) const CREDENTIALS_FILE: &str = "keys.json";
/// Default HTTP timeout in milliseconds.
pub(crate) const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

/// Errors raised while loading or updating configuration.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// No config directory was given and the home directory is unknown.
    #[error("cannot determine the home directory; pass --config-dir")]
    HomeDirUnavailable,
    /// Reading or writing a config file failed.
    #[error("failed to access {path}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The main config file is not valid YAML for this schema.
    #[error("{path} is not a valid configuration file")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying YAML failure.
        #[source]
        source: serde_yaml::Error,
    },
    /// The configuration could not be serialised.
    #[error("failed to encode configuration")]
    Encode(#[source] serde_yaml::Error),
    /// An environment with the same name is already registered.
    #[error("environment '{name}' already exists")]
    DuplicateEnvironment {
        /// Environment name.
        name: String,
    },
    /// The environment is not registered.
    #[error("environment '{name}' does not exist; add it with `mictl add env {name} --mi <url>`")]
    UnknownEnvironment {
        /// Environment name.
        name: String,
    },
    /// The environment's endpoint is not a usable URL.
    #[error("environment '{name}' has an invalid endpoint: {reason}")]
    InvalidEndpoint {
        /// Environment name.
        name: String,
        /// Parser message.
        reason: String,
    },
}

/// Locations of the files mictl reads and writes.
#[derive(Debug, Clone)]
pub(crate) struct ConfigPaths {
    dir: PathBuf,
}

impl ConfigPaths {
    /// Use the override when given, else `~/.mictl`.
    pub(crate) fn resolve(override_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        let dir = match override_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .map(|home| home.join(DEFAULT_BASE_DIR))
                .ok_or(ConfigError::HomeDirUnavailable)?,
        };
        Ok(Self { dir })
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn main_config(&self) -> PathBuf {
        self.dir.join(MAIN_CONFIG_FILE)
    }

    pub(crate) fn credentials(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }
}

/// Contents of `main_config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MainConfig {
    #[serde(default)]
    pub(crate) config: ClientSettings,
    #[serde(default)]
    pub(crate) environments: BTreeMap<String, EnvironmentEndpoints>,
}

/// HTTP client settings shared by every environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ClientSettings {
    #[serde(default = "default_timeout")]
    pub(crate) http_request_timeout: u64,
    #[serde(default)]
    pub(crate) skip_tls_verification: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            http_request_timeout: DEFAULT_HTTP_TIMEOUT_MS,
            skip_tls_verification: false,
        }
    }
}

const fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

/// Endpoints registered for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct EnvironmentEndpoints {
    pub(crate) mi_management_endpoint: String,
}

impl MainConfig {
    /// Load the config file; a missing file yields the defaults.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the config file, creating its directory when needed.
    pub(crate) fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self).map_err(ConfigError::Encode)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Register a new environment.
    pub(crate) fn add_environment(&mut self, name: &str, endpoint: &Url) -> Result<(), ConfigError> {
        if self.environments.contains_key(name) {
            return Err(ConfigError::DuplicateEnvironment {
                name: name.to_string(),
            });
        }
        self.environments.insert(
            name.to_string(),
            EnvironmentEndpoints {
                mi_management_endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
            },
        );
        Ok(())
    }

    /// Remove an environment.
    pub(crate) fn remove_environment(&mut self, name: &str) -> Result<(), ConfigError> {
        self.environments
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ConfigError::UnknownEnvironment {
                name: name.to_string(),
            })
    }

    /// Management endpoint of a registered environment.
    pub(crate) fn endpoint(&self, name: &str) -> Result<Url, ConfigError> {
        let entry = self
            .environments
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEnvironment {
                name: name.to_string(),
            })?;
        parse_url(&entry.mi_management_endpoint).map_err(|reason| ConfigError::InvalidEndpoint {
            name: name.to_string(),
            reason,
        })
    }
}
