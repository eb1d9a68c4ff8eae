//! Persisted Micro Integrator credentials and access-token acquisition.
//!
//! Credentials live in a JSON document keyed by environment name. Every
//! value is base64 encoded; this is obfuscation, not encryption.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::anyhow;
use base64::{Engine as _, engine::general_purpose};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::client::{CliError, CliResult, RawResponse, management_url};
use crate::response::{ERROR_TAG, Envelope, decode_json};

pub(crate) const LOGIN_RESOURCE: &str = "login";
pub(crate) const LOGOUT_RESOURCE: &str = "logout";

/// Errors raised while reading or writing the credential store.
#[derive(Debug, Error)]
pub(crate) enum CredentialError {
    /// The store file exists but could not be read.
    #[error("failed to read credential store {path}")]
    Read {
        /// Location of the store.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The store could not be written back.
    #[error("failed to write credential store {path}")]
    Write {
        /// Location of the store.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The store file is not a valid credential document.
    #[error("credential store {path} is not valid JSON")]
    Parse {
        /// Location of the store.
        path: PathBuf,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
    /// A stored value is not valid base64 text.
    #[error("stored credentials for '{environment}' are corrupt")]
    Decode {
        /// Environment whose entry failed to decode.
        environment: String,
    },
    /// A token update targeted an environment without stored credentials.
    #[error("no credentials stored for environment '{environment}'")]
    Missing {
        /// Environment that was looked up.
        environment: String,
    },
    /// The in-memory document could not be serialised.
    #[error("failed to encode credential store")]
    Encode(#[source] serde_json::Error),
}

/// Username, password, and current access token for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Credential {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) access_token: String,
}

/// Storage for per-environment credentials.
pub(crate) trait CredentialStore: Send + Sync {
    /// Credentials for `environment`, or `None` when nothing is stored.
    fn credentials(&self, environment: &str) -> Result<Option<Credential>, CredentialError>;

    /// Store (or replace) credentials for `environment`.
    fn set_credentials(
        &self,
        environment: &str,
        credential: &Credential,
    ) -> Result<(), CredentialError>;

    /// Replace only the access token, keeping username and password.
    fn update_access_token(&self, environment: &str, token: &str) -> Result<(), CredentialError>;

    /// Remove stored credentials. Returns whether an entry existed.
    fn erase(&self, environment: &str) -> Result<bool, CredentialError>;

    /// Whether credentials are stored for `environment`.
    fn has(&self, environment: &str) -> Result<bool, CredentialError>;

    /// Notice to show after credentials were written, if the store keeps
    /// them readable on disk.
    fn write_warning(&self) -> Option<String>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialDocument {
    #[serde(default)]
    environments: BTreeMap<String, EnvironmentEntry>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EnvironmentEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mi: Option<EncodedCredential>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncodedCredential {
    username: String,
    password: String,
    access_token: String,
}

impl EncodedCredential {
    fn encode(credential: &Credential) -> Self {
        let engine = general_purpose::STANDARD;
        Self {
            username: engine.encode(&credential.username),
            password: engine.encode(&credential.password),
            access_token: engine.encode(&credential.access_token),
        }
    }

    fn decode(&self, environment: &str) -> Result<Credential, CredentialError> {
        let field = |value: &str| {
            general_purpose::STANDARD
                .decode(value)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .ok_or_else(|| CredentialError::Decode {
                    environment: environment.to_string(),
                })
        };
        Ok(Credential {
            username: field(&self.username)?,
            password: field(&self.password)?,
            access_token: field(&self.access_token)?,
        })
    }
}

/// Credential store backed by a JSON file in the config directory.
#[derive(Debug, Clone)]
pub(crate) struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub(crate) const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<CredentialDocument, CredentialError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(CredentialDocument::default());
            }
            Err(source) => {
                return Err(CredentialError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(CredentialDocument::default());
        }
        serde_json::from_slice(&raw).map_err(|source| CredentialError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, document: &CredentialDocument) -> Result<(), CredentialError> {
        let text = serde_json::to_vec_pretty(document).map_err(CredentialError::Encode)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| CredentialError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, text).map_err(|source| CredentialError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl CredentialStore for JsonFileStore {
    fn credentials(&self, environment: &str) -> Result<Option<Credential>, CredentialError> {
        let document = self.load()?;
        document
            .environments
            .get(environment)
            .and_then(|entry| entry.mi.as_ref())
            .map(|encoded| encoded.decode(environment))
            .transpose()
    }

    fn set_credentials(
        &self,
        environment: &str,
        credential: &Credential,
    ) -> Result<(), CredentialError> {
        let mut document = self.load()?;
        document
            .environments
            .entry(environment.to_string())
            .or_default()
            .mi = Some(EncodedCredential::encode(credential));
        self.save(&document)
    }

    fn update_access_token(&self, environment: &str, token: &str) -> Result<(), CredentialError> {
        let mut credential =
            self.credentials(environment)?
                .ok_or_else(|| CredentialError::Missing {
                    environment: environment.to_string(),
                })?;
        credential.access_token = token.to_string();
        self.set_credentials(environment, &credential)
    }

    fn erase(&self, environment: &str) -> Result<bool, CredentialError> {
        let mut document = self.load()?;
        let existed = document
            .environments
            .get_mut(environment)
            .and_then(|entry| entry.mi.take())
            .is_some();
        document
            .environments
            .retain(|_, entry| entry.mi.is_some());
        if existed {
            self.save(&document)?;
        }
        Ok(existed)
    }

    fn has(&self, environment: &str) -> Result<bool, CredentialError> {
        let document = self.load()?;
        Ok(document
            .environments
            .get(environment)
            .is_some_and(|entry| entry.mi.is_some()))
    }

    fn write_warning(&self) -> Option<String> {
        Some(format!(
            "WARNING: credentials are stored as a plain text in {}",
            self.path.display()
        ))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "AccessToken")]
    access_token: String,
}

/// Exchange a username and password for a management API access token.
pub(crate) async fn request_access_token(
    client: &Client,
    endpoint: &Url,
    username: &str,
    password: &str,
) -> CliResult<String> {
    let url = management_url(endpoint, &[LOGIN_RESOURCE])?;
    debug!(url = %url, "requesting access token");
    let response = client
        .get(url.clone())
        .basic_auth(username, Some(password))
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to {url} failed: {err}")))?;
    let raw = RawResponse::read(response).await?;

    match decode_json::<TokenResponse>(&raw, ERROR_TAG)? {
        Envelope::Success(token) => Ok(token.access_token),
        Envelope::Failure { message, .. } => {
            Err(CliError::failure(anyhow!("login failed: {message}")))
        }
    }
}

/// Invalidate an access token on the server.
pub(crate) async fn revoke_access_token(
    client: &Client,
    endpoint: &Url,
    token: &str,
) -> CliResult<()> {
    let url = management_url(endpoint, &[LOGOUT_RESOURCE])?;
    let response = client
        .get(url.clone())
        .bearer_auth(token)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to {url} failed: {err}")))?;
    let raw = RawResponse::read(response).await?;
    if raw.status.is_success() {
        Ok(())
    } else {
        Err(CliError::failure(anyhow!(
            "logout failed with status {}",
            raw.status
        )))
    }
}
