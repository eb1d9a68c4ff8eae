//! Environment registration: `add env`, `remove env`, and `get envs`.

use std::io::Write;

use tracing::debug;

use crate::cli::{AddEnvArgs, FormatArgs, RemoveEnvArgs};
use crate::client::{CliError, CliResult};
use crate::config::{ConfigError, ConfigPaths, MainConfig};
use crate::credentials::CredentialStore;
use crate::models::EnvironmentRow;
use crate::output::{FormatSpec, print_list, write_line};

const ENV_LIST_FORMAT: &str = "table {{ Name }}\t{{ MiEndpoint }}";
const ENV_HEADERS: &[(&str, &str)] = &[("Name", "NAME"), ("MiEndpoint", "MI ENDPOINT")];

pub(crate) fn handle_add_env(
    paths: &ConfigPaths,
    config: &MainConfig,
    args: &AddEnvArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(CliError::validation("environment name cannot be empty"));
    }
    let mut updated = config.clone();
    updated.add_environment(name, &args.mi).map_err(config_error)?;
    updated.save(&paths.main_config()).map_err(config_error)?;
    debug!(dir = %paths.dir().display(), environment = name, "environment registered");
    write_line(out, &format!("Successfully added environment '{name}'"))
}

/// Remove an environment and any credentials stored for it.
pub(crate) fn handle_remove_env(
    paths: &ConfigPaths,
    config: &MainConfig,
    credentials: &dyn CredentialStore,
    args: &RemoveEnvArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let mut updated = config.clone();
    updated.remove_environment(&args.name).map_err(config_error)?;
    updated.save(&paths.main_config()).map_err(config_error)?;
    if credentials.erase(&args.name).map_err(CliError::failure)? {
        debug!(environment = %args.name, "stored credentials erased");
    }
    write_line(out, &format!("Successfully removed environment '{}'", args.name))
}

pub(crate) fn handle_get_envs(
    config: &MainConfig,
    args: &FormatArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let rows: Vec<EnvironmentRow> = config
        .environments
        .iter()
        .map(|(name, endpoints)| EnvironmentRow {
            name: name.clone(),
            mi_endpoint: endpoints.mi_management_endpoint.clone(),
        })
        .collect();
    let spec = FormatSpec::resolve(args.format.as_deref(), ENV_LIST_FORMAT);
    print_list(out, &rows, &spec, ENV_HEADERS, "No Environments found")
}

fn config_error(err: ConfigError) -> CliError {
    match err {
        ConfigError::DuplicateEnvironment { .. } | ConfigError::UnknownEnvironment { .. } => {
            CliError::validation(err.to_string())
        }
        other => CliError::failure(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;
    use tempfile::TempDir;

    use crate::credentials::{Credential, JsonFileStore};

    fn add_args(name: &str, mi: &str) -> AddEnvArgs {
        AddEnvArgs {
            name: name.to_string(),
            mi: mi.parse::<Url>().expect("url"),
        }
    }

    #[test]
    fn add_env_persists_and_rejects_duplicates() {
        let dir = TempDir::new().expect("temp dir");
        let paths = ConfigPaths::resolve(Some(dir.path().to_path_buf())).expect("paths");
        let mut out = Vec::new();
        handle_add_env(
            &paths,
            &MainConfig::default(),
            &add_args("dev", "https://localhost:9164"),
            &mut out,
        )
        .expect("added");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Successfully added environment 'dev'\n"
        );

        let loaded = MainConfig::load(&paths.main_config()).expect("load");
        assert!(loaded.environments.contains_key("dev"));

        let err = handle_add_env(
            &paths,
            &loaded,
            &add_args("dev", "https://other:9164"),
            &mut Vec::new(),
        )
        .expect_err("duplicate");
        assert!(matches!(err, CliError::Validation(message) if message.contains("already exists")));
    }

    #[test]
    fn remove_env_erases_credentials() {
        let dir = TempDir::new().expect("temp dir");
        let paths = ConfigPaths::resolve(Some(dir.path().to_path_buf())).expect("paths");
        let mut config = MainConfig::default();
        let url: Url = "https://localhost:9164".parse().expect("url");
        config.add_environment("dev", &url).expect("add");
        config.save(&paths.main_config()).expect("save");

        let store = JsonFileStore::new(paths.credentials());
        store
            .set_credentials(
                "dev",
                &Credential {
                    username: "admin".to_string(),
                    password: "admin".to_string(),
                    access_token: "token".to_string(),
                },
            )
            .expect("store");

        let mut out = Vec::new();
        handle_remove_env(
            &paths,
            &config,
            &store,
            &RemoveEnvArgs {
                name: "dev".to_string(),
            },
            &mut out,
        )
        .expect("removed");

        assert!(store.credentials("dev").expect("readable").is_none());
        let loaded = MainConfig::load(&paths.main_config()).expect("load");
        assert!(loaded.environments.is_empty());

        let err = handle_remove_env(
            &paths,
            &loaded,
            &store,
            &RemoveEnvArgs {
                name: "dev".to_string(),
            },
            &mut Vec::new(),
        )
        .expect_err("unknown");
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[test]
    fn get_envs_renders_table_or_empty_message() {
        let mut out = Vec::new();
        handle_get_envs(&MainConfig::default(), &FormatArgs::default(), &mut out).expect("print");
        assert_eq!(String::from_utf8(out).expect("utf8"), "No Environments found\n");

        let mut config = MainConfig::default();
        let url: Url = "https://localhost:9164".parse().expect("url");
        config.add_environment("dev", &url).expect("add");
        let mut out = Vec::new();
        handle_get_envs(&config, &FormatArgs::default(), &mut out).expect("print");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "NAME\tMI ENDPOINT\ndev\thttps://localhost:9164\n"
        );
    }
}
