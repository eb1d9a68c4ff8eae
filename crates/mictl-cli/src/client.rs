//! Shared client utilities: error types, invocation context, and the
//! authenticated request helper used by every management API call.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ConfigPaths, MainConfig};
use crate::credentials::{CredentialStore, JsonFileStore, request_access_token};

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const MANAGEMENT_CONTEXT: &str = "management";

/// Total number of sends allowed for one logical request. A 401 consumes
/// one attempt and triggers a token refresh before the next.
pub(crate) const RETRY_BUDGET: u32 = 2;

/// CLI-level error type separating user mistakes, server-reported
/// conditions, and operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    /// Message reported by the server for a non-success status. Handlers
    /// print it and finish normally.
    Domain(String),
    Unauthorized,
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Domain(_) => 1,
            Self::Validation(_) => 2,
            Self::Failure(_) | Self::Unauthorized => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Domain(message) => message.clone(),
            Self::Unauthorized => "Invalid credentials. Please login to the current Micro Integrator instance (run `mictl login <environment>`)".to_string(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

/// Dependencies constructed once per invocation from flags and the config
/// directory.
#[derive(Clone)]
pub(crate) struct CliDependencies {
    pub(crate) client: Client,
    pub(crate) paths: ConfigPaths,
    pub(crate) config: MainConfig,
    pub(crate) credentials: Arc<dyn CredentialStore>,
}

/// Options that shape the HTTP client, gathered from global flags.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClientOptions {
    pub(crate) config_dir: Option<PathBuf>,
    pub(crate) timeout_ms: Option<u64>,
    pub(crate) insecure: bool,
}

impl CliDependencies {
    /// Load configuration and build the HTTP client for this invocation.
    pub(crate) fn from_options(options: &ClientOptions, trace_id: &str) -> CliResult<Self> {
        let paths = ConfigPaths::resolve(options.config_dir.clone()).map_err(CliError::failure)?;
        let config = MainConfig::load(&paths.main_config()).map_err(CliError::failure)?;

        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let timeout_ms = options
            .timeout_ms
            .unwrap_or(config.config.http_request_timeout);
        let insecure = options.insecure || config.config.skip_tls_verification;

        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .danger_accept_invalid_certs(insecure)
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        let credentials: Arc<dyn CredentialStore> =
            Arc::new(JsonFileStore::new(paths.credentials()));

        Ok(Self {
            client,
            paths,
            config,
            credentials,
        })
    }

    /// Build the context for commands that target a registered environment.
    pub(crate) fn context(&self, environment: &str) -> CliResult<AppContext> {
        let endpoint = self
            .config
            .endpoint(environment)
            .map_err(|err| CliError::validation(err.to_string()))?;
        Ok(AppContext {
            client: self.client.clone(),
            environment: environment.to_string(),
            endpoint,
            credentials: Arc::clone(&self.credentials),
        })
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: Client,
    pub(crate) environment: String,
    pub(crate) endpoint: Url,
    pub(crate) credentials: Arc<dyn CredentialStore>,
}

impl AppContext {
    /// URL of a management resource on this context's endpoint.
    pub(crate) fn management_url(&self, segments: &[&str]) -> CliResult<Url> {
        management_url(&self.endpoint, segments)
    }

    /// Send an authenticated request, refreshing the access token once when
    /// the server answers 401.
    pub(crate) async fn execute(&self, request: &RequestSpec) -> CliResult<RawResponse> {
        let not_logged_in = || {
            CliError::validation(format!(
                "no credentials stored for environment '{env}'; run `mictl login {env}`",
                env = self.environment
            ))
        };
        if !self
            .credentials
            .has(&self.environment)
            .map_err(CliError::failure)?
        {
            return Err(not_logged_in());
        }
        let mut credential = self
            .credentials
            .credentials(&self.environment)
            .map_err(CliError::failure)?
            .ok_or_else(not_logged_in)?;

        let mut attempts_left = RETRY_BUDGET;
        loop {
            attempts_left -= 1;
            let response = self.send_once(request, &credential.access_token).await?;
            if response.status != StatusCode::UNAUTHORIZED || attempts_left == 0 {
                return Ok(response);
            }

            warn!(
                environment = %self.environment,
                "access token rejected; requesting a new one"
            );
            let token = request_access_token(
                &self.client,
                &self.endpoint,
                &credential.username,
                &credential.password,
            )
            .await?;
            self.credentials
                .update_access_token(&self.environment, &token)
                .map_err(CliError::failure)?;
            if let Some(warning) = self.credentials.write_warning() {
                eprintln!("{warning}");
            }
            credential.access_token = token;
        }
    }

    async fn send_once(&self, request: &RequestSpec, token: &str) -> CliResult<RawResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .bearer_auth(token)
            .header(ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %request.url, "sending request");
        let response = builder.send().await.map_err(|err| {
            CliError::failure(anyhow!("request to {} failed: {err}", request.url))
        })?;
        RawResponse::read(response).await
    }
}

/// Description of one management API call. Query parameters are kept sorted
/// by key so the emitted URL is deterministic.
#[derive(Debug, Clone)]
pub(crate) struct RequestSpec {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) query: BTreeMap<String, String>,
    pub(crate) body: Option<Value>,
}

impl RequestSpec {
    pub(crate) const fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            query: BTreeMap::new(),
            body: None,
        }
    }

    pub(crate) const fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub(crate) const fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub(crate) fn post(url: Url, body: Value) -> Self {
        Self::new(Method::POST, url).body(body)
    }

    pub(crate) fn put(url: Url, body: Value) -> Self {
        Self::new(Method::PUT, url).body(body)
    }

    pub(crate) fn patch(url: Url, body: Value) -> Self {
        Self::new(Method::PATCH, url).body(body)
    }

    #[must_use]
    pub(crate) fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub(crate) fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.insert(key.to_string(), value.into());
        self
    }

    /// Add a query parameter only when the value is present and non-empty.
    #[must_use]
    pub(crate) fn query_opt(self, key: &str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => self.query(key, value),
            None => self,
        }
    }
}

/// Status and fully-read body of an HTTP response.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub(crate) status: StatusCode,
    pub(crate) body: Vec<u8>,
}

impl RawResponse {
    pub(crate) async fn read(response: reqwest::Response) -> CliResult<Self> {
        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await.map_err(|err| {
            CliError::failure(anyhow!("failed to read response from {url}: {err}"))
        })?;
        debug!(status = %status, url = %url, bytes = body.len(), "response received");
        Ok(Self {
            status,
            body: body.to_vec(),
        })
    }
}

/// Build `<endpoint>/management/<segments...>`, percent-encoding each
/// segment and tolerating a trailing slash on the endpoint.
pub(crate) fn management_url(endpoint: &Url, segments: &[&str]) -> CliResult<Url> {
    let mut url = endpoint.clone();
    url.set_query(None);
    {
        let mut path = url.path_segments_mut().map_err(|()| {
            CliError::failure(anyhow!("invalid base URL: {endpoint} cannot carry a path"))
        })?;
        path.pop_if_empty().push(MANAGEMENT_CONTEXT);
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

/// Parse a management endpoint URL provided on the command line.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    let url = input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))?;
    if matches!(url.scheme(), "http" | "https") {
        Ok(url)
    } else {
        Err(format!("invalid URL '{input}': scheme must be http or https"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::credentials::Credential;

    /// Context wired to a mock server with credentials stored in a temp dir.
    pub(crate) fn context_with(server: &MockServer, dir: &TempDir) -> AppContext {
        let store = JsonFileStore::new(dir.path().join("keys.json"));
        store
            .set_credentials(
                "dev",
                &Credential {
                    username: "admin".to_string(),
                    password: "admin".to_string(),
                    access_token: "stale-token".to_string(),
                },
            )
            .expect("credentials should persist");
        AppContext {
            client: Client::new(),
            environment: "dev".to_string(),
            endpoint: server.base_url().parse().expect("valid URL"),
            credentials: Arc::new(store),
        }
    }

    #[test]
    fn management_url_appends_segments_once() {
        let endpoint: Url = "https://localhost:9164/".parse().expect("valid URL");
        let url = management_url(&endpoint, &["users", "jane doe"]).expect("url");
        assert_eq!(url.as_str(), "https://localhost:9164/management/users/jane%20doe");

        let endpoint: Url = "https://localhost:9164".parse().expect("valid URL");
        let url = management_url(&endpoint, &["endpoints"]).expect("url");
        assert_eq!(url.as_str(), "https://localhost:9164/management/endpoints");
    }

    #[test]
    fn parse_url_rejects_non_http_schemes() {
        assert!(parse_url("https://localhost:9164").is_ok());
        let err = parse_url("ftp://localhost").expect_err("ftp is rejected");
        assert!(err.contains("scheme"));
        assert!(parse_url("not a url").is_err());
    }

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::validation("bad").exit_code(), 2);
        assert_eq!(CliError::domain("gone").exit_code(), 1);
        assert_eq!(CliError::Unauthorized.exit_code(), 3);
        assert_eq!(CliError::failure(anyhow!("boom")).exit_code(), 3);
        assert!(
            CliError::Unauthorized
                .display_message()
                .starts_with("Invalid credentials")
        );
    }

    #[tokio::test]
    async fn execute_sends_bearer_token_and_sorted_query() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/management/users")
                .query_param("pattern", "adm")
                .query_param("role", "admin")
                .header("authorization", "Bearer stale-token");
            then.status(200).json_body(json!({"count": 0, "list": []}));
        });

        let ctx = context_with(&server, &dir);
        let url = ctx.management_url(&["users"]).expect("url");
        let request = RequestSpec::get(url)
            .query("role", "admin")
            .query_opt("pattern", Some("adm"))
            .query_opt("domain", Some("  "));
        let response = ctx.execute(&request).await.expect("request succeeds");

        assert_eq!(response.status, StatusCode::OK);
        mock.assert();
    }

    #[tokio::test]
    async fn unauthorized_triggers_single_refresh_and_retry() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let stale = server.mock(|when, then| {
            when.method(GET)
                .path("/management/endpoints")
                .header("authorization", "Bearer stale-token");
            then.status(401);
        });
        let login = server.mock(|when, then| {
            when.method(GET)
                .path("/management/login")
                .header("authorization", "Basic YWRtaW46YWRtaW4=");
            then.status(200).json_body(json!({"AccessToken": "fresh-token"}));
        });
        let fresh = server.mock(|when, then| {
            when.method(GET)
                .path("/management/endpoints")
                .header("authorization", "Bearer fresh-token");
            then.status(200).json_body(json!({"count": 0, "list": []}));
        });

        let ctx = context_with(&server, &dir);
        let url = ctx.management_url(&["endpoints"]).expect("url");
        let response = ctx
            .execute(&RequestSpec::get(url))
            .await
            .expect("retry succeeds");

        assert_eq!(response.status, StatusCode::OK);
        stale.assert_calls(1);
        login.assert_calls(1);
        fresh.assert_calls(1);
        let stored = ctx
            .credentials
            .credentials("dev")
            .expect("store readable")
            .expect("credential present");
        assert_eq!(stored.access_token, "fresh-token");
    }

    #[tokio::test]
    async fn second_unauthorized_is_returned_without_third_attempt() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let rejected = server.mock(|when, then| {
            when.method(GET).path("/management/apis");
            then.status(401);
        });
        let login = server.mock(|when, then| {
            when.method(GET).path("/management/login");
            then.status(200).json_body(json!({"AccessToken": "still-bad"}));
        });

        let ctx = context_with(&server, &dir);
        let url = ctx.management_url(&["apis"]).expect("url");
        let response = ctx
            .execute(&RequestSpec::get(url))
            .await
            .expect("second 401 is handed back");

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        rejected.assert_calls(2);
        login.assert_calls(1);
    }

    #[tokio::test]
    async fn missing_credentials_is_a_validation_error() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let ctx = AppContext {
            client: Client::new(),
            environment: "prod".to_string(),
            endpoint: server.base_url().parse().expect("valid URL"),
            credentials: Arc::new(JsonFileStore::new(dir.path().join("keys.json"))),
        };
        let url = ctx.management_url(&["apis"]).expect("url");
        let err = ctx
            .execute(&RequestSpec::get(url))
            .await
            .expect_err("no credentials");
        assert!(matches!(err, CliError::Validation(message) if message.contains("mictl login prod")));
    }
}
