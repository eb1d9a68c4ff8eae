//! `login` and `logout` handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::anyhow;
use tracing::{info, warn};

use crate::cli::LoginArgs;
use crate::client::{AppContext, CliError, CliResult};
use crate::credentials::{Credential, request_access_token, revoke_access_token};
use crate::output::write_line;

/// Log in to an environment and store the credentials with the new token.
pub(crate) async fn handle_login(
    ctx: &AppContext,
    args: LoginArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let username = resolve_username(args.username.as_deref())?;
    let password = resolve_password(args.password.as_deref(), args.password_stdin)?;

    let token = request_access_token(&ctx.client, &ctx.endpoint, &username, &password).await?;
    ctx.credentials
        .set_credentials(
            &ctx.environment,
            &Credential {
                username,
                password,
                access_token: token,
            },
        )
        .map_err(CliError::failure)?;
    if let Some(warning) = ctx.credentials.write_warning() {
        write_line(out, &warning)?;
    }

    info!(environment = %ctx.environment, "stored access token");
    write_line(
        out,
        &format!("Logged into MI in {} environment", ctx.environment),
    )
}

/// Revoke the stored token and forget the credentials of an environment.
pub(crate) async fn handle_logout(ctx: &AppContext, out: &mut dyn Write) -> CliResult<()> {
    let Some(credential) = ctx
        .credentials
        .credentials(&ctx.environment)
        .map_err(CliError::failure)?
    else {
        return write_line(
            out,
            &format!("You are not logged in to {}", ctx.environment),
        );
    };

    if let Err(err) =
        revoke_access_token(&ctx.client, &ctx.endpoint, &credential.access_token).await
    {
        warn!(environment = %ctx.environment, error = %err, "token revocation failed");
    }
    ctx.credentials
        .erase(&ctx.environment)
        .map_err(CliError::failure)?;
    write_line(
        out,
        &format!("Logged out from MI in {} environment", ctx.environment),
    )
}

fn resolve_username(given: Option<&str>) -> CliResult<String> {
    if let Some(value) = given {
        return non_empty(value, "username");
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::validation(
            "username required; supply via --username when running non-interactively",
        ));
    }
    print!("Username: ");
    io::stdout()
        .flush()
        .map_err(|err| CliError::failure(anyhow!("failed to write prompt: {err}")))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| CliError::failure(anyhow!("failed to read username from stdin: {err}")))?;
    non_empty(&line, "username")
}

/// The `--password` value is used as given; stdin and prompt input only
/// lose their line terminator.
fn resolve_password(given: Option<&str>, from_stdin: bool) -> CliResult<String> {
    if let Some(value) = given {
        return required_password(value);
    }
    if from_stdin {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).map_err(|err| {
            CliError::failure(anyhow!("failed to read password from stdin: {err}"))
        })?;
        return required_password(strip_line_terminator(&line));
    }
    if io::stdin().is_terminal() {
        let pass = rpassword::prompt_password("Password: ").map_err(|err| {
            CliError::failure(anyhow!("failed to read password from stdin: {err}"))
        })?;
        required_password(strip_line_terminator(&pass))
    } else {
        Err(CliError::validation(
            "password required; supply via --password or --password-stdin when running non-interactively",
        ))
    }
}

fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn required_password(value: &str) -> CliResult<String> {
    if value.is_empty() {
        Err(CliError::validation("password cannot be empty"))
    } else {
        Ok(value.to_string())
    }
}

fn non_empty(value: &str, what: &str) -> CliResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CliError::validation(format!("{what} cannot be empty")))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::client::tests::context_with;

    fn login_args(username: &str, password: &str) -> LoginArgs {
        LoginArgs {
            environment: "dev".to_string(),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            password_stdin: false,
        }
    }

    #[tokio::test]
    async fn login_stores_new_credentials() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let login = server.mock(|when, then| {
            when.method(GET)
                .path("/management/login")
                .header("authorization", "Basic b3BzOnNlY3JldA==");
            then.status(200).json_body(json!({"AccessToken": "new-token"}));
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        handle_login(&ctx, login_args("ops", "secret"), &mut out)
            .await
            .expect("login succeeds");

        login.assert();
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            format!(
                "WARNING: credentials are stored as a plain text in {}\n\
                 Logged into MI in dev environment\n",
                dir.path().join("keys.json").display()
            )
        );
        let stored = ctx
            .credentials
            .credentials("dev")
            .expect("readable")
            .expect("present");
        assert_eq!(stored.username, "ops");
        assert_eq!(stored.password, "secret");
        assert_eq!(stored.access_token, "new-token");
    }

    #[tokio::test]
    async fn rejected_login_keeps_previous_credentials() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        server.mock(|when, then| {
            when.method(GET).path("/management/login");
            then.status(401);
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        let err = handle_login(&ctx, login_args("ops", "wrong"), &mut out)
            .await
            .expect_err("login rejected");
        assert!(matches!(err, CliError::Unauthorized));
        let stored = ctx
            .credentials
            .credentials("dev")
            .expect("readable")
            .expect("present");
        assert_eq!(stored.access_token, "stale-token");
    }

    #[tokio::test]
    async fn blank_username_is_rejected() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        let err = handle_login(&ctx, login_args("  ", "secret"), &mut out)
            .await
            .expect_err("validation");
        assert!(matches!(err, CliError::Validation(message) if message.contains("username")));
    }

    #[test]
    fn password_flag_is_kept_verbatim() {
        let password = resolve_password(Some("  secret "), false).expect("password");
        assert_eq!(password, "  secret ");
        let err = resolve_password(Some(""), false).expect_err("empty password");
        assert!(matches!(err, CliError::Validation(message) if message.contains("password")));
    }

    #[test]
    fn only_line_terminators_are_stripped() {
        assert_eq!(strip_line_terminator(" pass word \r\n"), " pass word ");
        assert_eq!(strip_line_terminator("secret\n"), "secret");
        assert_eq!(strip_line_terminator("secret "), "secret ");
        assert_eq!(strip_line_terminator("\n"), "");
    }

    #[tokio::test]
    async fn logout_revokes_and_erases() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let logout = server.mock(|when, then| {
            when.method(GET)
                .path("/management/logout")
                .header("authorization", "Bearer stale-token");
            then.status(200).json_body(json!({"Message": "Logout successful"}));
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        handle_logout(&ctx, &mut out).await.expect("logout succeeds");

        logout.assert();
        assert_eq!(String::from_utf8(out).expect("utf8"), "Logged out from MI in dev environment\n");
        assert!(ctx.credentials.credentials("dev").expect("readable").is_none());
    }

    #[tokio::test]
    async fn logout_erases_even_when_revocation_fails() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        server.mock(|when, then| {
            when.method(GET).path("/management/logout");
            then.status(500);
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        handle_logout(&ctx, &mut out).await.expect("logout succeeds");
        assert!(ctx.credentials.credentials("dev").expect("readable").is_none());

        let mut out = Vec::new();
        handle_logout(&ctx, &mut out).await.expect("second logout");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "You are not logged in to dev\n"
        );
    }
}
