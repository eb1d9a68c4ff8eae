//! Logger level inspection and changes through the `logging` resource.

use std::io::Write;

use serde_json::json;

use crate::cli::{AddLoggerArgs, GetLogLevelArgs, UpdateLogLevelArgs};
use crate::client::{AppContext, CliResult, RequestSpec};
use crate::models::LoggerDetail;
use crate::output::{FormatSpec, print_detail, report_domain, write_line};
use crate::response::{ERROR_TAG, decode_json, decode_message};

const LOGGING_RESOURCE: &str = "logging";
const MESSAGE_TAG: &str = "message";
const LOGGER_DETAIL_FORMAT: &str =
    "detail Name - {{ Name }}\nComponent - {{ ComponentName }}\nLevel - {{ Level }}";

pub(crate) async fn handle_get_log_level(
    ctx: &AppContext,
    args: GetLogLevelArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let url = ctx.management_url(&[LOGGING_RESOURCE])?;
    let request = RequestSpec::get(url).query("loggerName", args.logger.trim());
    let raw = ctx.execute(&request).await?;
    let result = decode_json::<LoggerDetail>(&raw, ERROR_TAG)?.into_result();
    let context = format!("getting information of logger [ {} ]", args.logger);
    if let Some(logger) = report_domain(out, &context, result)? {
        let spec = FormatSpec::resolve_detail(args.target.format.as_deref(), LOGGER_DETAIL_FORMAT);
        print_detail(out, &logger, &spec)?;
    }
    Ok(())
}

pub(crate) async fn handle_update_log_level(
    ctx: &AppContext,
    args: UpdateLogLevelArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let body = json!({
        "loggerName": args.logger,
        "loggingLevel": args.level.as_str(),
    });
    let context = format!("updating logger [ {} ]", args.logger);
    patch_logging(ctx, body, &context, out).await
}

/// Register a logger for a class or package with an initial level.
pub(crate) async fn handle_add_logger(
    ctx: &AppContext,
    args: AddLoggerArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let body = json!({
        "loggerName": args.logger,
        "loggerClass": args.class,
        "loggingLevel": args.level.as_str(),
    });
    let context = format!("adding logger [ {} ]", args.logger);
    patch_logging(ctx, body, &context, out).await
}

async fn patch_logging(
    ctx: &AppContext,
    body: serde_json::Value,
    context: &str,
    out: &mut dyn Write,
) -> CliResult<()> {
    let url = ctx.management_url(&[LOGGING_RESOURCE])?;
    let raw = ctx.execute(&RequestSpec::patch(url, body)).await?;
    let result = decode_message(&raw, MESSAGE_TAG, ERROR_TAG)?.into_result();
    if let Some(message) = report_domain(out, context, result)? {
        write_line(out, &message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    use crate::cli::{LogLevel, TargetArgs};
    use crate::client::tests::context_with;

    #[tokio::test]
    async fn get_log_level_renders_detail() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/management/logging")
                .query_param("loggerName", "synapse-api");
            then.status(200).json_body(json!({
                "loggerName": "synapse-api",
                "componentName": "org.apache.synapse.rest.API",
                "level": "INFO"
            }));
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        handle_get_log_level(
            &ctx,
            GetLogLevelArgs {
                logger: "synapse-api".to_string(),
                target: TargetArgs {
                    environment: "dev".to_string(),
                    format: None,
                },
            },
            &mut out,
        )
        .await
        .expect("get succeeds");

        mock.assert();
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Name - synapse-api\nComponent - org.apache.synapse.rest.API\nLevel - INFO\n"
        );
    }

    #[tokio::test]
    async fn update_log_level_sends_patch_body() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/management/logging")
                .json_body(json!({"loggerName": "synapse-api", "loggingLevel": "DEBUG"}));
            then.status(200)
                .json_body(json!({"message": "Successfully updated logger"}));
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        handle_update_log_level(
            &ctx,
            UpdateLogLevelArgs {
                logger: "synapse-api".to_string(),
                level: LogLevel::Debug,
                environment: "dev".to_string(),
            },
            &mut out,
        )
        .await
        .expect("update succeeds");

        mock.assert();
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Successfully updated logger\n"
        );
    }

    #[tokio::test]
    async fn add_logger_reports_server_error() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let mock = server.mock(|when, then| {
            when.method(PATCH).path("/management/logging").json_body(json!({
                "loggerName": "custom",
                "loggerClass": "com.example.Custom",
                "loggingLevel": "WARN"
            }));
            then.status(400)
                .json_body(json!({"Error": "Specified logger already exists"}));
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        handle_add_logger(
            &ctx,
            AddLoggerArgs {
                logger: "custom".to_string(),
                class: "com.example.Custom".to_string(),
                level: LogLevel::Warn,
                environment: "dev".to_string(),
            },
            &mut out,
        )
        .await
        .expect("domain error is printed");

        mock.assert();
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "[ERROR]: adding logger [ custom ] Specified logger already exists\n"
        );
    }
}
