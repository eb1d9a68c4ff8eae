//! `activate` and `deactivate` for endpoints, proxy services and message
//! processors.

use std::io::Write;

use serde_json::json;
use tracing::debug;

use crate::cli::StateTarget;
use crate::client::{AppContext, CliError, CliResult, RequestSpec};
use crate::output::{report_domain, write_line};
use crate::response::{ERROR_TAG, decode_message};

const MESSAGE_TAG: &str = "Message";

impl StateTarget {
    const fn resource(self) -> &'static str {
        match self {
            Self::Endpoint => "endpoints",
            Self::ProxyService => "proxy-services",
            Self::MessageProcessor => "message-processors",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Endpoint => "endpoint",
            Self::ProxyService => "proxy service",
            Self::MessageProcessor => "message processor",
        }
    }
}

pub(crate) async fn handle_state_change(
    ctx: &AppContext,
    target: StateTarget,
    name: &str,
    activate: bool,
    out: &mut dyn Write,
) -> CliResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::validation(format!(
            "{} name cannot be empty",
            target.label()
        )));
    }
    let status = if activate { "active" } else { "inactive" };
    debug!(resource = target.resource(), name, status, "changing artifact state");

    let url = ctx.management_url(&[target.resource()])?;
    let body = json!({ "name": name, "status": status });
    let raw = ctx.execute(&RequestSpec::post(url, body)).await?;
    let result = decode_message(&raw, MESSAGE_TAG, ERROR_TAG)?.into_result();

    let verb = if activate { "activating" } else { "deactivating" };
    let context = format!("{verb} {} [ {name} ]", target.label());
    if let Some(message) = report_domain(out, &context, result)? {
        write_line(out, &message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    use crate::client::tests::context_with;

    #[tokio::test]
    async fn activate_endpoint_prints_server_message() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/management/endpoints")
                .json_body(json!({"name": "TestEP", "status": "active"}));
            then.status(200).json_body(json!({"Message": "done"}));
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        handle_state_change(&ctx, StateTarget::Endpoint, "TestEP", true, &mut out)
            .await
            .expect("activation succeeds");

        mock.assert();
        assert_eq!(String::from_utf8(out).expect("utf8"), "done\n");
    }

    #[tokio::test]
    async fn deactivate_proxy_reports_missing_artifact() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/management/proxy-services")
                .json_body(json!({"name": "Ghost", "status": "inactive"}));
            then.status(404)
                .json_body(json!({"Error": "Proxy service could not be found"}));
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        handle_state_change(&ctx, StateTarget::ProxyService, "Ghost", false, &mut out)
            .await
            .expect("domain error is not fatal");

        mock.assert();
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "[ERROR]: deactivating proxy service [ Ghost ] Proxy service could not be found\n"
        );
    }

    #[tokio::test]
    async fn message_processor_uses_its_resource() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().expect("temp dir");
        let mock = server.mock(|when, then| {
            when.method(POST).path("/management/message-processors");
            then.status(200)
                .json_body(json!({"Message": "MessageProcessor is activated"}));
        });

        let ctx = context_with(&server, &dir);
        let mut out = Vec::new();
        handle_state_change(&ctx, StateTarget::MessageProcessor, "MP1", true, &mut out)
            .await
            .expect("activation succeeds");
        mock.assert();
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "MessageProcessor is activated\n"
        );
    }
}
