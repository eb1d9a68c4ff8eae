//! Log file listing and download.

use std::fs;
use std::io::Write;
use std::path::{Component, Path};

use anyhow::anyhow;
use tracing::debug;

use crate::cli::GetLogsArgs;
use crate::client::{AppContext, CliError, CliResult, RequestSpec};
use crate::models::{ListResponse, LogFileSummary};
use crate::output::{FormatSpec, print_list, report_domain, write_line};
use crate::response::{ERROR_TAG, decode_bytes, decode_json};

const LOGS_RESOURCE: &str = "logs";
const LOG_EXTENSION: &str = ".log";
const LOG_LIST_FORMAT: &str = "table {{ FileName }}\t{{ Size }}";
const LOG_HEADERS: &[(&str, &str)] = &[("FileName", "NAME"), ("Size", "SIZE")];

/// List log files, or download one into `--path` when a name is given.
pub(crate) async fn handle_get_logs(
    ctx: &AppContext,
    args: GetLogsArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    match args.file.as_deref().map(str::trim).filter(|file| !file.is_empty()) {
        None => list_logs(ctx, args.target.format.as_deref(), out).await,
        Some(file) => download_log(ctx, file, &args.path, out).await,
    }
}

async fn list_logs(ctx: &AppContext, format: Option<&str>, out: &mut dyn Write) -> CliResult<()> {
    let url = ctx.management_url(&[LOGS_RESOURCE])?;
    let raw = ctx.execute(&RequestSpec::get(url)).await?;
    let result = decode_json::<ListResponse<LogFileSummary>>(&raw, ERROR_TAG)?.into_result();
    if let Some(list) = report_domain(out, "getting the list of log files", result)? {
        let files: Vec<LogFileSummary> = list
            .list
            .into_iter()
            .filter(|file| file.file_name.ends_with(LOG_EXTENSION))
            .collect();
        let spec = FormatSpec::resolve(format, LOG_LIST_FORMAT);
        print_list(out, &files, &spec, LOG_HEADERS, "No Log Files found")?;
    }
    Ok(())
}

async fn download_log(
    ctx: &AppContext,
    file: &str,
    dir: &Path,
    out: &mut dyn Write,
) -> CliResult<()> {
    if !dir.is_dir() {
        return Err(CliError::validation(format!(
            "download directory {} does not exist",
            dir.display()
        )));
    }
    // The name must stay a single plain component under `dir`.
    let mut components = Path::new(file).components();
    let plain = matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none();
    if !plain {
        return Err(CliError::validation(format!("invalid log file name '{file}'")));
    }

    let url = ctx.management_url(&[LOGS_RESOURCE])?;
    let request = RequestSpec::get(url).query("file", file);
    let raw = ctx.execute(&request).await?;
    let result = decode_bytes(&raw, ERROR_TAG)?.into_result();
    let context = format!("downloading log file [ {file} ]");
    if let Some(content) = report_domain(out, &context, result)? {
        let target = dir.join(file);
        fs::write(&target, &content).map_err(|err| {
            CliError::failure(anyhow!("failed to write {}: {err}", target.display()))
        })?;
        debug!(path = %target.display(), bytes = content.len(), "log file saved");
        write_line(out, &format!("Log file downloaded to {}", target.display()))?;
    }
    Ok(())
}
