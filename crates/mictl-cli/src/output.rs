//! Format specifications and template rendering for command output.
//!
//! A format string is either `table <template>`, `detail <template>`, or a
//! bare custom template. Templates use Jinja syntax (`{{ Name }}`) and can
//! call `json`, `jsonPretty`, `split`, `upper`, `lower`, `title`, and `join`
//! either as functions or as filters.

use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::anyhow;
use minijinja::value::ValueKind;
use minijinja::{Environment, Error as TemplateError, ErrorKind, Value, escape_formatter};
use thiserror::Error;
use tracing::{Level, trace};

use crate::client::{CliError, CliResult};
use crate::marshal::{MarshalError, TemplateData, marshal_json};

pub(crate) const TABLE_KEYWORD: &str = "table";
pub(crate) const DETAIL_KEYWORD: &str = "detail";
pub(crate) const ERROR_PREFIX: &str = "[ERROR]: ";

/// Layout selected by a format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormatKind {
    Table,
    Detail,
    Custom,
}

/// Parsed format string: layout plus template body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FormatSpec {
    pub(crate) kind: FormatKind,
    pub(crate) body: String,
}

impl FormatSpec {
    /// Parse a format string. Escaped `\t` and `\n` become real tab and
    /// newline characters.
    pub(crate) fn parse(raw: &str) -> Self {
        let unescaped = raw.replace("\\t", "\t").replace("\\n", "\n");
        let leading = unescaped.trim_start();
        if let Some(rest) = strip_keyword(leading, TABLE_KEYWORD) {
            return Self {
                kind: FormatKind::Table,
                body: rest.trim().to_string(),
            };
        }
        if let Some(rest) = strip_keyword(leading, DETAIL_KEYWORD) {
            return Self {
                kind: FormatKind::Detail,
                body: rest.trim().to_string(),
            };
        }
        Self {
            kind: FormatKind::Custom,
            body: unescaped,
        }
    }

    /// Pick the user's format for list rendering, or the default when the
    /// user gave nothing usable.
    pub(crate) fn resolve(user: Option<&str>, default: &str) -> Self {
        user.map(Self::parse)
            .filter(|spec| !spec.body.trim().is_empty())
            .unwrap_or_else(|| Self::parse(default))
    }

    /// Like [`FormatSpec::resolve`], but a table layout also falls back to
    /// the detail default.
    pub(crate) fn resolve_detail(user: Option<&str>, default: &str) -> Self {
        user.map(Self::parse)
            .filter(|spec| spec.kind != FormatKind::Table && !spec.body.trim().is_empty())
            .unwrap_or_else(|| Self::parse(default))
    }
}

fn strip_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = input.strip_prefix(keyword)?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

/// Errors raised while rendering output.
#[derive(Debug, Error)]
pub(crate) enum RenderError {
    /// Template failed to compile or execute.
    #[error("{0}")]
    Template(#[from] TemplateError),
    /// A record could not be turned into a template context.
    #[error(transparent)]
    Marshal(#[from] MarshalError),
    /// Writing to the destination failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Template environment with the helper functions registered.
pub(crate) fn template_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_formatter(|out, state, value| {
        if value.kind() == ValueKind::Bool {
            out.write_str(&display_text(value)).map_err(|_| {
                TemplateError::new(ErrorKind::WriteFailure, "failed to write template output")
            })
        } else {
            escape_formatter(out, state, value)
        }
    });
    env.add_function("upper", upper);
    env.add_filter("upper", upper);
    env.add_function("lower", lower);
    env.add_filter("lower", lower);
    env.add_function("title", title);
    env.add_filter("title", title);
    env.add_function("json", json);
    env.add_filter("json", json);
    env.add_function("jsonPretty", json_pretty);
    env.add_filter("jsonPretty", json_pretty);
    env.add_function("split", split);
    env.add_filter("split", split);
    env.add_function("join", join);
    env.add_filter("join", join);
    env
}

/// Render a list: header row for tables, one line per item, or the empty
/// message when there is nothing to show.
pub(crate) fn render_list<T: TemplateData>(
    out: &mut dyn Write,
    items: &[T],
    spec: &FormatSpec,
    headers: &[(&str, &str)],
    empty_message: &str,
) -> Result<(), RenderError> {
    if items.is_empty() {
        writeln!(out, "{empty_message}")?;
        return Ok(());
    }

    let env = template_environment();
    let template = env.template_from_str(&spec.body)?;

    if spec.kind == FormatKind::Table {
        let header_context: BTreeMap<&str, &str> = headers.iter().copied().collect();
        let header = template.render(&header_context)?;
        writeln!(out, "{header}")?;
    }

    for item in items {
        if tracing::enabled!(Level::TRACE) {
            trace!(record = %marshal_json(item)?, "rendering record");
        }
        let fields = item.template_fields()?;
        let line = template.render(&fields)?;
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Render a single record, appending a newline when asked.
pub(crate) fn render_detail<T: TemplateData + ?Sized>(
    out: &mut dyn Write,
    item: &T,
    spec: &FormatSpec,
    trailing_newline: bool,
) -> Result<(), RenderError> {
    let env = template_environment();
    let template = env.template_from_str(&spec.body)?;
    let fields = item.template_fields()?;
    let text = template.render(&fields)?;
    out.write_all(text.as_bytes())?;
    if trailing_newline {
        writeln!(out)?;
    }
    Ok(())
}

/// Render a list and report template failures without failing the command.
pub(crate) fn print_list<T: TemplateData>(
    out: &mut dyn Write,
    items: &[T],
    spec: &FormatSpec,
    headers: &[(&str, &str)],
    empty_message: &str,
) -> CliResult<()> {
    let result = render_list(out, items, spec, headers, empty_message);
    report_render(out, result)
}

/// Render a record and report template failures without failing the command.
pub(crate) fn print_detail<T: TemplateData + ?Sized>(
    out: &mut dyn Write,
    item: &T,
    spec: &FormatSpec,
) -> CliResult<()> {
    let result = render_detail(out, item, spec, true);
    report_render(out, result)
}

fn report_render(out: &mut dyn Write, result: Result<(), RenderError>) -> CliResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(RenderError::Io(err)) => Err(CliError::failure(anyhow!("failed to write output: {err}"))),
        Err(err) => write_line(out, &format!("Error executing template: {err}")),
    }
}

/// Write one line to the destination.
pub(crate) fn write_line(out: &mut dyn Write, text: &str) -> CliResult<()> {
    writeln!(out, "{text}")
        .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))
}

/// Print domain failures as `[ERROR]:` lines and let every other error
/// through. `Ok(None)` means a message was printed.
pub(crate) fn report_domain<T>(
    out: &mut dyn Write,
    context: &str,
    result: CliResult<T>,
) -> CliResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CliError::Domain(message)) => {
            let line = if context.is_empty() {
                format!("{ERROR_PREFIX}{message}")
            } else {
                format!("{ERROR_PREFIX}{context} {message}")
            };
            write_line(out, &line)?;
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Text form of a template value. Booleans print as `true`/`false`.
fn display_text(value: &Value) -> String {
    if value.kind() == ValueKind::Bool {
        value.is_true().to_string()
    } else {
        value.to_string()
    }
}

fn upper(value: &Value) -> String {
    display_text(value).to_uppercase()
}

fn lower(value: &Value) -> String {
    display_text(value).to_lowercase()
}

fn title(value: &Value) -> String {
    let text = display_text(value);
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if at_word_start {
            result.extend(ch.to_uppercase());
        } else {
            result.push(ch);
        }
        at_word_start = !(ch.is_alphanumeric() || ch == '_');
    }
    result
}

fn json(value: &Value) -> Result<String, TemplateError> {
    serde_json::to_string(value)
        .map(|text| text.trim().to_string())
        .map_err(|err| TemplateError::new(ErrorKind::InvalidOperation, err.to_string()))
}

fn json_pretty(value: &Value) -> Result<String, TemplateError> {
    serde_json::to_string_pretty(value)
        .map_err(|err| TemplateError::new(ErrorKind::InvalidOperation, err.to_string()))
}

fn split(value: &Value, separator: &Value) -> Vec<String> {
    let separator = display_text(separator);
    display_text(value)
        .split(separator.as_str())
        .map(str::to_string)
        .collect()
}

fn join(values: &Value, separator: &Value) -> Result<String, TemplateError> {
    let parts: Vec<String> = values.try_iter()?.map(|item| display_text(&item)).collect();
    Ok(parts.join(&display_text(separator)))
}
