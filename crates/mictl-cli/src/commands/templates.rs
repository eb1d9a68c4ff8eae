//! Sequence and endpoint templates.

use std::io::Write;

use crate::cli::{TemplateArgs, TemplateTypeArg};
use crate::client::{AppContext, CliResult, RequestSpec};
use crate::models::{
    EndpointTemplateDetail, ListResponse, NamedEntry, SequenceTemplateDetail, TemplateCollection,
    TemplateKind,
};
use crate::output::{FormatSpec, print_detail, print_list, report_domain};
use crate::response::{ERROR_TAG, decode_json};

const TEMPLATES_RESOURCE: &str = "templates";
const TEMPLATE_LIST_FORMAT: &str = "table {{ TemplateName }}\t{{ TemplateType }}";
const TEMPLATE_HEADERS: &[(&str, &str)] = &[("TemplateName", "NAME"), ("TemplateType", "TYPE")];
const TEMPLATE_BY_TYPE_FORMAT: &str = "table {{ Name }}";
const TEMPLATE_BY_TYPE_HEADERS: &[(&str, &str)] = &[("Name", "NAME")];
const SEQUENCE_TEMPLATE_DETAIL_FORMAT: &str = "detail Name - {{ Name }}\n\
Parameters :\n\
{% if Parameters %}NAME\tDEFAULT VALUE\tMANDATORY\
{% for param in Parameters %}\n{{ param.Name }}\t{{ param.DefaultValue }}\t{{ param.IsMandatory }}{% endfor %}\
{% else %}No Parameters found{% endif %}";
const ENDPOINT_TEMPLATE_DETAIL_FORMAT: &str = "detail Name - {{ Name }}\n\
Parameters : {% if Parameters %}{{ Parameters | join(\", \") }}{% else %}No Parameters found{% endif %}";
const EMPTY_MESSAGE: &str = "No Templates found";
const EMPTY_BY_TYPE_MESSAGE: &str = "No Templates found for the given type";

impl From<TemplateTypeArg> for TemplateKind {
    fn from(arg: TemplateTypeArg) -> Self {
        match arg {
            TemplateTypeArg::Sequence => Self::Sequence,
            TemplateTypeArg::Endpoint => Self::Endpoint,
        }
    }
}

/// Without a type both template lists are shown together; with a type only
/// that list; with a type and a name the template's details.
pub(crate) async fn handle_get_templates(
    ctx: &AppContext,
    args: TemplateArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let url = ctx.management_url(&[TEMPLATES_RESOURCE])?;
    let format = args.target.format.as_deref();
    let name = args.name.as_deref().map(str::trim).filter(|name| !name.is_empty());

    match (args.kind.map(TemplateKind::from), name) {
        (None, _) => {
            let raw = ctx.execute(&RequestSpec::get(url)).await?;
            let result = decode_json::<TemplateCollection>(&raw, ERROR_TAG)?.into_result();
            if let Some(collection) = report_domain(out, "getting the list of templates", result)? {
                let rows = collection.into_rows();
                let spec = FormatSpec::resolve(format, TEMPLATE_LIST_FORMAT);
                print_list(out, &rows, &spec, TEMPLATE_HEADERS, EMPTY_MESSAGE)?;
            }
        }
        (Some(kind), None) => {
            let request = RequestSpec::get(url).query("type", kind.query_value());
            let raw = ctx.execute(&request).await?;
            let result = decode_json::<ListResponse<NamedEntry>>(&raw, ERROR_TAG)?.into_result();
            let context = format!("getting the list of {} templates", kind.query_value());
            if let Some(list) = report_domain(out, &context, result)? {
                let spec = FormatSpec::resolve(format, TEMPLATE_BY_TYPE_FORMAT);
                print_list(
                    out,
                    &list.list,
                    &spec,
                    TEMPLATE_BY_TYPE_HEADERS,
                    EMPTY_BY_TYPE_MESSAGE,
                )?;
            }
        }
        (Some(kind), Some(name)) => {
            let request = RequestSpec::get(url)
                .query("type", kind.query_value())
                .query("name", name);
            let raw = ctx.execute(&request).await?;
            let context = format!("getting information of template [ {name} ]");
            match kind {
                TemplateKind::Sequence => {
                    let result =
                        decode_json::<SequenceTemplateDetail>(&raw, ERROR_TAG)?.into_result();
                    if let Some(detail) = report_domain(out, &context, result)? {
                        let spec = FormatSpec::resolve_detail(format, SEQUENCE_TEMPLATE_DETAIL_FORMAT);
                        print_detail(out, &detail, &spec)?;
                    }
                }
                TemplateKind::Endpoint => {
                    let result =
                        decode_json::<EndpointTemplateDetail>(&raw, ERROR_TAG)?.into_result();
                    if let Some(detail) = report_domain(out, &context, result)? {
                        let spec = FormatSpec::resolve_detail(format, ENDPOINT_TEMPLATE_DETAIL_FORMAT);
                        print_detail(out, &detail, &spec)?;
                    }
                }
            }
        }
    }
    Ok(())
}
