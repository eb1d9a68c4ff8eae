//! `get` handlers for deployed artifacts that share the list/detail shape.

use std::io::Write;

use serde::de::DeserializeOwned;

use crate::cli::ArtifactArgs;
use crate::client::{AppContext, CliResult, RequestSpec};
use crate::marshal::TemplateData;
use crate::models::ListResponse;
use crate::output::{FormatSpec, print_detail, print_list, report_domain};
use crate::response::{ERROR_TAG, decode_json};

/// Where an artifact lives and how it is rendered.
#[derive(Debug)]
pub(crate) struct ArtifactKind {
    /// Management resource path.
    pub(crate) resource: &'static str,
    /// Query parameter selecting a single artifact.
    pub(crate) detail_param: &'static str,
    /// Singular label used in messages.
    pub(crate) label: &'static str,
    pub(crate) list_format: &'static str,
    pub(crate) detail_format: &'static str,
    /// Template field to column header.
    pub(crate) headers: &'static [(&'static str, &'static str)],
    pub(crate) empty_message: &'static str,
}

pub(crate) const APIS: ArtifactKind = ArtifactKind {
    resource: "apis",
    detail_param: "apiName",
    label: "API",
    list_format: "table {{ Name }}\t{{ Url }}",
    detail_format: "detail Name - {{ Name }}\n\
Version - {{ Version }}\n\
Url - {{ Url }}\n\
Stats - {{ Stats }}\n\
Tracing - {{ Tracing }}\n\
Resources :\n\
{% for resource in Resources %}Url - {{ resource.Url }}\n\
Methods - {{ resource.Methods | join(\",\") }}\n\
{% endfor %}",
    headers: &[("Name", "NAME"), ("Url", "URL")],
    empty_message: "No APIs found",
};

pub(crate) const PROXY_SERVICES: ArtifactKind = ArtifactKind {
    resource: "proxy-services",
    detail_param: "proxyServiceName",
    label: "proxy service",
    list_format: "table {{ Name }}\t{{ Wsdl11 }}\t{{ Wsdl20 }}",
    detail_format: "detail Name - {{ Name }}\n\
WSDL 1.1 - {{ Wsdl11 }}\n\
WSDL 2.0 - {{ Wsdl20 }}\n\
Stats - {{ Stats }}\n\
Tracing - {{ Tracing }}",
    headers: &[("Name", "NAME"), ("Wsdl11", "WSDL 1.1"), ("Wsdl20", "WSDL 2.0")],
    empty_message: "No Proxy Services found",
};

pub(crate) const ENDPOINTS: ArtifactKind = ArtifactKind {
    resource: "endpoints",
    detail_param: "endpointName",
    label: "endpoint",
    list_format: "table {{ Name }}\t{{ Type }}\t{{ Active }}",
    detail_format: "detail Name - {{ Name }}\n\
Type - {{ Type }}\n\
Active - {{ Active }}\
{% if Method %}\nMethod - {{ Method }}{% endif %}\
{% if Address %}\nAddress - {{ Address }}{% endif %}\
{% if UriTemplate %}\nURI Template - {{ UriTemplate }}{% endif %}\
{% if ServiceName %}\nService Name - {{ ServiceName }}{% endif %}\
{% if PortName %}\nPort Name - {{ PortName }}{% endif %}\
{% if WsdlUri %}\nWSDL URI - {{ WsdlUri }}{% endif %}",
    headers: &[("Name", "NAME"), ("Type", "TYPE"), ("Active", "ACTIVE")],
    empty_message: "No Endpoints found",
};

pub(crate) const SEQUENCES: ArtifactKind = ArtifactKind {
    resource: "sequences",
    detail_param: "sequenceName",
    label: "sequence",
    list_format: "table {{ Name }}\t{{ Stats }}\t{{ Tracing }}",
    detail_format: "detail Name - {{ Name }}\n\
Container - {{ Container }}\n\
Stats - {{ Stats }}\n\
Tracing - {{ Tracing }}\n\
Mediators - {{ Mediators | join(\", \") }}",
    headers: &[("Name", "NAME"), ("Stats", "STATS"), ("Tracing", "TRACING")],
    empty_message: "No Sequences found",
};

pub(crate) const INBOUND_ENDPOINTS: ArtifactKind = ArtifactKind {
    resource: "inbound-endpoints",
    detail_param: "inboundEndpointName",
    label: "inbound endpoint",
    list_format: "table {{ Name }}\t{{ Type }}",
    detail_format: "detail Name - {{ Name }}\n\
Type - {{ Type }}\n\
Stats - {{ Stats }}\n\
Tracing - {{ Tracing }}\n\
Parameters :\n\
{% for parameter in Parameters %}{{ parameter.Name }} = {{ parameter.Value }}\n\
{% endfor %}",
    headers: &[("Name", "NAME"), ("Type", "TYPE")],
    empty_message: "No Inbound Endpoints found",
};

pub(crate) const MESSAGE_STORES: ArtifactKind = ArtifactKind {
    resource: "message-stores",
    detail_param: "name",
    label: "message store",
    list_format: "table {{ Name }}\t{{ Type }}\t{{ Size }}",
    detail_format: "detail Name - {{ Name }}\n\
File Name - {{ FileName }}\n\
Container - {{ Container }}\n\
Producer - {{ Producer }}\n\
Consumer - {{ Consumer }}\n\
Size - {{ Size }}\n\
Properties :\n\
{% for key, value in Properties | dictsort %}{{ key }} = {{ value }}\n\
{% else %}No Properties found\n\
{% endfor %}",
    headers: &[("Name", "NAME"), ("Type", "TYPE"), ("Size", "SIZE")],
    empty_message: "No Message Stores found",
};

pub(crate) const MESSAGE_PROCESSORS: ArtifactKind = ArtifactKind {
    resource: "message-processors",
    detail_param: "name",
    label: "message processor",
    list_format: "table {{ Name }}\t{{ Type }}\t{{ Status }}",
    detail_format: "detail Name - {{ Name }}\n\
Type - {{ Type }}\n\
File Name - {{ FileName }}\n\
Message Store - {{ Store }}\n\
Artifact Container - {{ Container }}\n\
Status - {{ Status }}\n\
Parameters :\n\
{% for key, value in Parameters | dictsort %}{{ key }} = {{ value }}\n\
{% else %}No Parameters found\n\
{% endfor %}",
    headers: &[("Name", "NAME"), ("Type", "TYPE"), ("Status", "STATUS")],
    empty_message: "No Message Processors found",
};

pub(crate) const TASKS: ArtifactKind = ArtifactKind {
    resource: "tasks",
    detail_param: "taskName",
    label: "task",
    list_format: "table {{ Name }}",
    detail_format: "detail Name - {{ Name }}\n\
Trigger Type - {{ Type }}\
{% if TriggerCron %}\nCron Expression - {{ TriggerCron }}\
{% else %}\nTrigger Count - {{ TriggerCount }}\nTrigger Interval - {{ TriggerInterval }}{% endif %}",
    headers: &[("Name", "NAME")],
    empty_message: "No Tasks found",
};

pub(crate) const LOCAL_ENTRIES: ArtifactKind = ArtifactKind {
    resource: "local-entries",
    detail_param: "name",
    label: "local entry",
    list_format: "table {{ Name }}\t{{ Type }}",
    detail_format: "detail Name - {{ Name }}\n\
Type - {{ Type }}\n\
Value - {{ Value }}",
    headers: &[("Name", "NAME"), ("Type", "TYPE")],
    empty_message: "No Local Entries found",
};

pub(crate) const DATA_SERVICES: ArtifactKind = ArtifactKind {
    resource: "data-services",
    detail_param: "dataServiceName",
    label: "data service",
    list_format: "table {{ Name }}\t{{ Wsdl11 }}\t{{ Wsdl20 }}",
    detail_format: "detail Name - {{ ServiceName }}\n\
Group Name - {{ GroupName }}\n\
Description - {{ Description }}\n\
WSDL 1.1 - {{ Wsdl11 }}\n\
WSDL 2.0 - {{ Wsdl20 }}\n\
Queries :\n\
{% for query in Queries %}{{ query.Id }}\t{{ query.Namespace }}\n\
{% endfor %}",
    headers: &[("Name", "NAME"), ("Wsdl11", "WSDL 1.1"), ("Wsdl20", "WSDL 2.0")],
    empty_message: "No Data Services found",
};

pub(crate) const COMPOSITE_APPS: ArtifactKind = ArtifactKind {
    resource: "applications",
    detail_param: "carbonAppName",
    label: "composite app",
    list_format: "table {{ Name }}\t{{ Version }}",
    detail_format: "detail Name - {{ Name }}\n\
Version - {{ Version }}\n\
Artifacts :\n\
{% for artifact in Artifacts %}{{ artifact.Name }}\t{{ artifact.Type }}\n\
{% endfor %}",
    headers: &[("Name", "NAME"), ("Version", "VERSION")],
    empty_message: "No Composite Apps found",
};

/// List the artifacts of a kind, or show one when a name is given.
pub(crate) async fn handle_get_artifact<S, D>(
    ctx: &AppContext,
    kind: &ArtifactKind,
    args: ArtifactArgs,
    out: &mut dyn Write,
) -> CliResult<()>
where
    S: DeserializeOwned + TemplateData,
    D: DeserializeOwned + TemplateData,
{
    let url = ctx.management_url(&[kind.resource])?;
    let format = args.target.format.as_deref();

    match args.name.as_deref().map(str::trim).filter(|name| !name.is_empty()) {
        None => {
            let raw = ctx.execute(&RequestSpec::get(url)).await?;
            let result = decode_json::<ListResponse<S>>(&raw, ERROR_TAG)?.into_result();
            let context = format!("getting the list of {}s", kind.label);
            if let Some(list) = report_domain(out, &context, result)? {
                let spec = FormatSpec::resolve(format, kind.list_format);
                print_list(out, &list.list, &spec, kind.headers, kind.empty_message)?;
            }
        }
        Some(name) => {
            let request = RequestSpec::get(url).query(kind.detail_param, name);
            let raw = ctx.execute(&request).await?;
            let result = decode_json::<D>(&raw, ERROR_TAG)?.into_result();
            let context = format!("getting information of {} [ {name} ]", kind.label);
            if let Some(detail) = report_domain(out, &context, result)? {
                let spec = FormatSpec::resolve_detail(format, kind.detail_format);
                print_detail(out, &detail, &spec)?;
            }
        }
    }
    Ok(())
}
