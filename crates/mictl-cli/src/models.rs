//! Records exchanged with the management API.
//!
//! Records deserialize from the API's camelCase JSON and serialize with
//! PascalCase names; the serialized names are the fields templates see
//! (`{{ Name }}`, `{{ Type }}`, ...).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::marshal::{Accessors, field_template_data};

/// Paged list envelope used by every collection resource.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub(crate) list: Vec<T>,
}

/// Accept `true`, `"true"`, and `"TRUE"` alike.
fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(flag),
        Value::String(text) => Ok(text.eq_ignore_ascii_case("true")),
        Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected boolean, got {other}"
        ))),
    }
}

/// Render any scalar as text; objects and arrays keep their JSON form.
fn flexible_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct ApiSummary {
    pub(crate) name: String,
    pub(crate) url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct ApiResource {
    pub(crate) methods: Vec<String>,
    pub(crate) url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct ApiDetail {
    pub(crate) name: String,
    pub(crate) url: String,
    #[serde(deserialize_with = "flexible_string")]
    pub(crate) version: String,
    pub(crate) stats: String,
    pub(crate) tracing: String,
    pub(crate) resources: Vec<ApiResource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct ProxySummary {
    pub(crate) name: String,
    #[serde(rename(serialize = "Wsdl11", deserialize = "wsdl1_1"))]
    pub(crate) wsdl11: String,
    #[serde(rename(serialize = "Wsdl20", deserialize = "wsdl2_0"))]
    pub(crate) wsdl20: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct ProxyDetail {
    pub(crate) name: String,
    #[serde(rename(serialize = "Wsdl11", deserialize = "wsdl1_1"))]
    pub(crate) wsdl11: String,
    #[serde(rename(serialize = "Wsdl20", deserialize = "wsdl2_0"))]
    pub(crate) wsdl20: String,
    pub(crate) stats: String,
    pub(crate) tracing: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct EndpointSummary {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "type"))]
    pub(crate) kind: String,
    #[serde(alias = "isActive", deserialize_with = "flexible_bool")]
    pub(crate) active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct EndpointDetail {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "type"))]
    pub(crate) kind: String,
    #[serde(alias = "isActive", deserialize_with = "flexible_bool")]
    pub(crate) active: bool,
    pub(crate) method: String,
    pub(crate) address: String,
    pub(crate) uri_template: String,
    pub(crate) service_name: String,
    pub(crate) port_name: String,
    pub(crate) wsdl_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct SequenceSummary {
    pub(crate) name: String,
    pub(crate) container: String,
    pub(crate) stats: String,
    pub(crate) tracing: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct SequenceDetail {
    pub(crate) name: String,
    pub(crate) container: String,
    pub(crate) stats: String,
    pub(crate) tracing: String,
    pub(crate) mediators: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct InboundSummary {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "protocol"))]
    pub(crate) protocol: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct NameValue {
    pub(crate) name: String,
    #[serde(deserialize_with = "flexible_string")]
    pub(crate) value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct InboundDetail {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "protocol"))]
    pub(crate) protocol: String,
    pub(crate) stats: String,
    pub(crate) tracing: String,
    pub(crate) parameters: Vec<NameValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct MessageStoreSummary {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "type"))]
    pub(crate) kind: String,
    #[serde(deserialize_with = "flexible_string")]
    pub(crate) size: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct MessageStoreDetail {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "type"))]
    pub(crate) kind: String,
    #[serde(deserialize_with = "flexible_string")]
    pub(crate) size: String,
    #[serde(alias = "file")]
    pub(crate) file_name: String,
    pub(crate) container: String,
    pub(crate) producer: String,
    pub(crate) consumer: String,
    pub(crate) properties: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct MessageProcessorSummary {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "type"))]
    pub(crate) kind: String,
    pub(crate) status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct MessageProcessorDetail {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "type"))]
    pub(crate) kind: String,
    pub(crate) status: String,
    #[serde(alias = "file")]
    pub(crate) file_name: String,
    #[serde(rename(serialize = "Store", deserialize = "messageStore"))]
    pub(crate) store: String,
    pub(crate) container: String,
    pub(crate) parameters: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct TaskSummary {
    pub(crate) name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct TaskDetail {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "triggerType"))]
    pub(crate) trigger_type: String,
    #[serde(deserialize_with = "flexible_string")]
    pub(crate) trigger_count: String,
    #[serde(deserialize_with = "flexible_string")]
    pub(crate) trigger_interval: String,
    pub(crate) trigger_cron: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct LocalEntrySummary {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "type"))]
    pub(crate) kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct LocalEntryDetail {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "type"))]
    pub(crate) kind: String,
    #[serde(deserialize_with = "flexible_string")]
    pub(crate) value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct DataServiceSummary {
    pub(crate) name: String,
    #[serde(rename(serialize = "Wsdl11", deserialize = "wsdl1_1"))]
    pub(crate) wsdl11: String,
    #[serde(rename(serialize = "Wsdl20", deserialize = "wsdl2_0"))]
    pub(crate) wsdl20: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct DataServiceQuery {
    pub(crate) id: String,
    pub(crate) namespace: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct DataServiceDetail {
    pub(crate) service_name: String,
    #[serde(rename(serialize = "GroupName", deserialize = "serviceGroupName"))]
    pub(crate) group_name: String,
    #[serde(rename(serialize = "Description", deserialize = "serviceDescription"))]
    pub(crate) description: String,
    #[serde(rename(serialize = "Wsdl11", deserialize = "wsdl1_1"))]
    pub(crate) wsdl11: String,
    #[serde(rename(serialize = "Wsdl20", deserialize = "wsdl2_0"))]
    pub(crate) wsdl20: String,
    pub(crate) queries: Vec<DataServiceQuery>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct CompositeAppSummary {
    pub(crate) name: String,
    #[serde(deserialize_with = "flexible_string")]
    pub(crate) version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct CompositeAppArtifact {
    pub(crate) name: String,
    #[serde(rename(serialize = "Type", deserialize = "type"))]
    pub(crate) kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct CompositeAppDetail {
    pub(crate) name: String,
    #[serde(deserialize_with = "flexible_string")]
    pub(crate) version: String,
    pub(crate) artifacts: Vec<CompositeAppArtifact>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase"), default)]
pub(crate) struct NamedEntry {
    pub(crate) name: String,
}

/// Response of the bare `templates` resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct TemplateCollection {
    pub(crate) sequence_template_list: Vec<NamedEntry>,
    pub(crate) endpoint_template_list: Vec<NamedEntry>,
}

/// Kinds of template the server distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TemplateKind {
    Sequence,
    Endpoint,
}

impl TemplateKind {
    pub(crate) const fn query_value(self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Endpoint => "endpoint",
        }
    }

    /// Name shown in the `TYPE` column.
    pub(crate) const fn label(self) -> &'static str {
        match self {
            Self::Sequence => "Sequence",
            Self::Endpoint => "Endpoint",
        }
    }
}

/// One row of the template listing. Name and type are exposed through
/// accessors since the server reports them in separate lists.
#[derive(Debug, Clone)]
pub(crate) struct TemplateRow {
    entry: NamedEntry,
    kind: TemplateKind,
}

impl TemplateRow {
    pub(crate) const fn new(entry: NamedEntry, kind: TemplateKind) -> Self {
        Self { entry, kind }
    }

    pub(crate) fn template_name(&self) -> &str {
        &self.entry.name
    }

    pub(crate) const fn template_type(&self) -> &'static str {
        self.kind.label()
    }
}

impl Accessors for TemplateRow {
    fn accessors(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("TemplateName", Value::from(self.template_name())),
            ("TemplateType", Value::from(self.template_type())),
        ]
    }
}

impl crate::marshal::TemplateData for TemplateRow {
    fn template_fields(&self) -> Result<crate::marshal::FieldMap, crate::marshal::MarshalError> {
        crate::marshal::marshal_accessors(Some(self))
    }
}

impl TemplateCollection {
    /// Flatten both lists into rows, sequence templates first.
    pub(crate) fn into_rows(self) -> Vec<TemplateRow> {
        self.sequence_template_list
            .into_iter()
            .map(|entry| TemplateRow::new(entry, TemplateKind::Sequence))
            .chain(
                self.endpoint_template_list
                    .into_iter()
                    .map(|entry| TemplateRow::new(entry, TemplateKind::Endpoint)),
            )
            .collect()
    }
}

/// One parameter of a sequence template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct TemplateParameter {
    pub(crate) name: String,
    #[serde(deserialize_with = "flexible_string")]
    pub(crate) default_value: String,
    #[serde(deserialize_with = "flexible_bool")]
    pub(crate) is_mandatory: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct SequenceTemplateDetail {
    pub(crate) name: String,
    pub(crate) parameters: Vec<TemplateParameter>,
}

/// Endpoint template parameters are bare names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct EndpointTemplateDetail {
    pub(crate) name: String,
    pub(crate) parameters: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct UserSummary {
    pub(crate) user_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct UserDetail {
    pub(crate) user_id: String,
    #[serde(deserialize_with = "flexible_bool")]
    pub(crate) is_admin: bool,
    pub(crate) roles: Vec<String>,
}

/// Role names arrive either as bare strings or as `{"role": ...}` objects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RoleEntry")]
#[serde(rename_all(serialize = "PascalCase"))]
pub(crate) struct RoleSummary {
    pub(crate) role: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoleEntry {
    Plain(String),
    Object { role: String },
}

impl From<RoleEntry> for RoleSummary {
    fn from(entry: RoleEntry) -> Self {
        match entry {
            RoleEntry::Plain(role) | RoleEntry::Object { role } => Self { role },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct RoleDetail {
    pub(crate) role: String,
    pub(crate) users: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct LogFileSummary {
    #[serde(alias = "fileName")]
    pub(crate) file_name: String,
    #[serde(alias = "size", deserialize_with = "flexible_string")]
    pub(crate) size: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"), default)]
pub(crate) struct LoggerDetail {
    #[serde(rename(serialize = "Name"))]
    pub(crate) logger_name: String,
    #[serde(alias = "loggerClass")]
    pub(crate) component_name: String,
    #[serde(alias = "logLevel")]
    pub(crate) level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct TransactionCount {
    #[serde(alias = "year", deserialize_with = "flexible_string")]
    pub(crate) year: String,
    #[serde(alias = "month", deserialize_with = "flexible_string")]
    pub(crate) month: String,
    #[serde(alias = "transactionCount", deserialize_with = "flexible_string")]
    pub(crate) transaction_count: String,
}

/// A registered environment as shown by `get envs`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct EnvironmentRow {
    pub(crate) name: String,
    pub(crate) mi_endpoint: String,
}

field_template_data!(
    ApiSummary,
    ApiDetail,
    ProxySummary,
    ProxyDetail,
    EndpointSummary,
    EndpointDetail,
    SequenceSummary,
    SequenceDetail,
    InboundSummary,
    InboundDetail,
    MessageStoreSummary,
    MessageStoreDetail,
    MessageProcessorSummary,
    MessageProcessorDetail,
    TaskSummary,
    TaskDetail,
    LocalEntrySummary,
    LocalEntryDetail,
    DataServiceSummary,
    DataServiceDetail,
    CompositeAppSummary,
    CompositeAppDetail,
    NamedEntry,
    SequenceTemplateDetail,
    EndpointTemplateDetail,
    UserSummary,
    UserDetail,
    RoleSummary,
    RoleDetail,
    LogFileSummary,
    LoggerDetail,
    TransactionCount,
    EnvironmentRow,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::marshal::TemplateData;

    #[test]
    fn endpoint_active_accepts_string_and_bool() {
        let list: ListResponse<EndpointSummary> = serde_json::from_value(json!({
            "count": 2,
            "list": [
                {"name": "TestEP", "type": "http", "active": "true"},
                {"name": "Other", "type": "address", "isActive": false}
            ]
        }))
        .expect("decodes");
        assert!(list.list[0].active);
        assert!(!list.list[1].active);

        let fields = list.list[0].template_fields().expect("fields");
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Name", "Type", "Active"]);
    }

    #[test]
    fn proxy_wsdl_keys_map_to_template_names() {
        let proxy: ProxySummary = serde_json::from_value(json!({
            "name": "StockQuote",
            "wsdl1_1": "http://host/sq?wsdl",
            "wsdl2_0": "http://host/sq?wsdl2"
        }))
        .expect("decodes");
        let fields = proxy.template_fields().expect("fields");
        assert_eq!(fields.get("Wsdl11"), Some(&json!("http://host/sq?wsdl")));
        assert_eq!(fields.get("Wsdl20"), Some(&json!("http://host/sq?wsdl2")));
    }

    #[test]
    fn roles_decode_from_strings_or_objects() {
        let list: ListResponse<RoleSummary> = serde_json::from_value(json!({
            "count": 2,
            "list": ["admin", {"role": "Internal/everyone"}]
        }))
        .expect("decodes");
        let roles: Vec<&str> = list.list.iter().map(|role| role.role.as_str()).collect();
        assert_eq!(roles, ["admin", "Internal/everyone"]);
        let fields = list.list[0].template_fields().expect("fields");
        assert_eq!(fields.get("Role"), Some(&json!("admin")));
    }

    #[test]
    fn template_rows_expose_accessors() {
        let collection: TemplateCollection = serde_json::from_value(json!({
            "sequenceTemplateList": [{"name": "seqT"}],
            "endpointTemplateList": [{"name": "epT"}]
        }))
        .expect("decodes");
        let rows = collection.into_rows();
        assert_eq!(rows.len(), 2);

        let fields = rows[1].template_fields().expect("fields");
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["TemplateName", "TemplateType"]);
        assert_eq!(fields.get("TemplateName"), Some(&json!("epT")));
        assert_eq!(fields.get("TemplateType"), Some(&json!("Endpoint")));
    }

    #[test]
    fn sequence_template_parameters_are_records() {
        let detail: SequenceTemplateDetail = serde_json::from_value(json!({
            "name": "LogTemplate",
            "parameters": [
                {"name": "message", "defaultValue": "hi", "isMandatory": true},
                {"name": "level", "isMandatory": "false"}
            ]
        }))
        .expect("decodes");
        assert_eq!(detail.parameters.len(), 2);
        assert_eq!(detail.parameters[0].default_value, "hi");
        assert!(detail.parameters[0].is_mandatory);
        assert_eq!(detail.parameters[1].default_value, "");
        assert!(!detail.parameters[1].is_mandatory);
    }

    #[test]
    fn numeric_fields_render_as_text() {
        let store: MessageStoreSummary = serde_json::from_value(json!({
            "name": "JMSStore",
            "type": "jms-message-store",
            "size": 12
        }))
        .expect("decodes");
        assert_eq!(store.size, "12");

        let count: TransactionCount = serde_json::from_value(json!({
            "Year": 2024,
            "Month": 3,
            "TransactionCount": 500
        }))
        .expect("decodes");
        assert_eq!(count.transaction_count, "500");
    }
}
