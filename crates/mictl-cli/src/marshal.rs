//! Conversion of typed records into ordered key/value maps.
//!
//! Two strategies exist. Records whose template names are plain fields use
//! their `Serialize` implementation as the field contract. Records that
//! expose derived values implement [`Accessors`] instead. Either way the
//! result is an ordered map whose keys are exactly the declared names.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Ordered name to value map produced by marshaling.
pub(crate) type FieldMap = Map<String, Value>;

/// Errors raised while marshaling a record.
#[derive(Debug, Error)]
pub(crate) enum MarshalError {
    /// The input was absent or did not describe a record.
    #[error("invalid input kind: expected a struct, got {kind}")]
    InvalidInputKind {
        /// Kind of value that was supplied.
        kind: &'static str,
    },
    /// A field could not be represented as a dynamic value.
    #[error("failed to marshal value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Named values computed from a record rather than read from its fields.
pub(crate) trait Accessors {
    /// Accessor names and their results, in declaration order.
    fn accessors(&self) -> Vec<(&'static str, Value)>;
}

/// Records that can be turned into a template context.
pub(crate) trait TemplateData {
    fn template_fields(&self) -> Result<FieldMap, MarshalError>;
}

/// Marshal a record through its field contract.
pub(crate) fn marshal_fields<T: Serialize + ?Sized>(
    value: Option<&T>,
) -> Result<FieldMap, MarshalError> {
    let value = value.ok_or(MarshalError::InvalidInputKind { kind: "nil" })?;
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(MarshalError::InvalidInputKind {
            kind: kind_of(&other),
        }),
    }
}

/// Marshal a record through its accessors.
pub(crate) fn marshal_accessors<T: Accessors + ?Sized>(
    value: Option<&T>,
) -> Result<FieldMap, MarshalError> {
    let value = value.ok_or(MarshalError::InvalidInputKind { kind: "nil" })?;
    Ok(value
        .accessors()
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect())
}

/// Encode a record's marshaled map as compact JSON, keys in declared order.
pub(crate) fn marshal_json<T: TemplateData + ?Sized>(value: &T) -> Result<String, MarshalError> {
    let fields = value.template_fields()?;
    Ok(serde_json::to_string(&fields)?)
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Implement [`TemplateData`] for records marshaled through their fields.
macro_rules! field_template_data {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::marshal::TemplateData for $ty {
                fn template_fields(
                    &self,
                ) -> Result<$crate::marshal::FieldMap, $crate::marshal::MarshalError> {
                    $crate::marshal::marshal_fields(Some(self))
                }
            }
        )+
    };
}

pub(crate) use field_template_data;
