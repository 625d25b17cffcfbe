//! URL literals, entity keys and operation call rendering.

use serde_json::{Map, Value};

use super::service::ServiceError;
use crate::ir::{DataType, EdmPrimitive, ODataVersion, OperationType, PropertyModel};

/// Key argument of get/update/patch/delete.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKey {
    /// The value of the sole key property.
    Literal(Value),
    /// Key property name (generated or OData) to value.
    Structured(Map<String, Value>),
}

impl From<&str> for EntityKey {
    fn from(value: &str) -> Self {
        EntityKey::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for EntityKey {
    fn from(value: String) -> Self {
        EntityKey::Literal(Value::String(value))
    }
}

impl From<i64> for EntityKey {
    fn from(value: i64) -> Self {
        EntityKey::Literal(Value::from(value))
    }
}

impl From<Map<String, Value>> for EntityKey {
    fn from(value: Map<String, Value>) -> Self {
        EntityKey::Structured(value)
    }
}

fn quoted(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn prefixed(prefix: &str, text: &str) -> String {
    format!("{prefix}'{text}'")
}

/// Render a value as a URL literal for the given property.
pub fn format_literal(value: &Value, prop: &PropertyModel, version: ODataVersion) -> String {
    if value.is_null() {
        return "null".to_string();
    }
    if prop.is_collection || prop.is_model() {
        return value.to_string();
    }

    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let primitive = match prop.data_type {
        DataType::Primitive(primitive) => primitive,
        _ => return quoted(&text),
    };

    match (version, primitive) {
        (_, EdmPrimitive::String | EdmPrimitive::Other | EdmPrimitive::Stream) => quoted(&text),
        (_, EdmPrimitive::Binary) => prefixed("binary", &text),
        (ODataVersion::V4, EdmPrimitive::Duration) => prefixed("duration", &text),
        (ODataVersion::V4, _) => text,
        (ODataVersion::V2, EdmPrimitive::Guid) => prefixed("guid", &text),
        (ODataVersion::V2, EdmPrimitive::DateTime) => prefixed("datetime", &text),
        (ODataVersion::V2, EdmPrimitive::DateTimeOffset) => prefixed("datetimeoffset", &text),
        (ODataVersion::V2, EdmPrimitive::Time | EdmPrimitive::TimeOfDay | EdmPrimitive::Duration) => {
            prefixed("time", &text)
        }
        (ODataVersion::V2, EdmPrimitive::Int64) => format!("{text}L"),
        (ODataVersion::V2, EdmPrimitive::Decimal) => format!("{text}M"),
        (ODataVersion::V2, _) => text,
    }
}

fn lookup<'v>(values: &'v Map<String, Value>, prop: &PropertyModel) -> Option<&'v Value> {
    values.get(&prop.name).or_else(|| values.get(&prop.odata_name))
}

fn reject_unknown(
    values: &Map<String, Value>,
    known: &[&PropertyModel],
    error: impl Fn(&str) -> ServiceError,
) -> Result<(), ServiceError> {
    match values
        .keys()
        .find(|k| !known.iter().any(|p| &p.name == *k || &p.odata_name == *k))
    {
        Some(unknown) => Err(error(unknown)),
        None => Ok(()),
    }
}

/// Render the parenthesized key segment, e.g. `('x')` or `(a=1,b='x')`.
///
/// A structured key for a single key property renders like the literal
/// form, so both address the same URL.
pub fn render_key(
    entity: &str,
    key: &EntityKey,
    key_spec: &[&PropertyModel],
    version: ODataVersion,
) -> Result<String, ServiceError> {
    let invalid = |reason: String| ServiceError::InvalidKey {
        entity: entity.to_string(),
        reason,
    };

    match (key, key_spec) {
        (_, []) => Err(invalid("entity type declares no key".to_string())),
        (EntityKey::Literal(value), [single]) => {
            Ok(format!("({})", format_literal(value, single, version)))
        }
        (EntityKey::Literal(_), _) => Err(invalid(format!(
            "a composite key of {} properties needs a structured key",
            key_spec.len()
        ))),
        (EntityKey::Structured(values), _) => {
            reject_unknown(values, key_spec, |k| invalid(format!("unknown key property '{k}'")))?;
            let parts = key_spec
                .iter()
                .map(|prop| {
                    lookup(values, prop)
                        .map(|v| format_literal(v, prop, version))
                        .ok_or_else(|| invalid(format!("missing key property '{}'", prop.name)))
                })
                .collect::<Result<Vec<_>, _>>()?;

            match (key_spec, parts.as_slice()) {
                ([_], [literal]) => Ok(format!("({literal})")),
                _ => Ok(format!(
                    "({})",
                    key_spec
                        .iter()
                        .zip(&parts)
                        .map(|(prop, literal)| format!("{}={literal}", prop.odata_name))
                        .collect::<Vec<_>>()
                        .join(",")
                )),
            }
        }
    }
}

/// Render a function call path segment: `Name(a=1,b='x')` in V4,
/// `Name?a=1&b='x'` in V2.
pub fn render_function_call(
    call_name: &str,
    op: &OperationType,
    params: &Map<String, Value>,
    version: ODataVersion,
) -> Result<String, ServiceError> {
    let declared: Vec<_> = op.call_parameters().iter().collect();
    reject_unknown(params, &declared, |k| ServiceError::InvalidArgument {
        name: k.to_string(),
        reason: format!("not a parameter of '{}'", op.odata_name),
    })?;

    let mut parts = Vec::with_capacity(declared.len());
    for param in declared {
        match lookup(params, param) {
            Some(value) => parts.push(format!(
                "{}={}",
                param.odata_name,
                format_literal(value, param, version)
            )),
            None if param.required => {
                return Err(ServiceError::InvalidArgument {
                    name: param.name.clone(),
                    reason: format!("required by '{}'", op.odata_name),
                });
            }
            None => {}
        }
    }

    Ok(match version {
        ODataVersion::V4 => format!("{call_name}({})", parts.join(",")),
        ODataVersion::V2 if parts.is_empty() => call_name.to_string(),
        ODataVersion::V2 => format!("{call_name}?{}", parts.join("&")),
    })
}

/// Request body of an action: supplied parameters by OData name; absent ones are omitted.
pub fn action_body(op: &OperationType, params: &Map<String, Value>) -> Result<Value, ServiceError> {
    let declared: Vec<_> = op.call_parameters().iter().collect();
    reject_unknown(params, &declared, |k| ServiceError::InvalidArgument {
        name: k.to_string(),
        reason: format!("not a parameter of '{}'", op.odata_name),
    })?;

    let body = declared
        .iter()
        .filter_map(|param| lookup(params, param).map(|v| (param.odata_name.clone(), v.clone())))
        .collect();
    Ok(Value::Object(body))
}
