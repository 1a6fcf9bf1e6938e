//! Check declared-call arguments against a declaration's JSON Schema.

use serde_json::Value;

use crate::error::ProbeError;

/// Top-level schema check: object shape, required fields, property types.
///
/// Returns the first violation as [`ProbeError::InvalidArgument`].
pub fn validate_arguments(declaration: &str, args: &Value, schema: &Value) -> Result<(), ProbeError> {
    check(args, schema)
        .map_err(|reason| ProbeError::InvalidArgument(format!("{declaration}: {reason}")))
}

fn check(args: &Value, schema: &Value) -> Result<(), String> {
    let expects_object = schema.get("type").and_then(Value::as_str) == Some("object");
    let object = match args {
        Value::Object(map) => map,
        // A call without arguments is an empty object.
        Value::Null => return check_required(&serde_json::Map::new(), schema),
        other if expects_object => {
            return Err(format!("expected object arguments, got {}", type_name(other)))
        }
        _ => return Ok(()),
    };

    check_required(object, schema)?;

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (key, value) in object {
        let expected = properties
            .get(key)
            .and_then(|prop| prop.get("type"))
            .and_then(Value::as_str);
        if let Some(expected) = expected {
            if !matches_type(value, expected) {
                return Err(format!(
                    "field '{key}' expected type '{expected}', got {}",
                    type_name(value)
                ));
            }
        }
    }
    Ok(())
}

fn check_required(object: &serde_json::Map<String, Value>, schema: &Value) -> Result<(), String> {
    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    for name in required {
        match object.get(name) {
            None | Some(Value::Null) => return Err(format!("missing required field '{name}'")),
            Some(_) => {}
        }
    }
    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
