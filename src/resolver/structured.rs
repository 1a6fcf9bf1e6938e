//! Structured strategy: calls declared by the reasoning capability.

use std::borrow::Cow;

use serde_json::Value;

use super::Resolution;
use crate::error::ProbeError;
use crate::mcp::client::coerce_tool_arguments;
use crate::tools::{validate_arguments, Binding, Vocabulary};
use crate::types::{JsonObject, Operation, OperationCall};

/// Validates declared calls against a [`Vocabulary`] and maps them to operations.
#[derive(Debug, Clone)]
pub struct StructuredResolver {
    vocabulary: Vocabulary,
}

impl StructuredResolver {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn resolve(&self, call: &OperationCall) -> Resolution {
        let Some(declaration) = self.vocabulary.lookup(&call.name) else {
            return Resolution::Unrecognized;
        };

        let view = validation_view(&call.arguments);
        if let Err(error) = validate_arguments(
            &call.name,
            &view,
            &declaration.definition.parameters.schema,
        ) {
            return Resolution::Invalid(error);
        }

        match build_operation(&declaration.binding, &call.arguments) {
            Ok(operation) => Resolution::Resolved(operation),
            Err(error) => Resolution::Invalid(error),
        }
    }
}

/// `arguments` is declared as a JSON string; an inline object is accepted too.
fn validation_view(arguments: &Value) -> Cow<'_, Value> {
    match arguments.get("arguments") {
        Some(inner @ Value::Object(_)) => {
            let mut view = arguments.clone();
            view["arguments"] = Value::String(inner.to_string());
            Cow::Owned(view)
        }
        _ => Cow::Borrowed(arguments),
    }
}

fn build_operation(binding: &Binding, arguments: &Value) -> Result<Operation, ProbeError> {
    let text = |key: &str| {
        arguments
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    };
    let nested = || {
        coerce_tool_arguments(arguments.get("arguments").cloned().unwrap_or(Value::Null))
    };

    Ok(match binding {
        Binding::ListTools => Operation::ListTools,
        Binding::ListResources => Operation::ListResources,
        Binding::ListPrompts => Operation::ListPrompts,
        Binding::CallTool => Operation::call_tool(text("name"), nested()?),
        Binding::ReadResource => Operation::read_resource(text("uri")),
        Binding::GetPrompt => Operation::get_prompt(text("name"), nested()?),
        Binding::Shortcut { tool } => {
            let arguments = match arguments {
                Value::Object(map) => map.clone(),
                _ => JsonObject::new(),
            };
            Operation::call_tool(tool, arguments)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{BuiltinCatalog, ProfileSource};
    use serde_json::json;

    fn resolver() -> StructuredResolver {
        let profile = BuiltinCatalog::new().lookup(1).expect("challenge 1");
        StructuredResolver::new(Vocabulary::for_profile(&profile))
    }

    fn call(name: &str, arguments: Value) -> OperationCall {
        OperationCall::new("call-1", name, arguments)
    }

    #[test]
    fn listing_calls_resolve_without_arguments() {
        assert!(matches!(
            resolver().resolve(&call("list_mcp_resources", json!({}))),
            Resolution::Resolved(Operation::ListResources)
        ));
    }

    #[test]
    fn read_resource_requires_uri() {
        match resolver().resolve(&call("read_mcp_resource", json!({}))) {
            Resolution::Invalid(ProbeError::InvalidArgument(message)) => {
                assert!(message.contains("missing required field 'uri'"))
            }
            other => panic!("expected invalid arguments, got {other:?}"),
        }
    }

    #[test]
    fn call_tool_accepts_string_or_object_arguments() {
        let expected = Operation::call_tool(
            "get_user_info",
            json!({"username": "admin"}).as_object().cloned().unwrap_or_default(),
        );
        for arguments in [json!("{\"username\":\"admin\"}"), json!({"username": "admin"})] {
            match resolver().resolve(&call(
                "call_mcp_tool",
                json!({"name": "get_user_info", "arguments": arguments}),
            )) {
                Resolution::Resolved(operation) => assert_eq!(operation, expected),
                other => panic!("expected resolution, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_nested_arguments_are_invalid() {
        assert!(matches!(
            resolver().resolve(&call(
                "call_mcp_tool",
                json!({"name": "get_user_info", "arguments": "{broken"})
            )),
            Resolution::Invalid(ProbeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn shortcut_resolves_to_call_tool() {
        match resolver().resolve(&call("get_user_info", json!({"username": "admin"}))) {
            Resolution::Resolved(Operation::CallTool { name, arguments }) => {
                assert_eq!(name, "get_user_info");
                assert_eq!(arguments.get("username"), Some(&json!("admin")));
            }
            other => panic!("expected call_tool, got {other:?}"),
        }
    }

    #[test]
    fn unknown_name_is_unrecognized() {
        assert!(matches!(
            resolver().resolve(&call("delete_everything", json!({}))),
            Resolution::Unrecognized
        ));
    }
}
