//! Declarations offered to the reasoning capability.

use serde::{Deserialize, Serialize};

/// JSON Schema describing a declaration's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationParameters {
    pub schema: serde_json::Value,
}

impl OperationParameters {
    pub fn from_schema(schema: serde_json::Value) -> Self {
        Self { schema }
    }

    /// Schema with no parameters.
    pub fn empty() -> Self {
        Self::object().build()
    }

    pub fn object() -> ParameterBuilder {
        ParameterBuilder {
            properties: serde_json::Map::new(),
            required: Vec::new(),
        }
    }

    /// Names of declared properties, in schema order.
    pub fn property_names(&self) -> Vec<&str> {
        self.schema
            .get("properties")
            .and_then(|v| v.as_object())
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Builder for object parameter schemas.
pub struct ParameterBuilder {
    properties: serde_json::Map<String, serde_json::Value>,
    required: Vec<String>,
}

impl ParameterBuilder {
    pub fn string(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            serde_json::json!({
                "type": "string",
                "description": description.into(),
            }),
        );
        if required {
            self.required.push(name);
        }
        self
    }

    pub fn build(self) -> OperationParameters {
        OperationParameters {
            schema: serde_json::json!({
                "type": "object",
                "properties": self.properties,
                "required": self.required,
            }),
        }
    }
}

/// One function declaration: name, description and parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: OperationParameters,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: OperationParameters,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// `name(a, b) - description`, as listed in system prompts.
    pub fn signature(&self) -> String {
        format!(
            "{}({}) - {}",
            self.name,
            self.parameters.property_names().join(", "),
            self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_records_required_strings() {
        let params = OperationParameters::object()
            .string("uri", "Resource URI", true)
            .string("note", "Optional note", false)
            .build();
        assert_eq!(params.schema["required"], json!(["uri"]));
        assert_eq!(params.schema["properties"]["uri"]["type"], "string");
    }

    #[test]
    fn signature_lists_parameters() {
        let definition = ToolDefinition::new(
            "read_mcp_resource",
            "Read an MCP resource",
            OperationParameters::object().string("uri", "Resource URI", true).build(),
        );
        assert_eq!(definition.signature(), "read_mcp_resource(uri) - Read an MCP resource");
        assert_eq!(
            ToolDefinition::new("list_mcp_tools", "List tools", OperationParameters::empty())
                .signature(),
            "list_mcp_tools() - List tools"
        );
    }
}
