//! The operation vocabulary declared to the reasoning capability.

use super::types::{OperationParameters, ToolDefinition};
use crate::challenge::ChallengeProfile;

pub const LIST_TOOLS: &str = "list_mcp_tools";
pub const LIST_RESOURCES: &str = "list_mcp_resources";
pub const LIST_PROMPTS: &str = "list_mcp_prompts";
pub const CALL_TOOL: &str = "call_mcp_tool";
pub const READ_RESOURCE: &str = "read_mcp_resource";
pub const GET_PROMPT: &str = "get_mcp_prompt";

/// Which protocol operation a declaration stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    ListTools,
    ListResources,
    ListPrompts,
    /// `call_mcp_tool(name, arguments?)`
    CallTool,
    /// `read_mcp_resource(uri)`
    ReadResource,
    /// `get_mcp_prompt(name, arguments?)`
    GetPrompt,
    /// A server tool declared directly under its own name.
    Shortcut { tool: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub definition: ToolDefinition,
    pub binding: Binding,
}

/// Ordered set of declarations; names are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    declarations: Vec<Declaration>,
}

impl Vocabulary {
    /// The six generic protocol operations.
    pub fn generic() -> Self {
        let arguments_doc =
            "JSON object of arguments, e.g. {\"username\": \"admin\"}. Omit when none.";
        let declare = |name: &str, description: &str, parameters, binding| Declaration {
            definition: ToolDefinition::new(name, description, parameters),
            binding,
        };

        Self {
            declarations: vec![
                declare(
                    LIST_TOOLS,
                    "List all available MCP tools from the server",
                    OperationParameters::empty(),
                    Binding::ListTools,
                ),
                declare(
                    LIST_RESOURCES,
                    "List all available MCP resources from the server",
                    OperationParameters::empty(),
                    Binding::ListResources,
                ),
                declare(
                    LIST_PROMPTS,
                    "List all available MCP prompts from the server",
                    OperationParameters::empty(),
                    Binding::ListPrompts,
                ),
                declare(
                    CALL_TOOL,
                    "Call a tool on the MCP server",
                    OperationParameters::object()
                        .string("name", "Tool name as listed by the server", true)
                        .string("arguments", arguments_doc, false)
                        .build(),
                    Binding::CallTool,
                ),
                declare(
                    READ_RESOURCE,
                    "Read a resource from the MCP server",
                    OperationParameters::object()
                        .string(
                            "uri",
                            "The resource URI (e.g. 'internal://credentials' or 'notes://user123')",
                            true,
                        )
                        .build(),
                    Binding::ReadResource,
                ),
                declare(
                    GET_PROMPT,
                    "Fetch a prompt template from the MCP server",
                    OperationParameters::object()
                        .string("name", "Prompt name as listed by the server", true)
                        .string("arguments", arguments_doc, false)
                        .build(),
                    Binding::GetPrompt,
                ),
            ],
        }
    }

    /// Generic operations plus a shortcut for every tool the profile names.
    pub fn for_profile(profile: &ChallengeProfile) -> Self {
        let mut vocabulary = Self::generic();
        for tool in &profile.tools {
            if vocabulary.lookup(&tool.name).is_some() {
                continue;
            }
            let parameters = tool
                .params
                .iter()
                .fold(OperationParameters::object(), |builder, param| {
                    builder.string(param, format!("The {} to use", param.replace('_', " ")), true)
                })
                .build();
            vocabulary.declarations.push(Declaration {
                definition: ToolDefinition::new(&tool.name, &tool.description, parameters),
                binding: Binding::Shortcut {
                    tool: tool.name.clone(),
                },
            });
        }
        vocabulary
    }

    pub fn lookup(&self, name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|declaration| declaration.definition.name == name)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.declarations
            .iter()
            .map(|declaration| declaration.definition.clone())
            .collect()
    }

    /// Signature lines for system prompts.
    pub fn signatures(&self) -> Vec<String> {
        self.declarations
            .iter()
            .map(|declaration| declaration.definition.signature())
            .collect()
    }
}
