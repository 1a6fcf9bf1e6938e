//! Heuristic strategy: ordered trigger rules over free text.
//!
//! Rules are checked in table order and the first rule whose trigger phrase
//! appears in the message decides the outcome, even when its extractor then
//! finds nothing. Listing intents come first, so "list resources" wins over a
//! URI elsewhere in the same message. Order: tools, resources and prompts
//! listings, then tool execution, resource read, prompt fetch.

use regex::Regex;
use tracing::debug;

use crate::challenge::ToolSummary;
use crate::error::ProbeError;
use crate::types::{JsonObject, Operation};

/// A resolved operation and the rule that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicMatch {
    pub rule: &'static str,
    pub operation: Operation,
}

/// The message in both forms: triggers match lowercase, values keep case.
struct Utterance<'a> {
    original: &'a str,
    lowered: String,
}

type Extractor = fn(&HeuristicResolver, &Utterance<'_>) -> Option<Operation>;

struct Rule {
    name: &'static str,
    triggers: &'static [&'static str],
    extract: Extractor,
}

const RULES: &[Rule] = &[
    Rule {
        name: "list_tools",
        triggers: &["list tools", "show tools", "available tools"],
        extract: |_, _| Some(Operation::ListTools),
    },
    Rule {
        name: "list_resources",
        triggers: &["list resources", "show resources", "available resources"],
        extract: |_, _| Some(Operation::ListResources),
    },
    Rule {
        name: "list_prompts",
        triggers: &["list prompts", "show prompts", "available prompts"],
        extract: |_, _| Some(Operation::ListPrompts),
    },
    Rule {
        name: "call_tool",
        triggers: &["run tool", "execute tool", "call tool", "use tool"],
        extract: HeuristicResolver::extract_tool_call,
    },
    Rule {
        name: "read_resource",
        triggers: &["read resource", "access resource", "get resource", "fetch resource"],
        extract: HeuristicResolver::extract_resource_read,
    },
    Rule {
        name: "get_prompt",
        triggers: &["get prompt", "use prompt", "fetch prompt", "show prompt"],
        extract: HeuristicResolver::extract_prompt_get,
    },
];

struct KnownTool {
    name: String,
    params: Vec<(String, Regex)>,
}

/// Resolves free text against the tools a challenge is known to expose.
pub struct HeuristicResolver {
    tools: Vec<KnownTool>,
    user_alias: Regex,
    uri: Regex,
    prompt_name: Regex,
}

impl HeuristicResolver {
    pub fn new(tools: &[ToolSummary]) -> Result<Self, ProbeError> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| ProbeError::Configuration(format!("invalid pattern {pattern:?}: {e}")))
        };

        let mut known = Vec::with_capacity(tools.len());
        for tool in tools {
            let mut params = Vec::with_capacity(tool.params.len());
            for param in &tool.params {
                let pattern = format!(
                    r#"(?i)\b{}[\s=:]+(?:"([^"]*)"|'([^']*)'|([^\s,]+))"#,
                    regex::escape(param)
                );
                params.push((param.clone(), compile(&pattern)?));
            }
            known.push(KnownTool {
                name: tool.name.to_lowercase(),
                params,
            });
        }
        // Longer names first so `check_system_status` loses to its shadow.
        known.sort_by(|a, b| b.name.len().cmp(&a.name.len()));

        Ok(Self {
            tools: known,
            user_alias: compile(r"(?i)\b(?:user|username)[\s=:]+(\w+)")?,
            uri: compile(r"(\w+://[\w/\-]+)")?,
            prompt_name: compile(r"(?i)\bprompt\s+([\w\-]+)")?,
        })
    }

    /// First rule whose trigger matches decides; `None` means no operation.
    pub fn resolve(&self, text: &str) -> Option<HeuristicMatch> {
        let utterance = Utterance {
            original: text,
            lowered: text.to_lowercase(),
        };

        let rule = RULES.iter().find(|rule| {
            rule.triggers
                .iter()
                .any(|trigger| utterance.lowered.contains(trigger))
        })?;

        match (rule.extract)(self, &utterance) {
            Some(operation) => Some(HeuristicMatch {
                rule: rule.name,
                operation,
            }),
            None => {
                debug!(rule = rule.name, "trigger matched but no operation could be extracted");
                None
            }
        }
    }

    fn extract_tool_call(&self, utterance: &Utterance<'_>) -> Option<Operation> {
        let tool = self
            .tools
            .iter()
            .find(|tool| utterance.lowered.contains(&tool.name))?;

        let mut arguments = JsonObject::new();
        for (param, pattern) in &tool.params {
            let value = pattern
                .captures(utterance.original)
                .and_then(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
                .map(|m| m.as_str().to_string())
                .or_else(|| {
                    (param == "username")
                        .then(|| self.user_alias.captures(utterance.original))
                        .flatten()
                        .and_then(|caps| caps.get(1))
                        .map(|m| m.as_str().to_string())
                });
            if let Some(value) = value {
                arguments.insert(param.clone(), value.into());
            }
        }

        if !tool.params.is_empty() && arguments.is_empty() {
            return None;
        }
        Some(Operation::call_tool(tool.name.clone(), arguments))
    }

    fn extract_resource_read(&self, utterance: &Utterance<'_>) -> Option<Operation> {
        let uri = self.uri.captures(utterance.original)?.get(1)?;
        Some(Operation::read_resource(uri.as_str()))
    }

    fn extract_prompt_get(&self, utterance: &Utterance<'_>) -> Option<Operation> {
        let name = self.prompt_name.captures(utterance.original)?.get(1)?;
        Some(Operation::get_prompt(name.as_str(), JsonObject::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{BuiltinCatalog, ProfileSource};
    use serde_json::json;

    fn resolver(challenge: u32) -> HeuristicResolver {
        let profile = BuiltinCatalog::new().lookup(challenge).expect("known challenge");
        HeuristicResolver::new(&profile.tools).expect("patterns compile")
    }

    fn operation(challenge: u32, text: &str) -> Option<Operation> {
        resolver(challenge).resolve(text).map(|m| m.operation)
    }

    #[test]
    fn listing_intents_resolve() {
        assert_eq!(operation(1, "please list tools"), Some(Operation::ListTools));
        assert_eq!(operation(1, "Show Prompts"), Some(Operation::ListPrompts));
    }

    #[test]
    fn listing_wins_over_uri() {
        let found = resolver(1)
            .resolve("list resources, then read resource internal://credentials")
            .expect("listing intent");
        assert_eq!(found.rule, "list_resources");
        assert_eq!(found.operation, Operation::ListResources);
    }

    #[test]
    fn tool_call_uses_user_alias() {
        assert_eq!(
            operation(1, "run tool get_user_info with user=admin"),
            Some(Operation::call_tool(
                "get_user_info",
                json!({"username": "admin"}).as_object().cloned().unwrap_or_default()
            ))
        );
    }

    #[test]
    fn tool_call_extracts_named_params_preserving_case() {
        assert_eq!(
            operation(9, "execute tool ping_host host=\"127.0.0.1; id\" count: 2"),
            Some(Operation::call_tool(
                "ping_host",
                json!({"host": "127.0.0.1; id", "count": "2"})
                    .as_object()
                    .cloned()
                    .unwrap_or_default()
            ))
        );
    }

    #[test]
    fn longest_tool_name_wins() {
        let found = operation(10, "call tool malicious_check_system_status");
        assert!(matches!(found, Some(Operation::CallTool { name, .. }) if name == "malicious_check_system_status"));
    }

    #[test]
    fn execution_intent_without_known_tool_is_silent() {
        assert_eq!(operation(1, "run tool something_else"), None);
        assert_eq!(operation(1, "run tool get_user_info"), None);
    }

    #[test]
    fn resource_read_keeps_original_case() {
        assert_eq!(
            operation(1, "Read resource notes://Admin"),
            Some(Operation::read_resource("notes://Admin"))
        );
    }

    #[test]
    fn prompt_fetch_extracts_name() {
        assert_eq!(
            operation(1, "get prompt summarize-notes"),
            Some(Operation::get_prompt("summarize-notes", JsonObject::new()))
        );
    }

    #[test]
    fn plain_text_produces_nothing() {
        assert_eq!(operation(1, "what is prompt injection?"), None);
    }
}
