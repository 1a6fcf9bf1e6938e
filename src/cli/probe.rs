//! Raw protocol script behind `mcprobe probe`.

use std::io::Write;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::challenge::ChallengeProfile;
use crate::error::ProbeError;
use crate::mcp::{NormalizedPayload, OperationExecutor};
use crate::types::{JsonObject, Operation};

use super::ProbeCommand;

/// Counts of probe steps by result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Run one probe command, writing each step's heading and result to `out`.
///
/// Operation failures are written as `Error: ...` lines and counted; only
/// bad arguments and output errors abort the script.
pub async fn run_probe<W: Write>(
    executor: &dyn OperationExecutor,
    profile: &ChallengeProfile,
    command: &ProbeCommand,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<ProbeSummary, ProbeError> {
    let mut script = Script {
        executor,
        cancel,
        out,
        summary: ProbeSummary::default(),
    };

    match command {
        ProbeCommand::ListTools => {
            script.step("🛠️  Tools", &Operation::ListTools).await?;
        }
        ProbeCommand::ListResources => {
            script.step("📁 Resources", &Operation::ListResources).await?;
        }
        ProbeCommand::ListPrompts => {
            script.step("💬 Prompts", &Operation::ListPrompts).await?;
        }
        ProbeCommand::CallTool { name, args } => {
            let operation = Operation::call_tool(name.clone(), parse_object(args.as_deref())?);
            script.step("⚙️  Tool result", &operation).await?;
        }
        ProbeCommand::ReadResource { uri } => {
            script
                .step("📄 Resource", &Operation::read_resource(uri.clone()))
                .await?;
        }
        ProbeCommand::GetPrompt { name, args } => {
            let operation = Operation::get_prompt(name.clone(), parse_object(args.as_deref())?);
            script.step("💬 Prompt", &operation).await?;
        }
        ProbeCommand::Smoke { sample } => {
            let resources = script.step("📁 Resources", &Operation::ListResources).await?;
            let tools = script.step("🛠️  Tools", &Operation::ListTools).await?;

            let first_uri = resources
                .as_ref()
                .and_then(|payload| payload.resource_uris().first().map(|uri| uri.to_string()));
            if let Some(uri) = first_uri {
                script
                    .step("📄 First resource", &Operation::read_resource(uri))
                    .await?;
            }

            let first_tool = tools
                .as_ref()
                .and_then(|payload| payload.tool_names().first().map(|name| name.to_string()));
            if let Some(name) = first_tool {
                let arguments: JsonObject = profile
                    .tool(&name)
                    .map(|tool| {
                        tool.params
                            .iter()
                            .map(|param| (param.clone(), Value::String(sample.clone())))
                            .collect()
                    })
                    .unwrap_or_default();
                script
                    .step("⚙️  First tool", &Operation::call_tool(name, arguments))
                    .await?;
            }
        }
    }

    Ok(script.summary)
}

struct Script<'a, W: Write> {
    executor: &'a dyn OperationExecutor,
    cancel: &'a CancellationToken,
    out: &'a mut W,
    summary: ProbeSummary,
}

impl<W: Write> Script<'_, W> {
    async fn step(
        &mut self,
        heading: &str,
        operation: &Operation,
    ) -> Result<Option<NormalizedPayload>, ProbeError> {
        writeln!(self.out, "\n{heading} [{}]", operation.label())?;
        match self.executor.execute(operation, self.cancel).await {
            Ok(payload) => {
                writeln!(self.out, "{}", payload.render())?;
                self.summary.succeeded += 1;
                Ok(Some(payload))
            }
            Err(err) => {
                writeln!(self.out, "{}", err.to_tool_text())?;
                self.summary.failed += 1;
                Ok(None)
            }
        }
    }
}

fn parse_object(raw: Option<&str>) -> Result<JsonObject, ProbeError> {
    let Some(raw) = raw else {
        return Ok(JsonObject::new());
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ProbeError::InvalidArgument(format!(
            "--args must be a JSON object, got {other}"
        ))),
        Err(e) => Err(ProbeError::InvalidArgument(format!("--args is not valid JSON: {e}"))),
    }
}
