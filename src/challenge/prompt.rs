//! System prompt text built from challenge profiles.

use std::fmt::Write;

use super::ChallengeProfile;

fn header(profile: &ChallengeProfile) -> String {
    let port = profile
        .port()
        .map(|port| port.to_string())
        .unwrap_or_else(|| profile.endpoint.url.clone());

    let mut out = format!(
        "**Challenge {}: {}**\nDifficulty: {} | Port: {port}\n\n{}\n",
        profile.id, profile.name, profile.difficulty, profile.description
    );

    out.push_str("\n**Available Tools/Resources:**\n");
    for resource in &profile.resources {
        if resource.description.is_empty() {
            let _ = writeln!(out, "- {}", resource.uri);
        } else {
            let _ = writeln!(out, "- {} - {}", resource.uri, resource.description);
        }
    }

    out.push_str("\n**Your Objectives:**\n");
    for (index, objective) in profile.objectives.iter().enumerate() {
        let _ = writeln!(out, "{}. {objective}", index + 1);
    }
    out
}

/// System prompt for the tool-calling challenge agent.
///
/// `operations` holds one signature line per declared operation, e.g.
/// `read_mcp_resource(uri) - Read an MCP resource`.
pub fn challenge_system_prompt(profile: &ChallengeProfile, operations: &[String]) -> String {
    let mut out = format!(
        "You are an MCP (Model Context Protocol) security testing assistant for Challenge {}.\n\n",
        profile.id
    );
    out.push_str(&header(profile));
    out.push_str(
        "\n**Your Role:**\n\
         - Help users explore and test this MCP server for vulnerabilities\n\
         - Use the available MCP tools to execute user requests\n\
         - Provide clear explanations of what you discover\n\
         - Format JSON results with markdown code blocks for better readability\n",
    );

    out.push_str("\n**Available MCP Operations:**\n");
    for line in operations {
        let _ = writeln!(out, "- {line}");
    }

    out.push_str(
        "\n**Important:**\n\
         - Be proactive in calling tools when users make requests\n\
         - Execute actual MCP operations rather than just explaining them\n\
         - Results starting with `Error:` are failures; decide whether to retry or try another operation\n\
         - Help users understand the security implications of what they discover\n",
    );
    let _ = write!(out, "\nReady to help you explore Challenge {}!", profile.id);
    out
}

/// System prompt for the hint agent, which teaches rather than solves.
pub fn hint_system_prompt(profile: &ChallengeProfile) -> String {
    let mut out = String::from(
        "You are a friendly and helpful MCP Security Training Assistant. Your role is to guide \
         users through hands-on security testing of vulnerable MCP servers by providing hints, \
         explanations, and encouragement.\n\n",
    );
    let _ = writeln!(out, "## Current Challenge\n**MCP Server**: {}", profile.endpoint.url);
    out.push_str(&header(profile));

    if !profile.tools.is_empty() {
        out.push_str("\n**Tools:**\n");
        for tool in &profile.tools {
            let _ = writeln!(
                out,
                "- `{}({})` - {}",
                tool.name,
                tool.params.join(", "),
                tool.description
            );
        }
    }

    out.push_str("\n**Progressive Hints:**\n");
    for (index, hint) in profile.hints.iter().enumerate() {
        let _ = writeln!(out, "{}. {hint}", index + 1);
    }

    out.push_str(
        "\n## How to Interact\n\
         - When users ask for hints, start gentle and get more specific only if they stay stuck\n\
         - When users share attempts, say whether they are close and suggest refinements\n\
         - Users can type `list tools`, `list resources`, `list prompts`, \
         `run tool <name> with <param>=<value>`, `read resource <uri>` or `get prompt <name>` \
         to run real MCP operations; never make up results\n\
         - Explain the \"why\" behind each security concept\n\n\
         Remember: your goal is to teach, not solve.",
    );
    out
}

/// System prompt for the orchestrator that routes users to a challenge.
pub fn orchestrator_system_prompt(profiles: &[ChallengeProfile]) -> String {
    let mut out =
        String::from("You are a Security Testing Orchestrator for MCP vulnerability challenges.\n\n**Available Challenges:**\n");
    for profile in profiles {
        let _ = writeln!(
            out,
            "- **Challenge {}**: {} ({}) at {}",
            profile.id, profile.name, profile.difficulty, profile.endpoint.url
        );
    }
    out.push_str(
        "\n**How to Use:**\n\
         Help the user choose a challenge, then point them at the challenge agent \
         (`mcprobe chat -c <N>`), which connects to its MCP server and runs real operations:\n\
         - `list tools` - See available MCP tools\n\
         - `list resources` - See available MCP resources\n\
         - `list prompts` - See available MCP prompts\n\
         - `run tool <name> with <args>` - Execute a tool\n\
         - `read resource <uri>` - Read a resource\n",
    );
    out
}
