//! Hint agent: heuristic execution and plain reasoning fall-through.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use common::{answer, mock_mcp_server, ScriptedExecutor, ScriptedProvider};
use mcprobe::agent::HintAgent;
use mcprobe::challenge::{BuiltinCatalog, ChallengeProfile, ProfileSource};
use mcprobe::error::ProbeError;
use mcprobe::mcp::{Endpoint, SessionExecutor};
use mcprobe::types::{Message, Operation};

fn challenge_one() -> ChallengeProfile {
    BuiltinCatalog::new().lookup(1).unwrap()
}

#[tokio::test]
async fn list_resources_runs_without_reasoning() {
    let provider = Arc::new(ScriptedProvider::new());
    let executor = Arc::new(ScriptedExecutor::new());
    executor.respond(
        "list_resources",
        Duration::ZERO,
        json!({"resources": [{"uri": "notes://welcome", "name": "welcome"}]}),
    );
    let mut agent = HintAgent::new(challenge_one(), provider.clone(), executor.clone()).unwrap();

    let reply = agent
        .send("list resources and maybe internal://credentials", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(reply.executed, Some(Operation::ListResources));
    assert!(reply.text.starts_with("📋 Available MCP Resources:\n```json\n"));
    assert!(reply.text.ends_with("\n```"));
    assert!(reply.text.contains("notes://welcome"));
    assert_eq!(provider.calls(), 0);

    let messages = agent.conversation().messages();
    assert!(messages[0].is_system());
    assert_eq!(messages[1], Message::human("list resources and maybe internal://credentials"));
    assert_eq!(messages[2].text(), reply.text);
}

#[tokio::test]
async fn operation_failure_is_reported_in_reply() {
    let provider = Arc::new(ScriptedProvider::new());
    let executor = Arc::new(ScriptedExecutor::new());
    executor.fail("read_resource(notes://x)", Duration::ZERO, "connection refused");
    let mut agent = HintAgent::new(challenge_one(), provider.clone(), executor).unwrap();

    let reply = agent
        .send("read resource notes://x", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        reply.text,
        "📄 Read resource `notes://x`:\nError: read_resource(notes://x) failed: Transport error: connection refused"
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn unmatched_text_asks_reasoning_without_tools() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.queue(answer("Try looking at how notes:// reflects your input 🎯"));
    let executor = Arc::new(ScriptedExecutor::new());
    let mut agent = HintAgent::new(challenge_one(), provider.clone(), executor.clone()).unwrap();

    let reply = agent
        .send("give me a hint", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(reply.executed, None);
    assert_eq!(reply.text, "Try looking at how notes:// reflects your input 🎯");
    assert!(executor.started().is_empty());

    let request = &provider.requests()[0];
    assert!(request.tools.is_empty());
    assert!(request.messages[0].text().contains("Challenge 1"));
}

#[tokio::test]
async fn reasoning_failure_propagates() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.queue_error(ProbeError::Authentication("bad key".into()));
    let executor = Arc::new(ScriptedExecutor::new());
    let mut agent = HintAgent::new(challenge_one(), provider, executor).unwrap();

    let err = agent
        .send("what is prompt injection?", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ProbeError::Authentication(_)));
}

#[tokio::test]
async fn tool_execution_against_live_server() {
    let server = mock_mcp_server().await;
    let mut profile = challenge_one();
    profile.endpoint = Endpoint::new(format!("{}/mcp", server.uri()));
    let executor = Arc::new(SessionExecutor::new(
        profile.endpoint.clone(),
        Duration::from_secs(5),
    ));
    let provider = Arc::new(ScriptedProvider::new());
    let mut agent = HintAgent::new(profile, provider, executor).unwrap();

    let reply = agent
        .send("run tool get_user_info with user=admin", &CancellationToken::new())
        .await
        .unwrap();

    assert!(reply
        .text
        .starts_with("🔧 Executed tool `get_user_info(username='admin')`:\n```json"));
    assert!(reply.text.contains("User admin: role=admin"));
}
