//! mcprobe: a conversational security-probing client for MCP servers.
//!
//! A reasoning model drives a bounded reason-act loop whose actions are MCP
//! protocol operations (list tools/resources/prompts, call a tool, read a
//! resource, fetch a prompt) against deliberately vulnerable challenge
//! servers. Each operation opens its own session, and every result is
//! normalized into pretty JSON before it re-enters the conversation.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use mcprobe::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> mcprobe::error::Result<()> {
//! let config = ProbeConfig::load()?;
//! let profile = BuiltinCatalog::from_config(&config)
//!     .lookup(1)
//!     .expect("challenge 1 is built in");
//! let executor = Arc::new(SessionExecutor::new(profile.endpoint.clone(), config.operation_timeout));
//! let mut agent = ChallengeAgent::new(profile, create_provider(&config)?, executor);
//! let answer = agent.send("list resources", &CancellationToken::new()).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod agent_loop;
pub mod challenge;
pub mod config;
pub mod error;
pub mod mcp;
pub mod prelude;
pub mod provider;
pub mod resolver;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
