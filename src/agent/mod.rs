//! Conversational agents built on the loop, the resolvers and the session client.

pub mod challenge;
pub mod hint;
pub mod orchestrator;

pub use challenge::ChallengeAgent;
pub use hint::{HintAgent, HintReply};
pub use orchestrator::Orchestrator;
