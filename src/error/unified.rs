//! Unified error classification and recovery.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Connect, handshake or stream failure talking to an MCP endpoint.
    Transport,
    /// The server answered but the operation itself failed.
    Protocol,
    /// Arguments did not satisfy the operation's expected shape.
    Argument,
    Timeout,
    Canceled,
    /// The reasoning capability failed. Fatal to a turn.
    Reasoning,
    Authentication,
    RateLimit,
    Configuration,
    Serialization,
    Internal,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    CheckEndpoint,
    CheckArguments,
    CheckCredentials,
    CheckConfiguration,
    IncreaseTimeout,
    None,
}

impl RecoverySuggestion {
    /// One-line hint for the user, if there is a useful next step.
    pub fn hint(self) -> Option<&'static str> {
        match self {
            Self::RetryWithBackoff => Some("wait a moment and retry"),
            Self::CheckEndpoint => Some("check that the MCP server is running and the endpoint URL is correct"),
            Self::CheckArguments => Some("check the operation arguments"),
            Self::CheckCredentials => Some("set GOOGLE_API_KEY (or GEMINI_API_KEY)"),
            Self::CheckConfiguration => Some("check the config file and MCPROBE_* environment variables"),
            Self::IncreaseTimeout => Some("raise --timeout-ms or MCPROBE_OPERATION_TIMEOUT_MS"),
            Self::None => None,
        }
    }
}
