//! Error types for mcprobe.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all mcprobe operations.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("MCP error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Canceled: {0}")]
    Canceled(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Reasoning error ({provider}): {message}")]
    Reasoning { provider: String, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProbeError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a reasoning failure attributed to `provider`.
    pub fn reasoning(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Reasoning {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Transport(_) | Self::Network(_) | Self::Io(_) => ErrorCategory::Transport,
            Self::Protocol { .. } | Self::ToolExecution { .. } => ErrorCategory::Protocol,
            Self::InvalidArgument(_) => ErrorCategory::Argument,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Canceled(_) => ErrorCategory::Canceled,
            Self::Reasoning { .. } => ErrorCategory::Reasoning,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                _ => ErrorCategory::Reasoning,
            },
            Self::InvalidState(_) => ErrorCategory::Internal,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        if let Self::Api { status, .. } = self {
            if (500..=599).contains(status) {
                return true;
            }
        }
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::Timeout | ErrorCategory::RateLimit
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Transport => RecoverySuggestion::CheckEndpoint,
            ErrorCategory::Argument => RecoverySuggestion::CheckArguments,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::RateLimit => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            _ => RecoverySuggestion::None,
        }
    }
}

/// Typed failure of one protocol operation.
///
/// Carries the operation label and the underlying cause. The conversation
/// loop renders it into the operation's tool result instead of aborting.
#[derive(Error, Debug)]
#[error("{operation} failed: {cause}")]
pub struct OperationError {
    pub operation: String,
    #[source]
    pub cause: ProbeError,
}

impl OperationError {
    pub fn new(operation: impl Into<String>, cause: ProbeError) -> Self {
        Self {
            operation: operation.into(),
            cause,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.cause.category()
    }

    /// Text shown to the conversation, always prefixed with `Error:`.
    pub fn to_tool_text(&self) -> String {
        format!("Error: {self}")
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ProbeError>;
