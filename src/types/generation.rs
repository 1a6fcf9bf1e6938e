//! Reasoning settings and related enums.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default reasoning model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default sampling temperature for challenge and hint agents.
pub const DEFAULT_TEMPERATURE: f64 = 0.8;

/// Settings controlling the reasoning capability.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct ReasoningSettings {
    #[builder(into, default = DEFAULT_MODEL.to_string())]
    pub model: String,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f64>,
}

impl Default for ReasoningSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_output_tokens: None,
            top_p: None,
        }
    }
}

/// Why generation finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error,
}
