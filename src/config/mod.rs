//! Configuration (layered: defaults < TOML file < environment < CLI flags).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::ProbeError;
use crate::mcp::Endpoint;
use crate::types::ReasoningSettings;

/// Number of built-in challenge endpoints.
pub const CHALLENGE_COUNT: u32 = 10;

pub const DEFAULT_MAX_TURNS: usize = 20;

/// Default budget for connect, handshake and the operation together.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

const CONFIG_ENV: &str = "MCPROBE_CONFIG";
const ENDPOINT_ENV_PREFIX: &str = "MCPROBE_ENDPOINT_";

/// Explicit configuration value passed into agents and the conversation loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub reasoning: ReasoningSettings,
    /// Upper bound on reasoning calls per user turn.
    pub max_turns: usize,
    /// Budget for connect, handshake and one operation.
    pub operation_timeout: Duration,
    pub endpoints: BTreeMap<u32, Endpoint>,
    pub google_api_key: Option<String>,
    pub google_base_url: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            reasoning: ReasoningSettings::default(),
            max_turns: DEFAULT_MAX_TURNS,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            endpoints: (1..=CHALLENGE_COUNT)
                .map(|id| (id, Endpoint::local_challenge(id)))
                .collect(),
            google_api_key: None,
            google_base_url: None,
        }
    }
}

/// On-disk form. Every field is optional and only overrides what it names.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    model: Option<String>,
    temperature: Option<f64>,
    max_output_tokens: Option<u32>,
    max_turns: Option<usize>,
    operation_timeout_ms: Option<u64>,
    google_api_key: Option<String>,
    google_base_url: Option<String>,
    #[serde(default)]
    endpoints: BTreeMap<String, EndpointEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EndpointEntry {
    Url(String),
    Full(Endpoint),
}

impl ProbeConfig {
    /// Load defaults, then the config file, then `.env` and process environment.
    pub fn load() -> Result<Self, ProbeError> {
        let _ = dotenvy::dotenv(); // .env is optional

        let mut config = Self::default();
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match explicit.or_else(default_config_path) {
            Some(path) if path.exists() => config.apply_file(&path)?,
            Some(path) => debug!(path = %path.display(), "no config file"),
            None => {}
        }
        config.apply_env_vars(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_file(&mut self, path: &Path) -> Result<(), ProbeError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loading config file");
        self.apply_toml(&raw)
    }

    pub fn apply_toml(&mut self, raw: &str) -> Result<(), ProbeError> {
        let file: FileConfig = toml::from_str(raw)
            .map_err(|e| ProbeError::Configuration(format!("invalid config file: {e}")))?;

        if let Some(model) = file.model {
            self.reasoning.model = model;
        }
        if file.temperature.is_some() {
            self.reasoning.temperature = file.temperature;
        }
        if file.max_output_tokens.is_some() {
            self.reasoning.max_output_tokens = file.max_output_tokens;
        }
        if let Some(turns) = file.max_turns {
            self.max_turns = turns;
        }
        if let Some(ms) = file.operation_timeout_ms {
            self.operation_timeout = Duration::from_millis(ms);
        }
        if file.google_api_key.is_some() {
            self.google_api_key = file.google_api_key;
        }
        if file.google_base_url.is_some() {
            self.google_base_url = file.google_base_url;
        }
        for (key, entry) in file.endpoints {
            let id = parse_challenge_id(&key, &format!("endpoints.{key}"))?;
            let endpoint = match entry {
                EndpointEntry::Url(url) => Endpoint::new(url),
                EndpointEntry::Full(endpoint) => endpoint,
            };
            self.endpoints.insert(id, endpoint);
        }
        Ok(())
    }

    /// Apply recognised environment variables from `vars`.
    pub fn apply_env_vars<I>(&mut self, vars: I) -> Result<(), ProbeError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut gemini_key = None;
        for (key, value) in vars {
            match key.as_str() {
                "GEMINI_MODEL" => self.reasoning.model = value,
                "GOOGLE_API_KEY" => self.google_api_key = Some(value),
                "GEMINI_API_KEY" => gemini_key = Some(value),
                "GOOGLE_BASE_URL" => self.google_base_url = Some(value),
                "MCPROBE_TEMPERATURE" => {
                    self.reasoning.temperature = Some(parse_value(&key, &value)?);
                }
                "MCPROBE_MAX_TURNS" => self.max_turns = parse_value(&key, &value)?,
                "MCPROBE_OPERATION_TIMEOUT_MS" => {
                    self.operation_timeout = Duration::from_millis(parse_value(&key, &value)?);
                }
                _ => {
                    if let Some(suffix) = key.strip_prefix(ENDPOINT_ENV_PREFIX) {
                        let id = parse_challenge_id(suffix, &key)?;
                        self.endpoints.insert(id, Endpoint::new(value));
                    }
                }
            }
        }
        // GOOGLE_API_KEY wins when both are set.
        if self.google_api_key.is_none() {
            self.google_api_key = gemini_key;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.max_turns == 0 {
            return Err(ProbeError::Configuration(
                "max_turns must be at least 1".into(),
            ));
        }
        if self.operation_timeout.is_zero() {
            return Err(ProbeError::Configuration(
                "operation_timeout must be positive".into(),
            ));
        }
        if let Some(temperature) = self.reasoning.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ProbeError::Configuration(format!(
                    "temperature {temperature} outside 0.0..=2.0"
                )));
            }
        }
        if self.reasoning.model.trim().is_empty() {
            return Err(ProbeError::Configuration("model must not be empty".into()));
        }
        Ok(())
    }

    /// Endpoint configured for a challenge id.
    pub fn endpoint(&self, id: u32) -> Option<&Endpoint> {
        self.endpoints.get(&id)
    }

    pub fn with_endpoint(mut self, id: u32, endpoint: Endpoint) -> Self {
        self.endpoints.insert(id, endpoint);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.reasoning.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.reasoning.temperature = Some(temperature);
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// `<config dir>/mcprobe/config.toml` for the current platform.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "mcprobe")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ProbeError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ProbeError::Configuration(format!("{key}={value:?}: {e}")))
}

fn parse_challenge_id(raw: &str, key: &str) -> Result<u32, ProbeError> {
    parse_value::<u32>(key, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::TransportKind;
    use crate::types::DEFAULT_MODEL;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_cover_all_challenges() {
        let config = ProbeConfig::default();
        assert_eq!(config.reasoning.model, DEFAULT_MODEL);
        assert_eq!(config.max_turns, DEFAULT_MAX_TURNS);
        assert_eq!(config.endpoints.len(), 10);
        assert_eq!(
            config.endpoint(3).map(|e| e.url.as_str()),
            Some("http://localhost:9003/sse")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let mut config = ProbeConfig::default();
        config
            .apply_toml(
                r#"
model = "gemini-2.0-flash"
max_turns = 5

[endpoints]
2 = "http://10.0.0.5:9002/sse"
4 = { url = "http://10.0.0.5:9004/mcp", transport = "streamable-http" }
"#,
            )
            .expect("valid toml");

        assert_eq!(config.reasoning.model, "gemini-2.0-flash");
        assert_eq!(config.reasoning.temperature, Some(0.8));
        assert_eq!(config.max_turns, 5);
        assert_eq!(config.endpoint(2).map(|e| e.transport), Some(TransportKind::Sse));
        assert_eq!(
            config.endpoint(4).map(|e| e.transport),
            Some(TransportKind::StreamableHttp)
        );
    }

    #[test]
    fn unknown_toml_key_is_configuration_error() {
        let err = ProbeConfig::default()
            .apply_toml("modle = \"typo\"")
            .expect_err("unknown key");
        assert!(matches!(err, ProbeError::Configuration(_)));
    }

    #[test]
    fn env_vars_override_and_name_bad_keys() {
        let mut config = ProbeConfig::default();
        config
            .apply_env_vars(vars(&[
                ("GEMINI_MODEL", "gemini-pro"),
                ("GEMINI_API_KEY", "fallback"),
                ("GOOGLE_API_KEY", "primary"),
                ("MCPROBE_ENDPOINT_7", "http://remote:9007/sse"),
                ("MCPROBE_OPERATION_TIMEOUT_MS", "1500"),
                ("UNRELATED", "x"),
            ]))
            .expect("valid env");
        assert_eq!(config.reasoning.model, "gemini-pro");
        assert_eq!(config.google_api_key.as_deref(), Some("primary"));
        assert_eq!(config.operation_timeout, Duration::from_millis(1500));
        assert_eq!(
            config.endpoint(7).map(|e| e.url.as_str()),
            Some("http://remote:9007/sse")
        );

        let err = ProbeConfig::default()
            .apply_env_vars(vars(&[("MCPROBE_MAX_TURNS", "many")]))
            .expect_err("not a number");
        assert!(err.to_string().contains("MCPROBE_MAX_TURNS"));
    }

    #[test]
    fn gemini_key_used_when_google_key_missing() {
        let mut config = ProbeConfig::default();
        config
            .apply_env_vars(vars(&[("GEMINI_API_KEY", "gem")]))
            .expect("valid env");
        assert_eq!(config.google_api_key.as_deref(), Some("gem"));
    }

    #[test]
    fn validation_rejects_zero_turns_and_bad_temperature() {
        assert!(ProbeConfig::default().with_max_turns(0).validate().is_err());
        assert!(ProbeConfig::default().with_temperature(3.5).validate().is_err());
    }
}
