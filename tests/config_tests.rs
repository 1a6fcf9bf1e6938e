//! Configuration layering: defaults, TOML file, environment.

use std::io::Write;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use pretty_assertions::assert_eq;

use mcprobe::config::ProbeConfig;
use mcprobe::error::ProbeError;
use mcprobe::mcp::{Endpoint, TransportKind};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 9] = [
    "MCPROBE_CONFIG",
    "GEMINI_MODEL",
    "GOOGLE_API_KEY",
    "GEMINI_API_KEY",
    "GOOGLE_BASE_URL",
    "MCPROBE_TEMPERATURE",
    "MCPROBE_MAX_TURNS",
    "MCPROBE_OPERATION_TIMEOUT_MS",
    "MCPROBE_ENDPOINT_2",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn file_overrides_defaults_and_keeps_the_rest() {
    let file = write_config(
        r#"
model = "gemini-2.5-pro"
max_turns = 8
operation_timeout_ms = 1500

[endpoints]
3 = "http://lab.internal:9003/sse"
4 = { url = "http://lab.internal:9004/mcp", transport = "streamable-http", headers = { Authorization = "Bearer t" } }
"#,
    );

    let mut config = ProbeConfig::default();
    config.apply_file(file.path()).unwrap();

    assert_eq!(config.reasoning.model, "gemini-2.5-pro");
    assert_eq!(config.reasoning.temperature, Some(0.8));
    assert_eq!(config.max_turns, 8);
    assert_eq!(config.operation_timeout, Duration::from_millis(1500));
    assert_eq!(
        config.endpoint(3),
        Some(&Endpoint::sse("http://lab.internal:9003/sse"))
    );
    let four = config.endpoint(4).unwrap();
    assert_eq!(four.transport, TransportKind::StreamableHttp);
    assert_eq!(four.headers.get("Authorization").map(String::as_str), Some("Bearer t"));
    assert_eq!(config.endpoint(1), Some(&Endpoint::local_challenge(1)));
}

#[test]
fn unknown_file_keys_are_rejected() {
    let file = write_config("modle = \"typo\"\n");
    let err = ProbeConfig::default().apply_file(file.path()).unwrap_err();
    assert!(matches!(err, ProbeError::Configuration(message) if message.contains("modle")));
}

#[test]
fn load_layers_file_then_environment() {
    let _lock = env_lock();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }

    let file = write_config("model = \"from-file\"\nmax_turns = 4\ntemperature = 0.3\n");
    std::env::set_var("MCPROBE_CONFIG", file.path());
    std::env::set_var("MCPROBE_MAX_TURNS", "6");
    std::env::set_var("GEMINI_API_KEY", "gemini-key");
    std::env::set_var("MCPROBE_ENDPOINT_2", "http://10.1.1.1:9002/mcp");

    let config = ProbeConfig::load().unwrap();

    assert_eq!(config.reasoning.model, "from-file");
    assert_eq!(config.reasoning.temperature, Some(0.3));
    assert_eq!(config.max_turns, 6);
    assert_eq!(config.google_api_key.as_deref(), Some("gemini-key"));
    assert_eq!(
        config.endpoint(2).map(|e| e.transport),
        Some(TransportKind::StreamableHttp)
    );
}

#[test]
fn load_rejects_invalid_environment_values() {
    let _lock = env_lock();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
    let missing = tempfile::tempdir().unwrap();
    std::env::set_var("MCPROBE_CONFIG", missing.path().join("absent.toml"));

    std::env::set_var("MCPROBE_MAX_TURNS", "0");
    let err = ProbeConfig::load().unwrap_err();
    assert!(matches!(err, ProbeError::Configuration(message) if message.contains("max_turns")));

    std::env::set_var("MCPROBE_MAX_TURNS", "many");
    let err = ProbeConfig::load().unwrap_err();
    assert!(
        matches!(err, ProbeError::Configuration(message) if message.contains("MCPROBE_MAX_TURNS"))
    );
}
