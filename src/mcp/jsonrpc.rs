//! Minimal JSON-RPC 2.0 framing for MCP messages.

use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error code for unknown methods.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Error object carried by a JSON-RPC response.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

/// Classified inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Response {
        id: Value,
        outcome: Result<Value, RpcError>,
    },
    Request {
        id: Value,
        method: String,
    },
    Notification {
        method: String,
    },
    Invalid(String),
}

pub fn request(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "method": method,
        "params": params,
    })
}

pub fn notification(method: &str) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
    })
}

pub fn result_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

pub fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": { "code": code, "message": message },
    })
}

/// Classify a decoded message without failing on unexpected shapes.
pub fn classify(message: Value) -> Incoming {
    let mut map = match message {
        Value::Object(map) => map,
        other => return Incoming::Invalid(format!("expected JSON-RPC object, got {other}")),
    };

    let method = map
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_string);
    let id = map.remove("id").filter(|id| !id.is_null());

    match (method, id) {
        (Some(method), Some(id)) => Incoming::Request { id, method },
        (Some(method), None) => Incoming::Notification { method },
        (None, Some(id)) => {
            if let Some(error) = map.remove("error") {
                let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string();
                let data = error.get("data").cloned();
                Incoming::Response {
                    id,
                    outcome: Err(RpcError {
                        code,
                        message,
                        data,
                    }),
                }
            } else {
                let result = map.remove("result").unwrap_or(Value::Null);
                Incoming::Response {
                    id,
                    outcome: Ok(result),
                }
            }
        }
        (None, None) => Incoming::Invalid(format!(
            "message has neither id nor method: {}",
            Value::Object(map)
        )),
    }
}

/// Whether a response id matches the numeric request id we sent.
pub fn id_matches(id: &Value, expected: u64) -> bool {
    match id {
        Value::Number(n) => n.as_u64() == Some(expected),
        Value::String(s) => s.parse::<u64>().ok() == Some(expected),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_responses_requests_and_notifications() {
        assert_eq!(
            classify(json!({"jsonrpc":"2.0","id":3,"result":{"ok":true}})),
            Incoming::Response {
                id: json!(3),
                outcome: Ok(json!({"ok": true})),
            }
        );
        assert_eq!(
            classify(json!({"jsonrpc":"2.0","id":"p1","method":"ping"})),
            Incoming::Request {
                id: json!("p1"),
                method: "ping".into(),
            }
        );
        assert_eq!(
            classify(json!({"jsonrpc":"2.0","method":"notifications/message","params":{}})),
            Incoming::Notification {
                method: "notifications/message".into(),
            }
        );
        assert!(matches!(classify(json!([1, 2])), Incoming::Invalid(_)));
    }

    #[test]
    fn classifies_error_response() {
        let incoming = classify(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "error": {"code": -32602, "message": "Unknown resource"}
        }));
        let Incoming::Response { outcome: Err(error), .. } = &incoming else {
            panic!("expected error response, got {incoming:?}");
        };
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Unknown resource");
    }

    #[test]
    fn id_matching_accepts_numeric_strings() {
        assert!(id_matches(&json!(4), 4));
        assert!(id_matches(&json!("4"), 4));
        assert!(!id_matches(&json!(5), 4));
    }
}
