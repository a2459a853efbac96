//! The uniform result envelope returned by every dispatch.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `{"status":"success","result":...}` or `{"status":"error","message":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Success { result: Value },
    Error { message: String },
}

impl Envelope {
    pub fn success(result: Value) -> Self {
        Envelope::Success { result }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Error {
            message: message.into(),
        }
    }

    /// Wrap a handler payload, forwarding it untouched when it is already an
    /// envelope of exactly the canonical shape.
    pub fn from_handler_value(value: Value) -> Self {
        if let Value::Object(map) = &value {
            if map.len() == 2 {
                match map.get("status").and_then(Value::as_str) {
                    Some("success") => {
                        if let Some(result) = map.get("result") {
                            return Envelope::success(result.clone());
                        }
                    }
                    Some("error") => {
                        if let Some(message) = map.get("message").and_then(Value::as_str) {
                            return Envelope::error(message);
                        }
                    }
                    _ => {}
                }
            }
        }
        Envelope::success(value)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        !self.is_success()
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            Envelope::Success { result } => Some(result),
            Envelope::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Envelope::Error { message } => Some(message),
            Envelope::Success { .. } => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Envelope::Success { result } => json!({"status": "success", "result": result}),
            Envelope::Error { message } => json!({"status": "error", "message": message}),
        }
    }
}

impl From<crate::Error> for Envelope {
    fn from(err: crate::Error) -> Self {
        Envelope::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_wire_shape() {
        let ok = serde_json::to_value(Envelope::success(json!({"tvl": 1.5}))).unwrap();
        assert_eq!(ok, json!({"status": "success", "result": {"tvl": 1.5}}));

        let err = serde_json::to_value(Envelope::error("boom")).unwrap();
        assert_eq!(err, json!({"status": "error", "message": "boom"}));
        assert_eq!(Envelope::error("boom").to_value(), err);
    }

    #[test]
    fn forwards_canonical_envelopes() {
        let env = Envelope::from_handler_value(json!({"status": "success", "result": [1, 2]}));
        assert_eq!(env, Envelope::success(json!([1, 2])));

        let env = Envelope::from_handler_value(json!({"status": "error", "message": "nope"}));
        assert_eq!(env, Envelope::error("nope"));
    }

    #[test]
    fn wraps_lookalike_payloads() {
        // extra key
        let payload = json!({"status": "success", "result": 1, "extra": true});
        assert_eq!(
            Envelope::from_handler_value(payload.clone()),
            Envelope::success(payload)
        );

        // non-string message
        let payload = json!({"status": "error", "message": 42});
        assert_eq!(
            Envelope::from_handler_value(payload.clone()),
            Envelope::success(payload)
        );

        let payload = json!({"status": "pending", "result": 1});
        assert_eq!(
            Envelope::from_handler_value(payload.clone()),
            Envelope::success(payload)
        );
    }

    #[test]
    fn crate_errors_become_failure_envelopes() {
        let env: Envelope = crate::Error::UnknownAction("NOPE".into()).into();
        assert_eq!(env.message(), Some("Unknown action: NOPE"));
        assert!(env.is_error());
    }
}
