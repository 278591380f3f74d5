//! Failure body construction.
//!
//! Two cases only: the upstream answered with a JSON object (annotate it
//! with `target`), or it did not (synthesize `{ error, target }`).

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::proxy::outcome::Payload;
use crate::upstream::TransportError;

/// Body returned after retries were exhausted on an upstream response.
pub fn annotate_failure(status: StatusCode, payload: &Payload, target: &str) -> Value {
    match payload.as_object() {
        Some(object) => {
            let mut merged = object.clone();
            merged.insert("target".to_string(), Value::String(target.to_string()));
            Value::Object(merged)
        }
        None => json!({
            "error": format!("Upstream returned {}", status.as_u16()),
            "target": target,
        }),
    }
}

/// Body returned after retries were exhausted without any response.
pub fn transport_failure_body(error: &TransportError, target: &str) -> Value {
    json!({
        "error": error.failure_message(),
        "target": target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: &str = "https://api.example.com/api/expenses";

    #[test]
    fn test_object_body_is_merged_with_target() {
        let payload = Payload::Json(json!({"error": "Database down", "code": 17}));
        let body = annotate_failure(StatusCode::SERVICE_UNAVAILABLE, &payload, TARGET);
        assert_eq!(body, json!({"error": "Database down", "code": 17, "target": TARGET}));
    }

    #[test]
    fn test_upstream_target_field_is_overwritten() {
        let payload = Payload::Json(json!({"target": "elsewhere"}));
        let body = annotate_failure(StatusCode::INTERNAL_SERVER_ERROR, &payload, TARGET);
        assert_eq!(body, json!({"target": TARGET}));
    }

    #[test]
    fn test_non_object_body_is_replaced() {
        for payload in [
            Payload::Text("<html>Bad Gateway</html>".into()),
            Payload::Json(json!(["a"])),
            Payload::Json(json!("oops")),
        ] {
            let body = annotate_failure(StatusCode::BAD_GATEWAY, &payload, TARGET);
            assert_eq!(body, json!({"error": "Upstream returned 502", "target": TARGET}));
        }
    }

    #[test]
    fn test_transport_failure_body() {
        let body = transport_failure_body(&TransportError::new("tcp connect error"), TARGET);
        assert_eq!(body, json!({"error": "tcp connect error", "target": TARGET}));

        let body = transport_failure_body(&TransportError::new(""), TARGET);
        assert_eq!(body["error"], "Proxy request failed");
    }
}
