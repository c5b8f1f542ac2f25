//! Wire Protocol Module
//!
//! One JSON request and one JSON reply per connection, newline-delimited.

use serde::{Deserialize, Serialize};

// == Failure Reasons ==
pub const INVALID_OPERATION: &str = "Invalid operation";
pub const TIMED_OUT: &str = "Operation timed out";
pub const INTERRUPTED: &str = "Operation interrupted";
pub const EXECUTION_FAILED: &str = "Execution failed";

// == Wire Request ==
/// One decoded client request.
///
/// `id` is an opaque token echoed back in the reply. `timeout` is in
/// seconds; absent means the operation may run unbounded.
#[derive(Debug, Clone, Deserialize)]
pub struct WireRequest {
    /// Opaque echo token
    pub id: String,
    /// Operation name: search | getPage | zeitgeist | trending | peakLoad30s | stop
    #[serde(rename = "type")]
    pub op: String,
    /// Search query (required for search)
    #[serde(default)]
    pub query: Option<String>,
    /// Page title (required for getPage)
    #[serde(rename = "pageTitle", default)]
    pub page_title: Option<String>,
    /// Result cap for search | zeitgeist | trending
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Per-request deadline in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_limit() -> usize {
    10
}

// == Payload ==
/// Success payload: a title list, page text, or a string-encoded integer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Titles(Vec<String>),
    Text(String),
}

// == Result Envelope ==
/// Reply for every operation except `stop`.
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope {
    pub id: String,
    pub status: String,
    pub response: Payload,
}

impl ResultEnvelope {
    pub fn success(id: impl Into<String>, response: Payload) -> Self {
        Self {
            id: id.into(),
            status: "success".to_string(),
            response,
        }
    }

    pub fn failed(id: impl Into<String>, reason: &str) -> Self {
        Self {
            id: id.into(),
            status: "failed".to_string(),
            response: Payload::Text(reason.to_string()),
        }
    }
}

// == Bye Envelope ==
/// Reply for `stop`; deliberately has no `status` field.
#[derive(Debug, Clone, Serialize)]
pub struct ByeEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ByeEnvelope {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "bye".to_string(),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialize_full() {
        let raw = r#"{"id":"1","type":"search","query":"messi","limit":3,"timeout":5}"#;
        let request: WireRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.id, "1");
        assert_eq!(request.op, "search");
        assert_eq!(request.query.as_deref(), Some("messi"));
        assert_eq!(request.limit, 3);
        assert_eq!(request.timeout, Some(5));
    }

    #[test]
    fn test_request_defaults() {
        let raw = r#"{"id":"2","type":"zeitgeist"}"#;
        let request: WireRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.limit, 10);
        assert!(request.timeout.is_none());
        assert!(request.query.is_none());
        assert!(request.page_title.is_none());
    }

    #[test]
    fn test_request_page_title_field_name() {
        let raw = r#"{"id":"3","type":"getPage","pageTitle":"Rust"}"#;
        let request: WireRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.page_title.as_deref(), Some("Rust"));
    }

    #[test]
    fn test_request_missing_id_is_rejected() {
        let raw = r#"{"type":"search","query":"messi"}"#;
        assert!(serde_json::from_str::<WireRequest>(raw).is_err());
    }

    #[test]
    fn test_success_envelope_shape() {
        let envelope = ResultEnvelope::success("7", Payload::Titles(vec!["a".to_string()]));
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&envelope).unwrap()).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["status"], "success");
        assert_eq!(json["response"][0], "a");
    }

    #[test]
    fn test_failure_envelope_shape() {
        let envelope = ResultEnvelope::failed("7", TIMED_OUT);
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&envelope).unwrap()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["response"], "Operation timed out");
    }

    #[test]
    fn test_peak_payload_is_string_encoded() {
        let envelope = ResultEnvelope::success("7", Payload::Text(5u64.to_string()));
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&envelope).unwrap()).unwrap();
        assert_eq!(json["response"], "5");
    }

    #[test]
    fn test_bye_envelope_has_no_status() {
        let envelope = ByeEnvelope::new("9");
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&envelope).unwrap()).unwrap();
        assert_eq!(json["id"], "9");
        assert_eq!(json["type"], "bye");
        assert!(json.get("status").is_none());
    }
}
