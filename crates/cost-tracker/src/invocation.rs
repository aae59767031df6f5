//! Invocation payload classification.

use serde_json::Value;

/// Payload field carrying the HTTP method on API Gateway proxy events.
const HTTP_METHOD_FIELD: &str = "httpMethod";

/// What an invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// Scheduled or any other non-GET trigger: log yesterday's cost.
    Scheduled,
    /// HTTP GET: return logged entries.
    HttpGet,
}

impl Invocation {
    /// Classify a raw payload.
    ///
    /// Only an object whose `httpMethod` is exactly `"GET"` is a read.
    /// Everything else, including `OPTIONS` preflights and non-object
    /// payloads, is a scheduled write.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        match payload.get(HTTP_METHOD_FIELD).and_then(Value::as_str) {
            Some("GET") => Self::HttpGet,
            _ => Self::Scheduled,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::HttpGet => "http_get",
        }
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
