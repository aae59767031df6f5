//! HTTP-shaped invocation results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::CostRecord;

/// Confirmation returned by the write path.
pub const LOGGED_MESSAGE: &str = "Cost logged successfully";

const MESSAGE_PREFIX: &str = "Estimated cost: $";
const MISSING_COST: &str = "N/A";

/// API Gateway proxy response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Already-encoded JSON.
    pub body: String,
}

impl HttpResponse {
    /// 200 with a JSON body and permissive CORS headers.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be encoded.
    pub fn json_with_cors<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status_code: 200,
            headers: Some(cors_headers()),
            body: serde_json::to_string(value)?,
        })
    }

    /// 200 with a JSON-encoded string body and no headers.
    ///
    /// # Errors
    ///
    /// Returns an error if `message` cannot be encoded.
    pub fn message(message: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status_code: 200,
            headers: None,
            body: serde_json::to_string(message)?,
        })
    }
}

fn cors_headers() -> BTreeMap<String, String> {
    [
        ("Content-Type", "application/json"),
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "GET, OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// One log line as the frontend expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub id: String,
}

impl From<&CostRecord> for LogEntry {
    fn from(record: &CostRecord) -> Self {
        Self {
            message: format!(
                "{MESSAGE_PREFIX}{}",
                record.cost.as_deref().unwrap_or(MISSING_COST)
            ),
            id: record.timestamp.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_log_entry_message() {
        let entry = LogEntry::from(&CostRecord::new("2024-01-01T00:00:00", "1.23"));
        assert_eq!(entry.message, "Estimated cost: $1.23");
        assert_eq!(entry.id, "2024-01-01T00:00:00");

        let entry = LogEntry::from(&CostRecord {
            timestamp: "t".to_string(),
            cost: None,
        });
        assert_eq!(entry.message, "Estimated cost: $N/A");
    }

    #[test]
    fn test_message_response_shape() {
        let response = HttpResponse::message(LOGGED_MESSAGE).unwrap();
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"statusCode": 200, "body": "\"Cost logged successfully\""})
        );
    }

    #[test]
    fn test_json_response_has_cors_headers() {
        let response = HttpResponse::json_with_cors(&Vec::<LogEntry>::new()).unwrap();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"], "[]");
        assert_eq!(
            value["headers"],
            json!({
                "Content-Type": "application/json",
                "Access-Control-Allow-Origin": "*",
                "Access-Control-Allow-Methods": "GET, OPTIONS",
                "Access-Control-Allow-Headers": "Content-Type"
            })
        );
    }

    #[test]
    fn test_entries_encode_with_exact_keys() {
        let entries = vec![LogEntry::from(&CostRecord::new("a", "0.00"))];
        let response = HttpResponse::json_with_cors(&entries).unwrap();
        let body: Value = serde_json::from_str(&response.body).unwrap();
        let object = body[0].as_object().unwrap();
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["id", "message"]);
    }
}
