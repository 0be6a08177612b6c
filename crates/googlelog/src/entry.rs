use std::collections::HashMap;

use chrono::{DateTime, Utc};
use google_logging2::api::LogEntry;
use serde_json::{Map, Value};

use crate::Severity;

/// A structured log entry waiting to be handed to a [`LogClient`](crate::LogClient).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    pub severity: Severity,
    /// Becomes the `jsonPayload` of the [LogEntry](https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry).
    pub payload: Map<String, Value>,
    /// When unset, the time the client accepts the entry is used.
    pub timestamp: Option<DateTime<Utc>>,
    /// Added to the default labels of the client, overriding on conflict.
    pub labels: HashMap<String, String>,
}

impl Entry {
    pub fn new(severity: Severity, payload: Map<String, Value>) -> Self {
        Self {
            severity,
            payload,
            ..Default::default()
        }
    }

    pub(crate) fn into_log_entry(self) -> LogEntry {
        LogEntry {
            json_payload: Some(self.payload.into_iter().collect()),
            labels: (!self.labels.is_empty()).then_some(self.labels),
            severity: Some(self.severity.to_string()),
            timestamp: Some(self.timestamp.unwrap_or_else(Utc::now)),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn converts_to_api_log_entry() {
        let payload = json!({"msg": "hello", "user": {"name": "alice"}});
        let mut entry = Entry::new(Severity::Notice, payload.as_object().unwrap().clone());
        entry.timestamp = Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());

        let api = entry.into_log_entry();
        assert_eq!(api.severity.as_deref(), Some("NOTICE"));
        assert_eq!(api.labels, None);
        assert_eq!(
            api.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
        let json_payload = api.json_payload.unwrap();
        assert_eq!(json_payload.get("msg"), Some(&json!("hello")));
        assert_eq!(json_payload.get("user"), Some(&json!({"name": "alice"})));
    }

    #[test]
    fn stamps_missing_timestamp() {
        let before = Utc::now();
        let api = Entry::default().into_log_entry();
        assert!(api.timestamp.unwrap() >= before);
        assert_eq!(api.severity.as_deref(), Some("DEFAULT"));
    }
}
