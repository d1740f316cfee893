use super::normalizer::NormalizedRecord;
use super::trace::capture_stack;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The normalized record handed to the error tracker. Built fresh per
/// accepted log call; ownership moves to the dispatcher on handoff.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: String,
    pub component: String,
    /// JSON array of the log call's remaining arguments
    pub payload: String,
    pub stack: String,
    pub hostname: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Assembles notifications for one (component, severity) pair.
pub struct NotificationBuilder {
    component: String,
    severity: String,
}

impl NotificationBuilder {
    pub fn new(component: impl Into<String>, severity: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            severity: severity.into(),
        }
    }

    /// Build a notification from a normalized record. A synthetic trace is
    /// captured only when no error-like argument supplied one; `stack_limit`
    /// bounds its frame count.
    pub fn build(
        self,
        record: NormalizedRecord,
        stack_limit: usize,
    ) -> Result<Notification, serde_json::Error> {
        let payload = serde_json::to_string(&record.rest)?;
        let stack = record
            .error_stack
            .unwrap_or_else(|| capture_stack(stack_limit));

        Ok(Notification {
            id: Uuid::new_v4(),
            message: record.message,
            severity: self.severity,
            component: self.component,
            payload,
            stack,
            hostname: detect_hostname(),
            occurred_at: Utc::now(),
        })
    }
}

fn detect_hostname() -> Option<String> {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::normalize;
    use bytes::Bytes;
    use std::collections::BTreeMap;

    use crate::domain::value::ArgValue;

    #[test]
    fn builds_the_notice_shape_from_a_data_argument() {
        let record = normalize(vec!["message".into(), serde_json::json!({"data": 1}).into()]);
        let notification = NotificationBuilder::new("name", "warn")
            .build(record, 20)
            .unwrap();

        assert_eq!(notification.message, "message");
        assert_eq!(notification.severity, "warn");
        assert_eq!(notification.component, "name");
        assert_eq!(notification.payload, "[{\"data\":1}]");
        assert!(!notification.stack.is_empty());
    }

    #[test]
    fn buffers_in_the_payload_stringify_to_their_text() {
        let mut map = BTreeMap::new();
        map.insert("data".to_string(), ArgValue::Bytes(Bytes::from_static(b"test")));
        let record = normalize(vec!["message".into(), ArgValue::Map(map)]);
        let notification = NotificationBuilder::new("name", "warn")
            .build(record, 20)
            .unwrap();

        assert_eq!(notification.payload, "[{\"data\":\"test\"}]");
        assert!(!notification.payload.contains("116"));
    }

    #[test]
    fn error_arguments_supply_the_stack_verbatim() {
        let err = crate::domain::value::CapturedError::new("foo", "frame 0\nframe 1");
        let record = normalize(vec!["message".into(), err.into()]);
        let notification = NotificationBuilder::new("name", "error")
            .build(record, 20)
            .unwrap();

        assert_eq!(notification.payload, "[\"foo\"]");
        assert_eq!(notification.stack, "frame 0\nframe 1");
    }
}
