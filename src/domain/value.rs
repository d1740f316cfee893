use bytes::Bytes;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;

/// An error captured from a log call: its display message plus the stack
/// trace recorded at capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedError {
    pub message: String,
    pub stack: String,
}

impl CapturedError {
    pub fn new(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Capture any `std::error::Error`, recording the current call stack.
    pub fn from_error(err: &dyn std::error::Error, stack_limit: usize) -> Self {
        Self {
            message: err.to_string(),
            stack: crate::record::trace::capture_stack(stack_limit),
        }
    }
}

/// One argument of a log call, normalized into the shapes the relay
/// understands.
///
/// Serialization follows a fixed per-variant rule table instead of mutating
/// any global serializer state: `Bytes` serializes as its decoded text and
/// `Error` as its message string, so payloads never contain numeric byte
/// dumps or empty error objects.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Bytes(Bytes),
    Error(CapturedError),
    List(Vec<ArgValue>),
    Map(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    /// Render this value as message text: strings verbatim, bytes decoded,
    /// everything else through its JSON form.
    pub fn as_message_text(&self) -> String {
        match self {
            ArgValue::Text(text) => text.clone(),
            ArgValue::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            ArgValue::Error(err) => err.message.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

impl Serialize for ArgValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ArgValue::Null => serializer.serialize_unit(),
            ArgValue::Bool(value) => serializer.serialize_bool(*value),
            ArgValue::Number(value) => value.serialize(serializer),
            ArgValue::Text(text) => serializer.serialize_str(text),
            // Buffers serialize as their decoded text content
            ArgValue::Bytes(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
            // Errors serialize as their message string
            ArgValue::Error(err) => serializer.serialize_str(&err.message),
            ArgValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ArgValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<&str> for ArgValue {
    fn from(text: &str) -> Self {
        ArgValue::Text(text.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(text: String) -> Self {
        ArgValue::Text(text)
    }
}

impl From<Bytes> for ArgValue {
    fn from(bytes: Bytes) -> Self {
        ArgValue::Bytes(bytes)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Number(serde_json::Number::from(value))
    }
}

impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        ArgValue::Number(serde_json::Number::from(value))
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<CapturedError> for ArgValue {
    fn from(err: CapturedError) -> Self {
        ArgValue::Error(err)
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ArgValue::Null,
            serde_json::Value::Bool(b) => ArgValue::Bool(b),
            serde_json::Value::Number(n) => ArgValue::Number(n),
            serde_json::Value::String(s) => ArgValue::Text(s),
            serde_json::Value::Array(items) => {
                ArgValue::List(items.into_iter().map(ArgValue::from).collect())
            }
            serde_json::Value::Object(entries) => ArgValue::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, ArgValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// One log call flowing through the pipeline. Forwarded downstream unchanged
/// regardless of whether the relay produced a notification for it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogCall {
    pub component: String,
    pub level: String,
    pub args: Vec<ArgValue>,
}

impl LogCall {
    pub fn new(component: impl Into<String>, level: impl Into<String>, args: Vec<ArgValue>) -> Self {
        Self {
            component: component.into(),
            level: level.into(),
            args,
        }
    }
}
