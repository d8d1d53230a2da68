//! Bus event value object

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured event payload, keyed by field name
pub type EventData = Map<String, Value>;

/// A tagged event read from the Salt event bus.
///
/// Tags use a slash-separated namespace, e.g. `salt/job/<jid>/ret/<minion>`.
/// Events are immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    tag: String,
    #[serde(default)]
    data: EventData,
}

impl Event {
    /// Create an event from a tag and its data
    pub fn new(tag: impl Into<String>, data: EventData) -> Self {
        Self {
            tag: tag.into(),
            data,
        }
    }

    /// Create an event from a tag and any JSON value.
    ///
    /// Non-object values are wrapped under a `data` key, which is how Salt
    /// itself wraps scalar payloads.
    pub fn from_value(tag: impl Into<String>, value: Value) -> Self {
        let data = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        Self::new(tag, data)
    }

    /// The event tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The event data
    pub fn data(&self) -> &EventData {
        &self.data
    }

    /// Look up a top-level field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Whether the tag is made only of digits.
    ///
    /// The bus publishes bare sequence counters with such tags; they are
    /// noise and never reach the pattern registry.
    ///
    /// Only ASCII `0-9` count. The counters are always ASCII, and a tag of
    /// other Unicode digits (`١٢٣`) is left to the registry.
    pub fn is_numeric(&self) -> bool {
        !self.tag.is_empty() && self.tag.bytes().all(|b| b.is_ascii_digit())
    }

    /// Pretty-printed payload, used for diagnostics
    pub fn pretty_data(&self) -> String {
        serde_json::to_string_pretty(&self.data).unwrap_or_else(|_| format!("{:?}", self.data))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)
    }
}
