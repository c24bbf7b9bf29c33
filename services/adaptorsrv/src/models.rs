//! Wire types: the inbound webhook payload, the normalized record sent
//! downstream, and the downstream acknowledgement.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::NormalizeError;

/// Key of the device identifier inside `data`
pub const DEVICE_ID_FIELD: &str = "device_id";

/// Key of the event type inside `data`
pub const EVENT_TYPE_FIELD: &str = "event_type";

/// Webhook body posted to `/data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Free-form device payload; must carry `device_id` and `event_type`
    pub data: Map<String, Value>,
    #[serde(rename = "dataCode", default)]
    pub data_code: String,
    #[serde(rename = "postTime", default)]
    pub post_time: String,
}

impl InboundEvent {
    /// Parse a raw request body
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Device identifier as a part code
    pub fn device_id(&self) -> Result<String, NormalizeError> {
        self.scalar_field(DEVICE_ID_FIELD)
    }

    /// Event type carried by the payload
    ///
    /// Only the strings `"1"` and `"2"` are recognised; any other value,
    /// numbers and `null` included, is [`EventType::Other`].
    pub fn event_type(&self) -> Result<EventType, NormalizeError> {
        match self.data.get(EVENT_TYPE_FIELD) {
            None => Err(NormalizeError::MissingField(EVENT_TYPE_FIELD.to_string())),
            Some(Value::String(code)) => Ok(EventType::from_code(code)),
            Some(_) => Ok(EventType::Other),
        }
    }

    /// Strings are taken as-is, integers are rendered in decimal
    fn scalar_field(&self, field: &str) -> Result<String, NormalizeError> {
        match self.data.get(field) {
            None => Err(NormalizeError::MissingField(field.to_string())),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            Some(other) => Err(NormalizeError::TypeMismatch {
                field: field.to_string(),
                actual: json_type_name(other),
            }),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Event kinds distinguished by the adaptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    /// `"1"`
    FireAlarm,
    /// `"2"`
    Fault,
    /// Anything else
    Other,
}

impl EventType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Self::FireAlarm,
            "2" => Self::Fault,
            _ => Self::Other,
        }
    }

    /// `(fireAlarm, errorStatus)`
    pub fn flags(&self) -> (u8, u8) {
        match self {
            Self::FireAlarm => (1, 0),
            Self::Fault => (0, 1),
            Self::Other => (0, 0),
        }
    }
}

/// Record forwarded to the downstream endpoint
///
/// Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub part_type: i32,
    pub part_code: String,
    pub time: String,
    pub fire_alarm: u8,
    pub error_status: u8,
}

/// Decoded downstream response body
#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamAck(pub Value);

impl DownstreamAck {
    /// The `json` member that gets logged; `null` when absent
    pub fn json_field(&self) -> &Value {
        self.0.get("json").unwrap_or(&Value::Null)
    }
}
