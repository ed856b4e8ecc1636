use serde::Deserialize;
use serde_json::Value;

/// A client's request sent over the affordance WebSocket (spec.md 4.4):
/// `{"messageType":"request","operation":"observeproperty"|"observeaction","name":...}`.
/// Anything that doesn't match this shape fails to deserialize and the
/// connection is closed with an error frame.
#[derive(Debug, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "messageType")]
    pub message_type: MessageType,
    #[serde(flatten)]
    pub operation: Operation,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum Operation {
    Observeproperty { name: String },
    Observeaction { name: String },
}

pub fn property_status(name: &str, value: Value) -> Value {
    serde_json::json!({ "messageType": "propertyStatus", "data": { name: value } })
}

pub fn action_status(name: &str, invocation: Value) -> Value {
    serde_json::json!({ "messageType": "actionStatus", "data": { name: invocation } })
}

pub fn error_message(code: &str, message: &str) -> Value {
    serde_json::json!({ "messageType": "error", "data": { "code": code, "message": message } })
}
