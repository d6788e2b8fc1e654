//! Wire frames
//!
//! Requests: `{id?, channel, payload}`, an absent id marks a one-way send.
//! Responses: `{id, result}`. Events: `{channel, payload}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{Command, Event};
use crate::result::CommandResult;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub channel: String,
    #[serde(default)]
    pub payload: Value,
}

impl RequestFrame {
    pub fn from_command(id: Option<u64>, command: &Command) -> Result<Self> {
        Ok(Self {
            id,
            channel: command.channel().name().to_string(),
            payload: command.payload()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub id: u64,
    pub result: CommandResult<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    pub channel: String,
    #[serde(default)]
    pub payload: Value,
}

impl EventFrame {
    pub fn from_event(event: &Event) -> Result<Self> {
        Ok(Self {
            channel: event.channel().name().to_string(),
            payload: event.payload()?,
        })
    }
}

/// Anything the background sends to a UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiFrame {
    Response(ResponseFrame),
    Event(EventFrame),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_way_request_has_no_id() {
        let frame = RequestFrame::from_command(None, &Command::RequestTabList).unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json, json!({"channel": "tabs:request-list", "payload": null}));

        let parsed: RequestFrame = serde_json::from_str(r#"{"channel":"history:clear"}"#).unwrap();
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.payload, Value::Null);
    }

    #[test]
    fn test_ui_frame_variants() {
        let response: UiFrame =
            serde_json::from_value(json!({"id": 9, "result": {"success": true, "data": 1, "error": null}}))
                .unwrap();
        assert!(matches!(response, UiFrame::Response(ResponseFrame { id: 9, .. })));

        let event: UiFrame =
            serde_json::from_value(json!({"channel": "settings:state", "payload": {}})).unwrap();
        assert!(matches!(event, UiFrame::Event(ref e) if e.channel == "settings:state"));
    }
}
