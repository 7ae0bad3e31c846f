//! JSON frame codec: `{ "<action>": <payload> }`.
//!
//! Outbound frames always carry exactly one action. Inbound decoding keeps
//! every top-level key it finds, even though the server only ever sends one.

use serde::Serialize;
use serde_json::{Map, Value};

use super::Action;
use crate::error::ChannelError;

/// A decoded frame: one `(action, payload)` entry per top-level key.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    entries: Vec<(Action, Value)>,
}

impl Frame {
    /// Builds a single-action frame.
    #[must_use]
    pub fn single(action: Action, payload: Value) -> Self {
        Self {
            entries: vec![(action, payload)],
        }
    }

    /// Decodes frame text received from the channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Json`] if `text` is not JSON, or
    /// [`ChannelError::MalformedFrame`] if the top level is not an object.
    pub fn decode(text: &str) -> Result<Self, ChannelError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(Self {
                entries: map
                    .into_iter()
                    .map(|(key, payload)| (Action::parse(&key), payload))
                    .collect(),
            }),
            other => Err(ChannelError::MalformedFrame(format!(
                "expected an object keyed by action, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Encodes the frame as compact JSON text.
    #[must_use]
    pub fn encode(&self) -> String {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(action, payload)| (action.as_str().to_string(), payload.clone()))
            .collect();
        Value::Object(map).to_string()
    }

    /// Returns the decoded entries.
    #[must_use]
    pub fn entries(&self) -> &[(Action, Value)] {
        &self.entries
    }

    /// Consumes the frame, yielding its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<(Action, Value)> {
        self.entries
    }

    /// Returns the payload for `action`, if present.
    #[must_use]
    pub fn payload(&self, action: &Action) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(a, _)| a == action)
            .map(|(_, payload)| payload)
    }

    /// Number of actions in the frame.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for `{}`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serializes `{action: payload}` to frame text.
///
/// # Errors
///
/// Returns [`ChannelError::Json`] if `payload` cannot be serialized.
pub fn encode<T: Serialize + ?Sized>(action: &Action, payload: &T) -> Result<String, ChannelError> {
    let payload = serde_json::to_value(payload)?;
    Ok(Frame::single(action.clone(), payload).encode())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_get_all() {
        let text = encode(&Action::Get, &Vec::<String>::new()).unwrap_or_default();
        assert_eq!(text, r#"{"get":[]}"#);
    }

    #[test]
    fn encode_close_with_null() {
        let text = encode(&Action::Close, &()).unwrap_or_default();
        assert_eq!(text, r#"{"close":null}"#);
    }

    #[test]
    fn decode_single_action() {
        let Ok(frame) = Frame::decode(r#"{"update": {"id": "7", "status": "running"}}"#) else {
            panic!("decode failed");
        };
        assert_eq!(frame.len(), 1);
        assert_eq!(
            frame.payload(&Action::Update),
            Some(&json!({"id": "7", "status": "running"}))
        );
    }

    #[test]
    fn decode_tolerates_several_actions() {
        let Ok(frame) = Frame::decode(r#"{"add": {"id": "1"}, "remove": ["2"]}"#) else {
            panic!("decode failed");
        };
        assert_eq!(frame.len(), 2);
        assert!(frame.payload(&Action::Add).is_some());
        assert_eq!(frame.payload(&Action::Remove), Some(&json!(["2"])));
    }

    #[test]
    fn decode_keeps_unknown_actions() {
        let Ok(frame) = Frame::decode(r#"{"progress": 0.5}"#) else {
            panic!("decode failed");
        };
        let entries = frame.into_entries();
        assert_eq!(
            entries,
            vec![(Action::Other("progress".to_string()), json!(0.5))]
        );
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let err = Frame::decode("{not json");
        assert!(matches!(err, Err(ChannelError::Json(_))));
    }

    #[test]
    fn decode_rejects_non_object() {
        let Err(ChannelError::MalformedFrame(msg)) = Frame::decode("[1, 2]") else {
            panic!("expected malformed frame");
        };
        assert!(msg.contains("an array"));
    }

    #[test]
    fn empty_object_is_empty_frame() {
        let Ok(frame) = Frame::decode("{}") else {
            panic!("decode failed");
        };
        assert!(frame.is_empty());
    }
}
