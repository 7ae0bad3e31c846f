//! Typed view of inbound frame entries.

use serde::Deserialize;
use serde_json::Value;

use super::{Action, Record, RecordId};
use crate::error::ChannelError;

/// An inbound `(action, payload)` entry decoded into the shape its action
/// implies.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new record appeared.
    Add(Record),
    /// A record delivered in reply to a `get` request.
    Get(Record),
    /// A record changed.
    Update(Record),
    /// Records the server dropped.
    Remove(Vec<RecordId>),
    /// Any action without a record-shaped payload, known or not.
    Other {
        /// Action key as received.
        action: Action,
        /// Untouched payload.
        payload: Value,
    },
}

impl Event {
    /// Decodes one frame entry.
    ///
    /// `remove` accepts a bare id, a list of ids, or a record object.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::InvalidPayload`] if an `add`, `get`, `update`
    /// or `remove` payload does not have the expected shape.
    pub fn from_entry(action: &Action, payload: &Value) -> Result<Self, ChannelError> {
        match action {
            Action::Add => Ok(Self::Add(record(action, payload)?)),
            Action::Get => Ok(Self::Get(record(action, payload)?)),
            Action::Update => Ok(Self::Update(record(action, payload)?)),
            Action::Remove => Ok(Self::Remove(removed_ids(action, payload)?)),
            Action::Close | Action::Sel | Action::Other(_) => Ok(Self::Other {
                action: action.clone(),
                payload: payload.clone(),
            }),
        }
    }

    /// The action this event was decoded from.
    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::Add(_) => Action::Add,
            Self::Get(_) => Action::Get,
            Self::Update(_) => Action::Update,
            Self::Remove(_) => Action::Remove,
            Self::Other { action, .. } => action.clone(),
        }
    }

    /// The record carried by `add`, `get` and `update` events.
    #[must_use]
    pub const fn record(&self) -> Option<&Record> {
        match self {
            Self::Add(r) | Self::Get(r) | Self::Update(r) => Some(r),
            Self::Remove(_) | Self::Other { .. } => None,
        }
    }
}

fn record(action: &Action, payload: &Value) -> Result<Record, ChannelError> {
    Record::deserialize(payload).map_err(|e| invalid(action, &e))
}

fn removed_ids(action: &Action, payload: &Value) -> Result<Vec<RecordId>, ChannelError> {
    match payload {
        Value::Array(items) => items.iter().map(|item| single_id(action, item)).collect(),
        Value::Object(map) => match map.get("id") {
            Some(id) => Ok(vec![single_id(action, id)?]),
            None => Err(invalid(action, &"object payload has no `id`")),
        },
        other => Ok(vec![single_id(action, other)?]),
    }
}

fn single_id(action: &Action, value: &Value) -> Result<RecordId, ChannelError> {
    RecordId::deserialize(value).map_err(|e| invalid(action, &e))
}

fn invalid(action: &Action, reason: &dyn std::fmt::Display) -> ChannelError {
    ChannelError::InvalidPayload {
        action: action.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::protocol::RecordKind;
    use serde_json::json;

    #[test]
    fn update_carries_record() {
        let payload = json!({"id": "7", "type": "job", "status": "running"});
        let Ok(Event::Update(record)) = Event::from_entry(&Action::Update, &payload) else {
            panic!("expected update event");
        };
        assert_eq!(record.id.as_str(), "7");
        assert_eq!(record.kind, RecordKind::Job);
        assert_eq!(record.status, "running");
    }

    #[test]
    fn get_reply_is_a_record() {
        let payload = json!({"id": "g1", "type": "group", "status": "", "url": "/g"});
        let Ok(event) = Event::from_entry(&Action::Get, &payload) else {
            panic!("expected get event");
        };
        assert_eq!(event.action(), Action::Get);
        assert_eq!(event.record().map(|r| r.kind), Some(RecordKind::Group));
    }

    #[test]
    fn add_with_unfamiliar_type_still_decodes() {
        let payload = json!({"id": "a1", "type": "analysis", "status": "Queued"});
        let Ok(Event::Add(record)) = Event::from_entry(&Action::Add, &payload) else {
            panic!("expected add event");
        };
        assert_eq!(record.kind, RecordKind::Group);
    }

    #[test]
    fn remove_accepts_several_shapes() {
        let expect = vec![RecordId::new("3")];
        for payload in [json!("3"), json!(["3"]), json!(3), json!({"id": "3"})] {
            let Ok(Event::Remove(ids)) = Event::from_entry(&Action::Remove, &payload) else {
                panic!("expected remove event for {payload}");
            };
            assert_eq!(ids, expect);
        }
    }

    #[test]
    fn record_missing_fields_is_invalid() {
        let payload = json!({"id": "7"});
        let Err(ChannelError::InvalidPayload { action, .. }) =
            Event::from_entry(&Action::Add, &payload)
        else {
            panic!("expected invalid payload");
        };
        assert_eq!(action, "add");
    }

    #[test]
    fn remove_object_without_id_is_invalid() {
        let result = Event::from_entry(&Action::Remove, &json!({"name": "x"}));
        assert!(matches!(result, Err(ChannelError::InvalidPayload { .. })));
    }

    #[test]
    fn unknown_actions_pass_through() {
        let action = Action::parse("progress");
        let Ok(Event::Other { action: got, payload }) = Event::from_entry(&action, &json!(1))
        else {
            panic!("expected other event");
        };
        assert_eq!(got, action);
        assert_eq!(payload, json!(1));
    }
}
