//! Wire protocol: action tags, the JSON frame codec, record payloads and
//! typed inbound events.
//!
//! Every message on the channel is a JSON object keyed by its action:
//!
//! ```text
//! {"get": []}                      client asks for all of its records
//! {"get": ["42"]}                  client asks for the records of group 42
//! {"update": {"id": "7", ...}}     server pushes a record change
//! {"remove": ["7"]}                client asks the server to drop record 7
//! {"close": null}                  client teardown notice
//! ```

pub mod action;
pub mod event;
pub mod frame;
pub mod record;

pub use action::Action;
pub use event::Event;
pub use frame::{Frame, encode};
pub use record::{Record, RecordId, RecordKind, Scope, Selection};
