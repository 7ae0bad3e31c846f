//! Client-side record tracking built on top of the channel events.

pub mod record_list;

pub use record_list::{Applied, RecordList, RecordView, TrackedRecord};
