//! Ordered list of the job and group records a client is watching.
//!
//! Folds inbound events into per-record display state. Only records whose
//! parent matches the list's scope are tracked; removals apply to any id
//! since they come from the user or the server acting on a known record.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::channel::ChannelHandle;
use crate::error::ChannelError;
use crate::protocol::{Event, Record, RecordId, RecordKind, Scope};

/// What a tracked record currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordView {
    /// Plain status text of a running or queued job.
    Status(String),
    /// Link to a group's detail page.
    GroupDetails {
        /// `<url>/<id>`, if the server sent a url.
        href: Option<String>,
    },
    /// Link to a finished job's result.
    Result {
        /// Final status (`Success` or `Failed`).
        status: String,
        /// `<url>/<id>`.
        href: String,
    },
}

impl RecordView {
    fn initial(record: &Record) -> Self {
        match record.kind {
            RecordKind::Group => Self::GroupDetails {
                href: record.link(),
            },
            RecordKind::Job => Self::result_for(record)
                .unwrap_or_else(|| Self::Status(record.status.clone())),
        }
    }

    fn result_for(record: &Record) -> Option<Self> {
        if !record.is_finished() {
            return None;
        }
        record.link().map(|href| Self::Result {
            status: record.status.clone(),
            href,
        })
    }
}

impl fmt::Display for RecordView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => f.write_str(status),
            Self::GroupDetails { href: Some(href) } => write!(f, "Group details <{href}>"),
            Self::GroupDetails { href: None } => f.write_str("Group details"),
            Self::Result { status, href } => write!(f, "{status} <{href}>"),
        }
    }
}

/// One tracked record with its display state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRecord {
    /// Latest record received for this id.
    pub record: Record,
    /// What the record currently shows.
    pub view: RecordView,
    /// When the record was first tracked.
    pub first_seen: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for TrackedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.record.display_name(), self.view)
    }
}

/// Outcome of applying an event to a [`RecordList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new record is now tracked.
    Inserted,
    /// A tracked record changed.
    Updated,
    /// This many tracked records were dropped.
    Removed(usize),
    /// Nothing changed.
    Ignored,
}

/// Tracked records for one scope, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct RecordList {
    scope: Scope,
    entries: Vec<TrackedRecord>,
}

impl RecordList {
    /// Creates an empty list tracking `scope`.
    #[must_use]
    pub const fn new(scope: Scope) -> Self {
        Self {
            scope,
            entries: Vec::new(),
        }
    }

    /// The scope this list tracks.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Tracked records in arrival order.
    #[must_use]
    pub fn entries(&self) -> &[TrackedRecord] {
        &self.entries
    }

    /// The tracked record with `id`.
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&TrackedRecord> {
        self.entries.iter().find(|e| &e.record.id == id)
    }

    /// Number of tracked records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies one inbound event.
    pub fn apply(&mut self, event: &Event) -> Applied {
        match event {
            Event::Add(record) => self.add(record),
            Event::Get(record) => self.refresh(record),
            Event::Update(record) => self.update(record),
            Event::Remove(ids) => {
                let mut removed = 0;
                for id in ids {
                    if self.remove(id) {
                        removed += 1;
                    }
                }
                if removed == 0 {
                    Applied::Ignored
                } else {
                    Applied::Removed(removed)
                }
            }
            Event::Other { .. } => Applied::Ignored,
        }
    }

    /// Starts tracking `record`. Out-of-scope and already tracked records
    /// are ignored.
    pub fn add(&mut self, record: &Record) -> Applied {
        if !self.scope.contains(record) || self.position(&record.id).is_some() {
            return Applied::Ignored;
        }
        let now = Utc::now();
        self.entries.push(TrackedRecord {
            record: record.clone(),
            view: RecordView::initial(record),
            first_seen: now,
            updated_at: now,
        });
        tracing::debug!(id = %record.id, status = %record.status, "tracking record");
        Applied::Inserted
    }

    /// Applies a `get` reply: tracks new records and brings already
    /// tracked ones up to date.
    pub fn refresh(&mut self, record: &Record) -> Applied {
        if self.position(&record.id).is_some() {
            self.update(record)
        } else {
            self.add(record)
        }
    }

    /// Applies a status change to a tracked record.
    ///
    /// A finished record with a url, job or group, switches to its result
    /// link. Otherwise the status text is replaced, unless a result link is
    /// already shown; a group keeps its details link.
    pub fn update(&mut self, record: &Record) -> Applied {
        if !self.scope.contains(record) {
            return Applied::Ignored;
        }
        let Some(entry) = self.position(&record.id).and_then(|i| self.entries.get_mut(i)) else {
            return Applied::Ignored;
        };

        let view = match (&entry.view, RecordView::result_for(record)) {
            (_, Some(result)) => result,
            (RecordView::Status(_), _) => RecordView::Status(record.status.clone()),
            (RecordView::GroupDetails { .. }, _) => RecordView::GroupDetails {
                href: record.link(),
            },
            (RecordView::Result { .. }, _) => entry.view.clone(),
        };

        if entry.record == *record && entry.view == view {
            return Applied::Ignored;
        }
        entry.record = record.clone();
        entry.view = view;
        entry.updated_at = Utc::now();
        tracing::debug!(id = %record.id, status = %record.status, "record updated");
        Applied::Updated
    }

    /// Stops tracking `id`. Returns `true` if it was tracked.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        match self.position(id) {
            Some(i) => {
                self.entries.remove(i);
                tracing::debug!(%id, "record dropped");
                true
            }
            None => false,
        }
    }

    /// Asks the server to drop `id`, then stops tracking it locally.
    ///
    /// # Errors
    ///
    /// Returns the send error if the `remove` request could not be queued;
    /// the record is then kept.
    pub fn drop_record(
        &mut self,
        id: &RecordId,
        handle: &ChannelHandle,
    ) -> Result<bool, ChannelError> {
        handle.request_remove(id)?;
        Ok(self.remove(id))
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.entries.iter().position(|e| &e.record.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::{Value, json};
    use tokio::sync::{mpsc, watch};

    use super::*;
    use crate::channel::handle::Outbound;
    use crate::channel::{ChannelId, ChannelState};

    fn handle_in(state: ChannelState) -> (ChannelHandle, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (_state_tx, state_rx) = watch::channel(state);
        (ChannelHandle::new(ChannelId::new(), tx, state_rx), rx)
    }

    fn record(value: Value) -> Record {
        let Ok(record) = serde_json::from_value(value) else {
            panic!("bad test record");
        };
        record
    }

    fn job(id: &str, status: &str) -> Record {
        record(json!({"id": id, "type": "job", "status": status, "name": format!("job {id}")}))
    }

    #[test]
    fn add_tracks_in_arrival_order() {
        let mut list = RecordList::new(Scope::All);
        assert_eq!(list.add(&job("2", "Queued")), Applied::Inserted);
        assert_eq!(list.add(&job("1", "Queued")), Applied::Inserted);
        let ids: Vec<&str> = list.entries().iter().map(|e| e.record.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
        assert_eq!(list.entries().first().map(ToString::to_string).as_deref(), Some("job 2: Queued"));
    }

    #[test]
    fn duplicate_add_is_ignored() {
        let mut list = RecordList::new(Scope::All);
        list.add(&job("1", "Queued"));
        assert_eq!(list.add(&job("1", "Running")), Applied::Ignored);
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.get(&RecordId::new("1")).map(|e| e.view.clone()),
            Some(RecordView::Status("Queued".to_string()))
        );
    }

    #[test]
    fn out_of_scope_records_are_ignored() {
        let mut list = RecordList::new(Scope::Group(RecordId::new("g")));
        assert_eq!(list.add(&job("1", "Queued")), Applied::Ignored);
        let child = record(json!({"id": "2", "type": "job", "status": "Queued", "parent": "g"}));
        assert_eq!(list.add(&child), Applied::Inserted);
        let other = record(json!({"id": "3", "type": "job", "status": "Queued", "parent": "h"}));
        assert_eq!(list.add(&other), Applied::Ignored);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn finished_job_with_url_shows_result() {
        let mut list = RecordList::new(Scope::All);
        let done = record(json!({
            "id": "9", "type": "job", "status": "Success", "url": "/results"
        }));
        list.add(&done);
        assert_eq!(
            list.get(&RecordId::new("9")).map(|e| e.view.clone()),
            Some(RecordView::Result {
                status: "Success".to_string(),
                href: "/results/9".to_string(),
            })
        );
    }

    #[test]
    fn finished_job_without_url_keeps_status() {
        let mut list = RecordList::new(Scope::All);
        list.add(&job("9", "Failed"));
        assert_eq!(
            list.get(&RecordId::new("9")).map(|e| e.view.clone()),
            Some(RecordView::Status("Failed".to_string()))
        );
    }

    #[test]
    fn group_shows_details_link() {
        let mut list = RecordList::new(Scope::All);
        let group = record(json!({
            "id": "g1", "type": "group", "status": "", "name": "analysis", "url": "/group"
        }));
        list.add(&group);
        let Some(entry) = list.get(&RecordId::new("g1")) else {
            panic!("group should be tracked");
        };
        assert_eq!(entry.to_string(), "analysis: Group details </group/g1>");
    }

    #[test]
    fn update_replaces_status_then_result() {
        let mut list = RecordList::new(Scope::All);
        list.add(&job("1", "Queued"));

        assert_eq!(list.update(&job("1", "Running")), Applied::Updated);
        assert_eq!(
            list.get(&RecordId::new("1")).map(|e| e.view.clone()),
            Some(RecordView::Status("Running".to_string()))
        );

        let done = record(json!({"id": "1", "type": "job", "status": "Success", "url": "/r"}));
        assert_eq!(list.update(&done), Applied::Updated);

        // Once the result is shown, later status text does not replace it.
        let late = record(json!({"id": "1", "type": "job", "status": "Cleaning up"}));
        list.update(&late);
        assert_eq!(
            list.get(&RecordId::new("1")).map(|e| e.view.clone()),
            Some(RecordView::Result {
                status: "Success".to_string(),
                href: "/r/1".to_string(),
            })
        );
    }

    #[test]
    fn finished_group_update_shows_result() {
        let mut list = RecordList::new(Scope::All);
        let group = record(json!({"id": "g1", "type": "group", "status": "Running", "url": "/group"}));
        list.add(&group);

        let running = record(json!({"id": "g1", "type": "group", "status": "Queued", "url": "/group"}));
        list.update(&running);
        assert_eq!(
            list.get(&RecordId::new("g1")).map(|e| e.view.clone()),
            Some(RecordView::GroupDetails {
                href: Some("/group/g1".to_string())
            })
        );

        let done = record(json!({"id": "g1", "type": "group", "status": "Success", "url": "/group"}));
        assert_eq!(list.update(&done), Applied::Updated);
        assert_eq!(
            list.get(&RecordId::new("g1")).map(|e| e.view.clone()),
            Some(RecordView::Result {
                status: "Success".to_string(),
                href: "/group/g1".to_string(),
            })
        );
    }

    #[test]
    fn update_of_unknown_record_is_ignored() {
        let mut list = RecordList::new(Scope::All);
        assert_eq!(list.update(&job("1", "Running")), Applied::Ignored);
        assert!(list.is_empty());
    }

    #[test]
    fn identical_update_is_ignored() {
        let mut list = RecordList::new(Scope::All);
        list.add(&job("1", "Running"));
        assert_eq!(list.update(&job("1", "Running")), Applied::Ignored);
    }

    #[test]
    fn get_reply_refreshes_tracked_records() {
        let mut list = RecordList::new(Scope::All);
        assert_eq!(list.apply(&Event::Get(job("1", "Queued"))), Applied::Inserted);
        assert_eq!(list.apply(&Event::Get(job("1", "Running"))), Applied::Updated);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_event_drops_tracked_ids() {
        let mut list = RecordList::new(Scope::All);
        list.add(&job("1", "Queued"));
        list.add(&job("2", "Queued"));
        let event = Event::Remove(vec![RecordId::new("1"), RecordId::new("7")]);
        assert_eq!(list.apply(&event), Applied::Removed(1));
        assert_eq!(list.apply(&event), Applied::Ignored);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn other_events_are_ignored() {
        let mut list = RecordList::new(Scope::All);
        let event = Event::Other {
            action: crate::protocol::Action::Sel,
            payload: json!({}),
        };
        assert_eq!(list.apply(&event), Applied::Ignored);
    }

    #[test]
    fn drop_record_sends_remove_then_forgets() {
        let mut list = RecordList::new(Scope::All);
        list.add(&job("1", "Running"));
        list.add(&job("2", "Running"));
        let (handle, mut rx) = handle_in(ChannelState::Open);

        let Ok(dropped) = list.drop_record(&RecordId::new("1"), &handle) else {
            panic!("open channel should accept remove");
        };
        assert!(dropped);
        let Ok(Outbound::Frame(text)) = rx.try_recv() else {
            panic!("expected a queued remove frame");
        };
        assert_eq!(text, r#"{"remove":["1"]}"#);
        assert!(list.get(&RecordId::new("1")).is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn drop_record_keeps_record_when_channel_not_open() {
        let mut list = RecordList::new(Scope::All);
        list.add(&job("1", "Running"));
        let (handle, mut rx) = handle_in(ChannelState::Closed);

        let result = list.drop_record(&RecordId::new("1"), &handle);
        assert!(matches!(
            result,
            Err(ChannelError::NotOpen(ChannelState::Closed))
        ));
        assert!(rx.try_recv().is_err());
        assert_eq!(list.len(), 1);
    }
}
