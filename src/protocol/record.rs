//! Job and group records pushed by the server, plus the scope and
//! selection payloads the client sends.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Identifier of a job or group record.
///
/// The server emits ids as strings, but numeric ids are accepted and kept
/// in their decimal form. Always serialized as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Creates a `RecordId` from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for RecordId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        }
    }
}

/// Whether a record is a single job or a group of jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A single processing job.
    Job,
    /// A group scoping several jobs. Any type other than `job` reads as a
    /// group.
    #[serde(other)]
    Group,
}

/// Status text of a successfully finished job.
pub const STATUS_SUCCESS: &str = "Success";
/// Status text of a failed job.
pub const STATUS_FAILED: &str = "Failed";

/// A server-owned job or group record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record identifier.
    pub id: RecordId,
    /// Job or group.
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Free-form status text (`Queued`, `Running`, `Success`, ...).
    pub status: String,
    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Base URL for the record's detail or result page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Group this record belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<RecordId>,
}

impl Record {
    /// Returns `true` if the status is `Success` or `Failed`.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == STATUS_SUCCESS || self.status == STATUS_FAILED
    }

    /// Link to this record's page: `<url>/<id>`, when a url is known.
    #[must_use]
    pub fn link(&self) -> Option<String> {
        self.url.as_ref().map(|url| format!("{url}/{}", self.id))
    }

    /// Display name, falling back to the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.id.as_str())
    }
}

/// Which records a client asks for when the channel opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    /// Every record owned by the caller.
    #[default]
    All,
    /// Records belonging to one group.
    Group(RecordId),
}

impl Scope {
    /// Builds a scope from an optional group id.
    #[must_use]
    pub fn from_group(group: Option<RecordId>) -> Self {
        group.map_or(Self::All, Self::Group)
    }

    /// Payload of the `get` request for this scope: `[]` or `["<group>"]`.
    #[must_use]
    pub fn get_payload(&self) -> Value {
        match self {
            Self::All => json!([]),
            Self::Group(id) => json!([id.as_str()]),
        }
    }

    /// The group id, if scoped to one.
    #[must_use]
    pub const fn group(&self) -> Option<&RecordId> {
        match self {
            Self::All => None,
            Self::Group(id) => Some(id),
        }
    }

    /// Returns `true` if `record` belongs to this scope.
    ///
    /// `All` matches records without a parent; `Group(g)` matches records
    /// whose parent is `g`.
    #[must_use]
    pub fn contains(&self, record: &Record) -> bool {
        self.group() == record.parent.as_ref()
    }
}

/// Sample selection pushed with the `sel` action:
/// artifact id to selected sample ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<String, Vec<String>>);

impl Selection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds samples under an artifact, keeping earlier picks.
    pub fn select<I, S>(&mut self, artifact_id: impl Into<String>, samples: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.0.entry(artifact_id.into()).or_default();
        for sample in samples {
            let sample = sample.into();
            if !entry.contains(&sample) {
                entry.push(sample);
            }
        }
    }

    /// Samples selected under `artifact_id`.
    #[must_use]
    pub fn samples(&self, artifact_id: &str) -> &[String] {
        self.0.get(artifact_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
