//! Action tags carried as the single key of every frame.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Semantic type of a pushed or sent message.
///
/// Parsing never fails: a string that is not one of the known verbs is kept
/// as [`Action::Other`], so new server actions pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Request (outbound) or deliver (inbound) the current records.
    Get,
    /// A new record appeared on the server.
    Add,
    /// A tracked record changed status.
    Update,
    /// Drop a record (either direction).
    Remove,
    /// Client teardown notice.
    Close,
    /// Sample selection push.
    Sel,
    /// Any action this client has no variant for.
    Other(String),
}

impl Action {
    /// Maps a wire string to its action.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "get" => Self::Get,
            "add" => Self::Add,
            "update" => Self::Update,
            "remove" => Self::Remove,
            "close" => Self::Close,
            "sel" => Self::Sel,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire string for this action.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "get",
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Close => "close",
            Self::Sel => "sel",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` unless this is [`Action::Other`].
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Action {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}
