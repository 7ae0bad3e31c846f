//! Notification channel client: lifecycle, callback dispatch, sending and
//! resynchronization.
//!
//! One [`NotificationClient`] per page or session. The transport and the
//! callback registry are constructor state; nothing here is global.

pub mod client;
pub mod handle;
pub mod hooks;
pub mod registry;
pub mod state;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use client::NotificationClient;
pub use handle::ChannelHandle;
pub use hooks::{Hooks, ResyncTrigger};
pub use registry::{CallbackRegistry, Handler};
pub use state::{ChannelState, CloseReason};

/// Identifier of one client channel instance, carried in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(uuid::Uuid);

impl ChannelId {
    /// Creates a new random `ChannelId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(ChannelId::new(), ChannelId::new());
    }

    #[test]
    fn display_is_uuid_format() {
        let id = ChannelId::new();
        let s = id.to_string();
        assert_eq!(s.len(), 36);
        assert_eq!(s, id.as_uuid().to_string());
    }
}
