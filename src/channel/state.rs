//! Channel lifecycle: `Uninitialized → Connecting → Open → Closed`.

use std::fmt;

/// Lifecycle state of a notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelState {
    /// Client built, `init` not yet called.
    #[default]
    Uninitialized,
    /// Connect in progress.
    Connecting,
    /// Frames may be sent and are being received.
    Open,
    /// Terminal. The client instance cannot be reopened.
    Closed,
}

impl ChannelState {
    /// Returns `true` if moving from `self` to `next` is a legal transition.
    ///
    /// `Uninitialized → Closed` happens when the transport fails its
    /// capability check.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Uninitialized, Self::Connecting | Self::Closed)
                | (Self::Connecting, Self::Open | Self::Closed)
                | (Self::Open, Self::Closed)
        )
    }

    /// Returns `true` for [`ChannelState::Open`].
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Lowercase name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a channel reached [`ChannelState::Closed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client asked to close.
    Local,
    /// The server closed the channel.
    Remote,
    /// A connect, read or write failed.
    Error,
}
