//! Client error types with failure-category mapping.
//!
//! [`ChannelError`] is the central error type for the notification client.
//! Each variant maps to an [`ErrorKind`] so callers can decide how to react
//! (show a notice, fall back to a full refresh, or treat it as a bug).

use crate::channel::ChannelState;

/// Broad failure category of a [`ChannelError`].
///
/// | Kind         | Meaning                                             |
/// |--------------|-----------------------------------------------------|
/// | `Capability` | The transport cannot be used at all in this process |
/// | `Transport`  | Connect, read or write failed on the wire           |
/// | `Closed`     | The channel has already shut down                   |
/// | `Malformed`  | A frame or payload could not be decoded             |
/// | `Usage`      | The client was driven in the wrong state            |
/// | `Config`     | Configuration could not be loaded                   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Channel type unsupported; not recoverable within the session.
    Capability,
    /// Network or protocol failure reported by the transport.
    Transport,
    /// The channel is closed and unusable.
    Closed,
    /// Undecodable inbound data.
    Malformed,
    /// Operation called out of order.
    Usage,
    /// Invalid configuration.
    Config,
}

/// Notification client error.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The connector cannot open a channel of the requested security.
    #[error("transport does not support {scheme}:// channels")]
    Unsupported {
        /// URL scheme that was requested (`ws` or `wss`).
        scheme: &'static str,
    },

    /// `init` was called on a client that already left `Uninitialized`.
    #[error("channel already initialized (state: {0})")]
    AlreadyInitialized(ChannelState),

    /// An operation needing an open channel was attempted in another state.
    #[error("channel is not open (state: {0})")]
    NotOpen(ChannelState),

    /// Establishing the connection failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Reading or writing a frame failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The outbound queue is gone because the driver loop has stopped.
    #[error("channel closed")]
    Closed,

    /// Frame text was not valid JSON, or a payload failed to serialize.
    #[error("invalid JSON frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame was valid JSON but not an object keyed by action.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A known action carried a payload of the wrong shape.
    #[error("invalid `{action}` payload: {reason}")]
    InvalidPayload {
        /// Action whose payload failed to decode.
        action: String,
        /// Decoder message.
        reason: String,
    },

    /// Configuration value rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChannelError {
    /// Returns the failure category for this variant.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unsupported { .. } => ErrorKind::Capability,
            Self::Connect(_) | Self::Transport(_) => ErrorKind::Transport,
            Self::Closed => ErrorKind::Closed,
            Self::Json(_) | Self::MalformedFrame(_) | Self::InvalidPayload { .. } => {
                ErrorKind::Malformed
            }
            Self::AlreadyInitialized(_) | Self::NotOpen(_) => ErrorKind::Usage,
            Self::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// Returns `true` if the channel cannot be used after this error.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Capability | ErrorKind::Transport | ErrorKind::Closed
        )
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_is_capability() {
        let err = ChannelError::Unsupported { scheme: "wss" };
        assert_eq!(err.kind(), ErrorKind::Capability);
        assert!(err.is_terminal());
        assert_eq!(err.to_string(), "transport does not support wss:// channels");
    }

    #[test]
    fn not_open_is_usage_and_recoverable() {
        let err = ChannelError::NotOpen(ChannelState::Connecting);
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(!err.is_terminal());
        assert!(err.to_string().contains("connecting"));
    }

    #[test]
    fn json_error_converts() {
        let Err(source) = serde_json::from_str::<serde_json::Value>("{") else {
            panic!("expected parse failure");
        };
        let err = ChannelError::from(source);
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn transport_errors_are_terminal() {
        assert!(ChannelError::Transport("reset".to_string()).is_terminal());
        assert!(ChannelError::Connect("refused".to_string()).is_terminal());
        assert!(ChannelError::Closed.is_terminal());
        assert!(!ChannelError::InvalidConfig("x".to_string()).is_terminal());
    }
}
