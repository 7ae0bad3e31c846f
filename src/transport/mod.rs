//! Transport seam between the channel client and the network.
//!
//! A [`Connector`] opens a channel and returns its two halves. The client
//! only ever deals in whole text frames, so any transport that can carry
//! them (a real WebSocket, an in-memory pipe in tests) plugs in here.

use std::fmt;
use std::future::Future;

use crate::error::ChannelError;

pub mod memory;
pub mod ws;

pub use memory::{MemoryConnector, MemoryPeer};
pub use ws::WsConnector;

/// Transport security of the channel.
///
/// Mirrors the security of the page or process the client runs for:
/// secure pages get `wss://`, plain pages get `ws://`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plain `ws://`.
    #[default]
    Plain,
    /// TLS `wss://`.
    Secure,
}

impl Security {
    /// Picks the channel security matching a page scheme (`http`/`https`).
    #[must_use]
    pub fn from_page_scheme(scheme: &str) -> Self {
        if scheme.trim_end_matches(':').eq_ignore_ascii_case("https") {
            Self::Secure
        } else {
            Self::Plain
        }
    }

    /// URL scheme for this security level.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Plain => "ws",
            Self::Secure => "wss",
        }
    }
}

/// Location of the moi WebSocket endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// `host[:port]`, no scheme.
    pub host: String,
    /// Request path, e.g. `/moi-ws/`.
    pub path: String,
    /// Channel security.
    pub security: Security,
}

impl Endpoint {
    /// Creates an endpoint, normalizing the path to start with `/`.
    #[must_use]
    pub fn new(host: impl Into<String>, path: impl Into<String>, security: Security) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            host: host.into(),
            path,
            security,
        }
    }

    /// Full channel URL, e.g. `wss://example.org/moi-ws/`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.security.scheme(), self.host, self.path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Receiving half of an open channel.
pub trait FrameReader: Send + 'static {
    /// Waits for the next inbound text frame.
    ///
    /// Returns `None` once the peer has closed the channel. An `Err` item
    /// means the transport failed; the channel is unusable afterwards.
    fn next_frame(&mut self) -> impl Future<Output = Option<Result<String, ChannelError>>> + Send;
}

/// Sending half of an open channel.
pub trait FrameWriter: Send + 'static {
    /// Writes one complete text frame. A frame is either fully handed to
    /// the transport or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Transport`] if the channel is gone.
    fn write_frame(&mut self, text: String) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Closes the channel from this side.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Transport`] if the close handshake fails.
    fn close(&mut self) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// Opens channels.
pub trait Connector: Send + Sync + 'static {
    /// Receiving half type.
    type Reader: FrameReader;
    /// Sending half type.
    type Writer: FrameWriter;

    /// Capability check: can this connector open a channel of `security`?
    fn supports(&self, security: Security) -> bool;

    /// Opens a channel to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Connect`] if the handshake fails.
    fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<(Self::Writer, Self::Reader), ChannelError>> + Send;
}
