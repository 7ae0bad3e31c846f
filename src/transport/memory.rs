//! In-process transport for tests.
//!
//! [`MemoryConnector::pair`] returns a connector and the [`MemoryPeer`]
//! playing the server: the peer sees every frame the client writes, pushes
//! frames to the client, and can hang up or inject transport errors.

use tokio::sync::{Mutex, mpsc};

use super::{Connector, Endpoint, FrameReader, FrameWriter, Security};
use crate::error::ChannelError;

type Inbound = Result<String, ChannelError>;

/// Connector that hands out one in-memory channel.
#[derive(Debug)]
pub struct MemoryConnector {
    halves: Mutex<Option<(MemoryWriter, MemoryReader)>>,
    secure_supported: bool,
    refuse: Option<String>,
}

impl MemoryConnector {
    /// Creates a connector and the peer on the other end of its channel.
    #[must_use]
    pub fn pair() -> (Self, MemoryPeer) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let connector = Self {
            halves: Mutex::new(Some((
                MemoryWriter { tx: Some(out_tx) },
                MemoryReader { rx: in_rx },
            ))),
            secure_supported: true,
            refuse: None,
        };
        let peer = MemoryPeer {
            sent: out_rx,
            inbound: Some(in_tx),
        };
        (connector, peer)
    }

    /// Makes the capability check fail for secure channels.
    #[must_use]
    pub fn without_secure(mut self) -> Self {
        self.secure_supported = false;
        self
    }

    /// Makes every connect attempt fail with `reason`.
    #[must_use]
    pub fn refusing(mut self, reason: impl Into<String>) -> Self {
        self.refuse = Some(reason.into());
        self
    }
}

impl Connector for MemoryConnector {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    fn supports(&self, security: Security) -> bool {
        security == Security::Plain || self.secure_supported
    }

    async fn connect(&self, endpoint: &Endpoint) -> Result<(MemoryWriter, MemoryReader), ChannelError> {
        if let Some(reason) = &self.refuse {
            return Err(ChannelError::Connect(format!("{endpoint}: {reason}")));
        }
        self.halves
            .lock()
            .await
            .take()
            .ok_or_else(|| ChannelError::Connect(format!("{endpoint}: already connected")))
    }
}

/// Client-side receiving half.
#[derive(Debug)]
pub struct MemoryReader {
    rx: mpsc::UnboundedReceiver<Inbound>,
}

impl FrameReader for MemoryReader {
    async fn next_frame(&mut self) -> Option<Result<String, ChannelError>> {
        self.rx.recv().await
    }
}

/// Client-side sending half.
#[derive(Debug)]
pub struct MemoryWriter {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl FrameWriter for MemoryWriter {
    async fn write_frame(&mut self, text: String) -> Result<(), ChannelError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| ChannelError::Transport("writer closed".to_string()))?;
        tx.send(text)
            .map_err(|_| ChannelError::Transport("peer dropped".to_string()))
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.tx = None;
        Ok(())
    }
}

/// Server end of a memory channel.
#[derive(Debug)]
pub struct MemoryPeer {
    sent: mpsc::UnboundedReceiver<String>,
    inbound: Option<mpsc::UnboundedSender<Inbound>>,
}

impl MemoryPeer {
    /// Next frame written by the client; `None` once the client closed its
    /// writer and every earlier frame was read.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.sent.recv().await
    }

    /// Next frame written by the client, if one is already queued.
    pub fn try_next_sent(&mut self) -> Option<String> {
        self.sent.try_recv().ok()
    }

    /// Pushes a text frame to the client. Returns `false` if the client
    /// reader is gone or the peer already hung up.
    pub fn push(&self, text: impl Into<String>) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|tx| tx.send(Ok(text.into())).is_ok())
    }

    /// Delivers a transport error to the client reader.
    pub fn push_error(&self, reason: impl Into<String>) -> bool {
        self.inbound.as_ref().is_some_and(|tx| {
            tx.send(Err(ChannelError::Transport(reason.into())))
                .is_ok()
        })
    }

    /// Closes the server side; the client reader sees end of stream.
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }
}
