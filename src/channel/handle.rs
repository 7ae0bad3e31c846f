//! Cloneable sending handle for an open channel.

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use super::{ChannelId, ChannelState, ResyncTrigger};
use crate::error::ChannelError;
use crate::protocol::{Action, RecordId, Scope, Selection, encode};

/// Work queued for the driver loop.
#[derive(Debug)]
pub(crate) enum Outbound {
    /// Encoded frame text.
    Frame(String),
    /// Re-request the client's scope.
    Resync(ResyncTrigger),
    /// Send `{"close": null}` and shut the channel.
    Close,
}

/// Handle for sending on a channel from handlers and other tasks.
///
/// Sends are fire-and-forget: frames are queued and written in order by
/// [`super::NotificationClient::run`].
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    id: ChannelId,
    outbound: mpsc::UnboundedSender<Outbound>,
    state: watch::Receiver<ChannelState>,
}

impl ChannelHandle {
    pub(crate) const fn new(
        id: ChannelId,
        outbound: mpsc::UnboundedSender<Outbound>,
        state: watch::Receiver<ChannelState>,
    ) -> Self {
        Self {
            id,
            outbound,
            state,
        }
    }

    /// Identifier of the channel this handle sends on.
    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Serializes `{action: payload}` and queues it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotOpen`] unless the channel is open,
    /// [`ChannelError::Json`] if `payload` does not serialize, and
    /// [`ChannelError::Closed`] if the driver loop is gone.
    pub fn send<T>(&self, action: impl Into<Action>, payload: &T) -> Result<(), ChannelError>
    where
        T: Serialize + ?Sized,
    {
        self.ensure_open()?;
        let action = action.into();
        let text = encode(&action, payload)?;
        tracing::trace!(channel_id = %self.id, %action, "queueing frame");
        self.enqueue(Outbound::Frame(text))
    }

    /// Asks for the records of `scope` (`get`).
    ///
    /// # Errors
    ///
    /// Same as [`ChannelHandle::send`].
    pub fn request_records(&self, scope: &Scope) -> Result<(), ChannelError> {
        self.send(Action::Get, &scope.get_payload())
    }

    /// Asks the server to drop a tracked record (`remove`).
    ///
    /// # Errors
    ///
    /// Same as [`ChannelHandle::send`].
    pub fn request_remove(&self, id: &RecordId) -> Result<(), ChannelError> {
        self.send(Action::Remove, &[id])
    }

    /// Pushes the current sample selection (`sel`).
    ///
    /// # Errors
    ///
    /// Same as [`ChannelHandle::send`].
    pub fn send_selection(&self, selection: &Selection) -> Result<(), ChannelError> {
        self.send(Action::Sel, selection)
    }

    /// Re-requests the client's scope and fires the resync hook.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotOpen`] unless the channel is open, or
    /// [`ChannelError::Closed`] if the driver loop is gone.
    pub fn force_resync(&self) -> Result<(), ChannelError> {
        self.ensure_open()?;
        self.enqueue(Outbound::Resync(ResyncTrigger::Requested))
    }

    /// Closes the channel after every frame queued before this call.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotOpen`] unless the channel is open, or
    /// [`ChannelError::Closed`] if the driver loop is gone.
    pub fn close(&self) -> Result<(), ChannelError> {
        self.ensure_open()?;
        self.enqueue(Outbound::Close)
    }

    /// Waits until the channel reaches `Closed`.
    pub async fn closed(&mut self) {
        // A dropped sender means the client is gone, which is closed too.
        let _ = self.state.wait_for(|s| *s == ChannelState::Closed).await;
    }

    fn ensure_open(&self) -> Result<(), ChannelError> {
        match self.state() {
            ChannelState::Open => Ok(()),
            other => Err(ChannelError::NotOpen(other)),
        }
    }

    fn enqueue(&self, item: Outbound) -> Result<(), ChannelError> {
        self.outbound.send(item).map_err(|_| ChannelError::Closed)
    }
}
