//! The notification channel client and its driver loop.
//!
//! ```text
//! NotificationClient::new ─► add_callback(...) ─► init(hooks) ─► run()
//!        Uninitialized            Uninitialized     Connecting     Open ─► Closed
//!                                                     └─► Open
//! ```
//!
//! `init` performs the capability check, connects and queues the opening
//! `get`. `run` then owns the connection: it dispatches inbound frames,
//! writes queued outbound frames in order, and fires the resync timer,
//! all from one `select!` loop so none of them run concurrently.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::handle::Outbound;
use super::{
    CallbackRegistry, ChannelHandle, ChannelId, ChannelState, CloseReason, Hooks, ResyncTrigger,
};
use crate::config::ClientConfig;
use crate::error::ChannelError;
use crate::protocol::{Action, Event, Frame, Scope, encode};
use crate::transport::{Connector, Endpoint, FrameReader, FrameWriter};

/// Client for one notification channel.
///
/// One instance drives exactly one connection; once it reaches
/// [`ChannelState::Closed`] a new client is needed.
pub struct NotificationClient<C: Connector> {
    id: ChannelId,
    endpoint: Endpoint,
    scope: Scope,
    connector: C,
    registry: CallbackRegistry,
    hooks: Hooks,
    resync_interval: Option<Duration>,
    state_tx: watch::Sender<ChannelState>,
    outbound_tx: mpsc::UnboundedSender<Outbound>,
    outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    io: Option<(C::Writer, C::Reader)>,
}

impl<C: Connector> fmt::Debug for NotificationClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationClient")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("scope", &self.scope)
            .field("state", &self.state())
            .field("registry", &self.registry)
            .field("hooks", &self.hooks)
            .field("resync_interval", &self.resync_interval)
            .finish_non_exhaustive()
    }
}

impl<C: Connector> NotificationClient<C> {
    /// Creates a client for `endpoint` that requests `scope` on open.
    ///
    /// The resync timer is off until [`Self::with_resync_interval`] is
    /// called.
    #[must_use]
    pub fn new(endpoint: Endpoint, scope: Scope, connector: C) -> Self {
        let (state_tx, _) = watch::channel(ChannelState::Uninitialized);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            id: ChannelId::new(),
            endpoint,
            scope,
            connector,
            registry: CallbackRegistry::new(),
            hooks: Hooks::default(),
            resync_interval: None,
            state_tx,
            outbound_tx,
            outbound_rx,
            io: None,
        }
    }

    /// Creates a client from loaded configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig, connector: C) -> Self {
        Self::new(config.endpoint(), config.scope(), connector)
            .with_resync_interval(config.resync_interval)
    }

    /// Sets the resync timer period. `None` or a zero duration disables it.
    #[must_use]
    pub fn with_resync_interval(mut self, interval: Option<Duration>) -> Self {
        self.resync_interval = interval.filter(|d| !d.is_zero());
        self
    }

    /// Uses a caller-built registry instead of an empty one.
    #[must_use]
    pub fn with_registry(mut self, registry: CallbackRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Identifier of this channel, used in logs.
    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    /// Endpoint this client connects to.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Scope requested on open and on every resync.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        *self.state_tx.borrow()
    }

    /// Registers or replaces the handler for `action`.
    ///
    /// Returns `true` if a handler was replaced.
    pub fn add_callback<F>(&mut self, action: impl Into<Action>, handler: F) -> bool
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.registry.add_callback(action, handler)
    }

    /// Registers or replaces a typed handler for `action`.
    pub fn add_event_callback<F>(&mut self, action: impl Into<Action>, handler: F) -> bool
    where
        F: FnMut(Event) + Send + 'static,
    {
        self.registry.add_event_callback(action, handler)
    }

    /// Mutable access to the callback registry.
    pub fn registry_mut(&mut self) -> &mut CallbackRegistry {
        &mut self.registry
    }

    /// A new sending handle for this channel.
    #[must_use]
    pub fn handle(&self) -> ChannelHandle {
        ChannelHandle::new(
            self.id,
            self.outbound_tx.clone(),
            self.state_tx.subscribe(),
        )
    }

    /// Opens the channel.
    ///
    /// Without a custom `on_open` hook, the scope's `get` request is queued
    /// as the first outbound frame.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::AlreadyInitialized`] if called twice.
    /// - [`ChannelError::Unsupported`] if the connector cannot open a
    ///   channel of the endpoint's security; the unsupported notice hook has
    ///   fired and the client is closed.
    /// - Any connect error from the connector; `on_error` and `on_close`
    ///   have fired and the client is closed.
    pub async fn init(&mut self, hooks: Hooks) -> Result<(), ChannelError> {
        let state = self.state();
        if state != ChannelState::Uninitialized {
            return Err(ChannelError::AlreadyInitialized(state));
        }
        self.hooks = hooks;

        let security = self.endpoint.security;
        if !self.connector.supports(security) {
            let scheme = security.scheme();
            self.hooks.unsupported(&format!(
                "this client does not appear to support {scheme}:// websockets"
            ));
            self.transition(ChannelState::Closed);
            return Err(ChannelError::Unsupported { scheme });
        }

        self.transition(ChannelState::Connecting);
        tracing::info!(channel_id = %self.id, endpoint = %self.endpoint, "connecting");
        match self.connector.connect(&self.endpoint).await {
            Ok(io) => self.io = Some(io),
            Err(e) => {
                self.hooks.error(&e);
                self.transition(ChannelState::Closed);
                self.hooks.closed(CloseReason::Error);
                return Err(e);
            }
        }
        self.transition(ChannelState::Open);

        let handle = self.handle();
        match self.hooks.on_open.as_mut() {
            Some(hook) => hook(&handle),
            None => handle.request_records(&self.scope)?,
        }
        Ok(())
    }

    /// Drives the open channel until it closes.
    ///
    /// Returns why the channel closed. The close hook has fired by then.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotOpen`] if the channel was never opened or
    /// has already been driven to completion.
    pub async fn run(&mut self) -> Result<CloseReason, ChannelError> {
        let Some((mut writer, mut reader)) = self.io.take() else {
            return Err(ChannelError::NotOpen(self.state()));
        };
        let mut resync = self.resync_interval.and_then(|period| {
            let Some(start) = Instant::now().checked_add(period) else {
                tracing::warn!(channel_id = %self.id, ?period, "resync interval out of range, timer off");
                return None;
            };
            let mut timer = tokio::time::interval_at(start, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(timer)
        });

        let reason = loop {
            tokio::select! {
                inbound = reader.next_frame() => match inbound {
                    Some(Ok(text)) => self.dispatch_text(&text),
                    Some(Err(e)) => {
                        self.hooks.error(&e);
                        break CloseReason::Error;
                    }
                    None => break CloseReason::Remote,
                },
                Some(item) = self.outbound_rx.recv() => {
                    let written = match item {
                        Outbound::Frame(text) => writer.write_frame(text).await,
                        Outbound::Resync(trigger) => self.resync(&mut writer, trigger).await,
                        Outbound::Close => {
                            self.shut_down(&mut writer).await;
                            break CloseReason::Local;
                        }
                    };
                    if let Err(e) = written {
                        self.hooks.error(&e);
                        break CloseReason::Error;
                    }
                }
                () = next_tick(&mut resync) => {
                    if let Err(e) = self.resync(&mut writer, ResyncTrigger::Timer).await {
                        self.hooks.error(&e);
                        break CloseReason::Error;
                    }
                }
            }
        };

        self.transition(ChannelState::Closed);
        tracing::info!(channel_id = %self.id, ?reason, "channel closed");
        self.hooks.closed(reason);
        Ok(reason)
    }

    fn dispatch_text(&mut self, text: &str) {
        match Frame::decode(text) {
            Ok(frame) => {
                let invoked = self.registry.dispatch(&frame);
                tracing::trace!(
                    channel_id = %self.id,
                    actions = frame.len(),
                    invoked,
                    "frame dispatched"
                );
            }
            Err(e) => {
                tracing::warn!(channel_id = %self.id, error = %e, "dropping malformed frame");
            }
        }
    }

    async fn resync(
        &mut self,
        writer: &mut C::Writer,
        trigger: ResyncTrigger,
    ) -> Result<(), ChannelError> {
        tracing::debug!(channel_id = %self.id, ?trigger, "resynchronizing");
        let text = encode(&Action::Get, &self.scope.get_payload())?;
        writer.write_frame(text).await?;
        self.hooks.resynced(trigger);
        Ok(())
    }

    async fn shut_down(&mut self, writer: &mut C::Writer) {
        match encode(&Action::Close, &()) {
            Ok(text) => {
                if let Err(e) = writer.write_frame(text).await {
                    tracing::debug!(channel_id = %self.id, error = %e, "close notice not delivered");
                }
            }
            Err(e) => tracing::debug!(channel_id = %self.id, error = %e, "close notice not encoded"),
        }
        if let Err(e) = writer.close().await {
            tracing::debug!(channel_id = %self.id, error = %e, "transport close failed");
        }
    }

    fn transition(&self, next: ChannelState) {
        let prev = self.state_tx.send_replace(next);
        if !prev.can_transition_to(next) {
            tracing::warn!(channel_id = %self.id, from = %prev, to = %next, "unexpected state transition");
        }
        tracing::debug!(channel_id = %self.id, from = %prev, to = %next, "channel state");
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}
