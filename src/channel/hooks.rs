//! Lifecycle hooks supplied to [`super::NotificationClient::init`].
//!
//! Every hook is optional. Defaults: on open, request the client's scope
//! with `get`; capability failures are logged once at `error`; the other
//! hooks only log.

use std::fmt;

use super::{ChannelHandle, CloseReason};
use crate::error::ChannelError;

/// Called once when the channel opens. Replaces the default `get` request.
pub type OpenHook = Box<dyn FnMut(&ChannelHandle) + Send>;
/// Called once when the channel reaches `Closed`.
pub type CloseHook = Box<dyn FnMut(CloseReason) + Send>;
/// Called on connect, read or write failures.
pub type ErrorHook = Box<dyn FnMut(&ChannelError) + Send>;
/// Called once if the transport cannot be used at all.
pub type NoticeHook = Box<dyn FnMut(&str) + Send>;
/// Called on every resynchronization.
pub type ResyncHook = Box<dyn FnMut(ResyncTrigger) + Send>;

/// What caused a resynchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncTrigger {
    /// The periodic resync timer fired.
    Timer,
    /// [`ChannelHandle::force_resync`] was called.
    Requested,
}

/// Optional lifecycle callbacks.
#[derive(Default)]
pub struct Hooks {
    pub(crate) on_open: Option<OpenHook>,
    pub(crate) on_close: Option<CloseHook>,
    pub(crate) on_error: Option<ErrorHook>,
    pub(crate) on_unsupported: Option<NoticeHook>,
    pub(crate) on_resync: Option<ResyncHook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_unsupported", &self.on_unsupported.is_some())
            .field("on_resync", &self.on_resync.is_some())
            .finish()
    }
}

impl Hooks {
    /// Hooks with every default behavior.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom open action. The default `get` request is then not sent.
    #[must_use]
    pub fn on_open(mut self, hook: impl FnMut(&ChannelHandle) + Send + 'static) -> Self {
        self.on_open = Some(Box::new(hook));
        self
    }

    /// Close notification.
    #[must_use]
    pub fn on_close(mut self, hook: impl FnMut(CloseReason) + Send + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Transport error notification.
    #[must_use]
    pub fn on_error(mut self, hook: impl FnMut(&ChannelError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// User-facing notice for a transport that cannot be used.
    #[must_use]
    pub fn on_unsupported(mut self, hook: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_unsupported = Some(Box::new(hook));
        self
    }

    /// Resync notification, e.g. to refetch full state over HTTP.
    #[must_use]
    pub fn on_resync(mut self, hook: impl FnMut(ResyncTrigger) + Send + 'static) -> Self {
        self.on_resync = Some(Box::new(hook));
        self
    }

    pub(crate) fn closed(&mut self, reason: CloseReason) {
        match self.on_close.as_mut() {
            Some(hook) => hook(reason),
            None => tracing::info!(?reason, "notification channel closed"),
        }
    }

    pub(crate) fn error(&mut self, err: &ChannelError) {
        match self.on_error.as_mut() {
            Some(hook) => hook(err),
            None => tracing::warn!(error = %err, "notification channel error"),
        }
    }

    pub(crate) fn unsupported(&mut self, notice: &str) {
        match self.on_unsupported.as_mut() {
            Some(hook) => hook(notice),
            None => tracing::error!("{notice}"),
        }
    }

    pub(crate) fn resynced(&mut self, trigger: ResyncTrigger) {
        if let Some(hook) = self.on_resync.as_mut() {
            hook(trigger);
        }
    }
}
