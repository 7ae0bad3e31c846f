//! Per-client callback registry keyed by action.
//!
//! One handler per action, last registration wins. Dispatch walks every
//! entry of a decoded frame and hands each payload, untouched, to the
//! handler registered for its action. Entries without a handler are
//! dropped; new server actions must not break older clients.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::protocol::{Action, Event, Frame};

/// Boxed payload handler.
pub type Handler = Box<dyn FnMut(&Value) + Send>;

/// Maps each [`Action`] to its handler.
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<Action, Handler>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("actions", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CallbackRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `action`, replacing any previous one.
    ///
    /// Returns `true` if a handler was replaced.
    pub fn add_callback<F>(&mut self, action: impl Into<Action>, handler: F) -> bool
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.handlers
            .insert(action.into(), Box::new(handler))
            .is_some()
    }

    /// Registers a handler that receives the typed [`Event`] for `action`.
    ///
    /// Payloads that do not decode are logged at `warn` and skipped.
    pub fn add_event_callback<F>(&mut self, action: impl Into<Action>, mut handler: F) -> bool
    where
        F: FnMut(Event) + Send + 'static,
    {
        let action = action.into();
        let key = action.clone();
        self.add_callback(key, move |payload| {
            match Event::from_entry(&action, payload) {
                Ok(event) => handler(event),
                Err(e) => tracing::warn!(%action, error = %e, "dropping undecodable payload"),
            }
        })
    }

    /// Removes the handler for `action`. Returns `true` if one existed.
    pub fn remove_callback(&mut self, action: &Action) -> bool {
        self.handlers.remove(action).is_some()
    }

    /// Returns `true` if `action` has a handler.
    #[must_use]
    pub fn contains(&self, action: &Action) -> bool {
        self.handlers.contains_key(action)
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Dispatches every entry of `frame`. Returns how many handlers ran.
    pub fn dispatch(&mut self, frame: &Frame) -> usize {
        let mut invoked = 0;
        for (action, payload) in frame.entries() {
            match self.handlers.get_mut(action) {
                Some(handler) => {
                    handler(payload);
                    invoked += 1;
                }
                None => tracing::trace!(%action, "no handler registered"),
            }
        }
        invoked
    }
}
