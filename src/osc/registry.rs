use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use rosc::OscMessage;

use crate::error::OscError;

/// Callback invoked with each inbound message at a subscribed address and its sender.
pub type Handler = Arc<dyn Fn(&OscMessage, SocketAddr) -> Result<(), OscError> + Send + Sync>;

/// Identity of a registered handler, used for targeted removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    once: bool,
    handler: Handler,
}

/// Address-keyed listener table owned by one transport.
///
/// An address never maps to an empty list: the key is dropped together with its
/// last listener.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: HashMap<String, Vec<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, address: &str, handler: Handler, once: bool) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(address.to_string())
            .or_default()
            .push(Listener { id, once, handler });
        id
    }

    /// Removes one listener, or every listener at `address` when `id` is `None`.
    /// Returns how many were removed; unknown addresses and ids are a no-op.
    pub fn remove(&mut self, address: &str, id: Option<ListenerId>) -> usize {
        let Some(id) = id else {
            return self.listeners.remove(address).map_or(0, |l| l.len());
        };
        let Some(entries) = self.listeners.get_mut(address) else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|listener| listener.id != id);
        let removed = before - entries.len();
        if entries.is_empty() {
            self.listeners.remove(address);
        }
        removed
    }

    /// Snapshot of the handlers to run for one inbound message. One-shot
    /// listeners are unregistered here, so they can only ever be handed out once.
    pub fn take_for_dispatch(&mut self, address: &str) -> Vec<Handler> {
        let Some(entries) = self.listeners.get_mut(address) else {
            return Vec::new();
        };
        let handlers = entries.iter().map(|l| l.handler.clone()).collect();
        entries.retain(|listener| !listener.once);
        if entries.is_empty() {
            self.listeners.remove(address);
        }
        handlers
    }

    pub fn listener_count(&self, address: &str) -> usize {
        self.listeners.get(address).map_or(0, |l| l.len())
    }

    pub fn contains_address(&self, address: &str) -> bool {
        self.listeners.contains_key(address)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Drops every handler. Pending queries see their reply channel disconnect.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
