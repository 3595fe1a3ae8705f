//! The process-wide connection registry.

use std::collections::HashMap;

use rally_protocol::{Identity, ServerEvent, UserId};
use tokio::sync::mpsc;

use crate::PresenceError;

/// Channel sender delivering events to one connection.
///
/// Unbounded on purpose: outbound broadcast is fire-and-forget from the
/// simulation's perspective, and a slow consumer must never stall a
/// room's tick loop.
pub type EventSink = mpsc::UnboundedSender<ServerEvent>;

/// One live connection: who it is and how to reach it.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub identity: Identity,
    sink: EventSink,
}

impl ConnectionHandle {
    /// Delivers an event, silently dropping it if the receiver is gone.
    pub fn send(&self, event: ServerEvent) {
        let _ = self.sink.send(event);
    }

    /// A clone of the underlying sink, for handing to a room actor.
    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }
}

/// Maps each connected user to their live connection.
///
/// Not thread-safe by itself — owned by the gateway behind a single
/// lock, like the room registry. Lifecycle: an entry is inserted when a
/// connection authenticates, removed when it drops, and looked up by id
/// to route invites and unicast events.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<UserId, ConnectionHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self { connections: HashMap::new() }
    }

    /// Registers a connection. A reconnecting user replaces their stale
    /// entry — the old sink is dropped and delivery to it stops.
    pub fn insert(&mut self, identity: Identity, sink: EventSink) {
        let user = identity.id;
        let replaced = self
            .connections
            .insert(user, ConnectionHandle { identity, sink })
            .is_some();
        if replaced {
            tracing::info!(%user, "connection replaced");
        } else {
            tracing::info!(%user, "connection registered");
        }
    }

    /// Removes a connection. Returns the identity if one was present.
    pub fn remove(&mut self, user: UserId) -> Option<Identity> {
        let handle = self.connections.remove(&user)?;
        tracing::info!(%user, "connection removed");
        Some(handle.identity)
    }

    pub fn get(&self, user: UserId) -> Option<&ConnectionHandle> {
        self.connections.get(&user)
    }

    pub fn is_connected(&self, user: UserId) -> bool {
        self.connections.contains_key(&user)
    }

    /// Unicasts an event to one user.
    pub fn send_to(&self, user: UserId, event: ServerEvent) -> Result<(), PresenceError> {
        let handle = self
            .connections
            .get(&user)
            .ok_or(PresenceError::NotConnected(user))?;
        handle.send(event);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
