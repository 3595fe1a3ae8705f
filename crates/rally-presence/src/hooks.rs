//! External hooks: identity resolution and presence updates.
//!
//! Rally does not authenticate users or persist their status — both
//! belong to the surrounding system. These traits are the seams where
//! that system plugs in; tests use trivial implementations.

use rally_protocol::Identity;

use crate::PresenceError;

/// Resolves a connection's credential to a stable identity.
///
/// Called once when a connection is registered. The credential is
/// whatever the transport extracted (a session token, a JWT, a cookie) —
/// opaque to the core.
pub trait IdentityResolver: Send + Sync + 'static {
    fn resolve(
        &self,
        credential: &str,
    ) -> impl std::future::Future<Output = Result<Identity, PresenceError>> + Send;
}

/// A user's presence as reported to the surrounding system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    /// Connected, not in a room.
    Online,
    /// Occupying a room as player or spectator.
    InGame,
    /// Connection gone.
    Offline,
}

/// Receives presence transitions on connect, room join/leave, and
/// disconnect. Implementations must not block — the gateway calls this
/// inline on its command path.
pub trait PresenceHook: Send + Sync + 'static {
    fn status_changed(&self, user: rally_protocol::UserId, status: PresenceStatus);
}

/// A hook that ignores every update. Useful in tests and demos.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPresenceHook;

impl PresenceHook for NoopPresenceHook {
    fn status_changed(&self, _user: rally_protocol::UserId, _status: PresenceStatus) {}
}
