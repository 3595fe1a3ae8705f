//! Connection tracking and external identity hooks for Rally.
//!
//! This crate owns the process-wide map from a user identity to their
//! live connection, and defines the two traits the surrounding system
//! implements for the core:
//!
//! 1. **Identity resolution** — turning a connection's credential into
//!    a stable [`Identity`](rally_protocol::Identity) ([`IdentityResolver`])
//! 2. **Presence updates** — being told when a user goes online, enters
//!    a game, or drops ([`PresenceHook`])
//!
//! The registry is the explicit replacement for an ambient
//! identity-to-socket global: populated on connect, removed on
//! disconnect, queried only by id — never iterated for broad scans.

mod error;
mod hooks;
mod registry;

pub use error::PresenceError;
pub use hooks::{IdentityResolver, NoopPresenceHook, PresenceHook, PresenceStatus};
pub use registry::{ConnectionHandle, ConnectionRegistry, EventSink};
