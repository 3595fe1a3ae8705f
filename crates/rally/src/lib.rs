//! # Rally
//!
//! A real-time two-player ball-and-paddle session engine: rooms, a
//! 30 ms server-side simulation, FIFO matchmaking, and an invite
//! handshake, all behind one gateway.
//!
//! A transport adapter (WebSocket, loopback, anything that can decode a
//! [`ClientCommand`]) registers each connection with
//! [`Gateway::connect`] and forwards commands to
//! [`Gateway::handle_command`]; every [`ServerEvent`] the engine emits
//! arrives on the per-connection channel returned at connect time.
//!
//! ```rust,no_run
//! use rally::{Gateway, ClientCommand, Identity, UserId};
//!
//! # async fn run() -> Result<(), rally::RallyError> {
//! let gateway = Gateway::new();
//! let mut events = gateway.connect(Identity::new(UserId(1), "ana")).await;
//! gateway.handle_command(UserId(1), ClientCommand::CreateRoom).await?;
//! let created = events.recv().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod gateway;

pub use error::RallyError;
pub use gateway::Gateway;

pub use rally_match::{Enqueued, MatchError};
pub use rally_presence::{
    IdentityResolver, NoopPresenceHook, PresenceError, PresenceHook, PresenceStatus,
};
pub use rally_protocol::{
    BallSnapshot, ClientCommand, GameOptions, Identity, InviteId, Role, RoomName,
    RoomStatus, RoomSummary, ServerEvent, UserId,
};
pub use rally_room::RoomError;
pub use rally_tick::TickConfig;
