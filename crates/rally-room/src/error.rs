//! Error types for the room layer.

use rally_protocol::{RoomName, RoomStatus, UserId};

/// Errors that can occur during room operations.
///
/// Every variant is a synchronous, local failure surfaced to the
/// originating caller only; a failed operation never leaves a room
/// partially mutated.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this name exists.
    #[error("room {0} not found")]
    NotFound(RoomName),

    /// The user already occupies a room (this one or another).
    #[error("user {0} is already a member of room {1}")]
    AlreadyMember(UserId, RoomName),

    /// A player-only action attempted by a spectator or non-member.
    #[error("user {0} is not a player in room {1}")]
    NotAPlayer(UserId, RoomName),

    /// A state-machine precondition was violated.
    #[error("room {0} is not ready for this action (status {1})")]
    NotReady(RoomName, RoomStatus),

    /// Both player slots are occupied.
    #[error("room {0} already has two players")]
    CapacityExceeded(RoomName),

    /// The room's command channel is closed or full.
    #[error("room {0} is unavailable")]
    Unavailable(RoomName),
}
