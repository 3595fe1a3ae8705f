//! Error types for matchmaking and invites.

use rally_protocol::{InviteId, UserId};

/// Errors from the matchmaking and invite layer.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No invite session with this id exists (never created, already
    /// consumed, or torn down by a disconnect).
    #[error("invite {0} not found")]
    UnknownInvite(InviteId),

    /// The user is neither the host nor the guest of the invite.
    #[error("user {0} is not part of invite {1}")]
    NotParticipant(UserId, InviteId),

    /// A room-info relay for an invite the guest never accepted.
    #[error("invite {0} has not been accepted")]
    NotAccepted(InviteId),
}
