//! Unified error type for the Rally engine.

use rally_match::MatchError;
use rally_presence::PresenceError;
use rally_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `rally` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RallyError {
    /// A room-level error (not found, membership, state machine).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A matchmaking or invite error.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// A presence or connection routing error.
    #[error(transparent)]
    Presence(#[from] PresenceError),
}
