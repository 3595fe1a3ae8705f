//! Error types for the presence layer.

use rally_protocol::UserId;

/// Errors that can occur resolving identities or routing to connections.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// The credential could not be resolved to an identity.
    #[error("identity resolution failed: {0}")]
    ResolveFailed(String),

    /// The user has no live connection.
    #[error("user {0} is not connected")]
    NotConnected(UserId),

    /// An invite was aimed at a user with no live connection.
    #[error("user {0} cannot be reached for an invite")]
    TargetUnreachable(UserId),
}
