//! Wire-facing types for Rally.
//!
//! This crate defines the vocabulary that the gateway and the external
//! transport adapter share: identities, room names, game options, the
//! inbound [`ClientCommand`] set and the outbound [`ServerEvent`] set.
//!
//! The protocol layer knows nothing about connections, rooms, or the
//! simulation — it is pure data. Serialization is plain serde; the JSON
//! shapes are pinned by the tests in `types.rs` because the client SDK
//! parses them.

mod types;

pub use types::{
    BallSnapshot, ClientCommand, GameOptions, Identity, InviteId, Role,
    RoomName, RoomStatus, RoomSummary, ServerEvent, UserId,
};
