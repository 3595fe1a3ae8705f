//! Core protocol types: identities, rooms, commands, and events.
//!
//! Everything here travels on the wire, so each type derives serde and
//! the enums use internally tagged JSON (`{"cmd": ...}` / `{"event": ...}`)
//! to keep the client-side dispatch a single string match.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable, opaque user identifier. Owned by the external auth system;
/// the core only ever compares and routes on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A user as the core sees them: stable id plus display name.
///
/// The core never mutates an identity — it is resolved once per
/// connection by the external identity resolver and carried along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
}

impl Identity {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// A human-readable room identifier, unique across the registry for the
/// room's lifetime. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(pub String);

impl RoomName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RoomName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of an ephemeral invite handshake session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteId(pub String);

impl fmt::Display for InviteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Room vocabulary
// ---------------------------------------------------------------------------

/// The role an occupant holds in a room.
///
/// Membership lookups return which variant matched instead of probing a
/// type hierarchy — only [`Role::Player`] may ready up, start the game,
/// or move a paddle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Spectator,
}

/// The lifecycle state of a room.
///
/// ```text
/// Lobby → Countdown → Playing → Finished
///   ↑                              │
///   └────────── (re-ready) ────────┘
/// ```
///
/// - **Lobby**: 0–2 players, no play state. Readiness is being collected.
/// - **Countdown**: both players ready, play state initialized, ball
///   placed but not yet moving under gameplay rules.
/// - **Playing**: the 30 ms simulation tick is active.
/// - **Finished**: the match ended. The tick is stopped and play state
///   dropped; a `ready` from a player recycles the room back to Lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Lobby,
    Countdown,
    Playing,
    Finished,
}

impl RoomStatus {
    /// Play state exists exactly while this returns `true`.
    pub fn has_play_state(&self) -> bool {
        matches!(self, Self::Countdown | Self::Playing)
    }

    /// Whether the simulation tick loop should be running.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Countdown => write!(f, "Countdown"),
            Self::Playing => write!(f, "Playing"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

/// Match settings proposed at ready time and fixed for the round.
///
/// Dimensions are board units; the paddle moves along the vertical axis
/// at a fixed horizontal plane near its goal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOptions {
    pub board_width: f32,
    pub board_height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub winning_score: u32,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            board_width: 600.0,
            board_height: 400.0,
            paddle_width: 10.0,
            paddle_height: 80.0,
            winning_score: 5,
        }
    }
}

/// A point-in-time view of one room, as returned by room listings.
///
/// Summaries are detached copies — holding one never aliases live room
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub name: RoomName,
    pub status: RoomStatus,
    pub players: Vec<Identity>,
    pub spectator_count: usize,
}

/// Ball position and velocity as broadcast every state-affecting tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

// ---------------------------------------------------------------------------
// Commands (inbound)
// ---------------------------------------------------------------------------

/// A command from a connected user, already identity-resolved by the
/// transport adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Request a snapshot of all rooms.
    ListRooms,
    /// Create a new, uniquely named room. The caller is not yet joined.
    CreateRoom,
    /// Join a room as a player (if a slot is free) or spectator.
    JoinRoom { room: RoomName },
    /// Mark the sender ready with their proposed options.
    Ready { room: RoomName, options: GameOptions },
    /// Begin play in a room that finished its countdown.
    Start { room: RoomName },
    /// Report the sender's paddle position as a normalized 0..1 offset.
    TouchBar { room: RoomName, offset: f32 },
    /// Leave the room; the room is destroyed when it empties.
    ExitRoom { room: RoomName },
    /// Enter the matchmaking queue, or pair with whoever is waiting.
    RandomMatch,
    /// Begin the invite handshake toward another user.
    CreateInvite { target: UserId },
    /// Accept or decline a pending invite.
    RespondInvite { invite: InviteId, accept: bool },
    /// Relay the host-created room name to the invited user.
    RelayRoomInfo { invite: InviteId, room: RoomName },
}

// ---------------------------------------------------------------------------
// Events (outbound)
// ---------------------------------------------------------------------------

/// An event delivered to connections by the transport adapter.
///
/// Room-scoped events go to every occupant of the named room;
/// `RoomList`, `RoomCreated`, `WaitNotice`, and the invite events are
/// unicast as documented on each variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Unicast: the room snapshot requested by `ListRooms`.
    RoomList { rooms: Vec<RoomSummary> },
    /// Unicast: the room created for the caller.
    RoomCreated { room: RoomName },
    /// Broadcast: someone entered the room.
    RoomJoined { room: RoomName, user: Identity, role: Role },
    /// Unicast to the already-ready player: still waiting on the other.
    WaitNotice { room: RoomName },
    /// Broadcast: both players ready; these options are now fixed.
    ReadyConfirmed {
        room: RoomName,
        options: GameOptions,
        players: Vec<Identity>,
    },
    /// Broadcast: ball state changed this tick.
    BallState { room: RoomName, ball: BallSnapshot },
    /// Broadcast: a goal was scored. Scores are (left slot, right slot).
    ScoreUpdate { room: RoomName, scores: [u32; 2] },
    /// Broadcast exactly once per match.
    GameOver {
        room: RoomName,
        winner: Identity,
        scores: [u32; 2],
    },
    /// Broadcast: a player reported a new paddle offset (normalized).
    PaddleUpdate {
        room: RoomName,
        user: UserId,
        offset: f32,
    },
    /// Broadcast: someone left the room.
    RoomExited { room: RoomName, user: Identity, role: Role },
    /// Broadcast to the freshly paired room after a random match.
    MatchFound { room: RoomName },
    /// Unicast to the invite target only.
    InviteRequested { invite: InviteId, host: Identity },
    /// Unicast to the other party of the invite.
    InviteResponse { invite: InviteId, accept: bool },
    /// Unicast to the invite target: the room to join.
    InviteRoomInfo { invite: InviteId, room: RoomName },
    /// Unicast to the command's sender when it failed.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================
