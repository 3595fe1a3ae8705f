//! Room layer for Rally: the registry of live rooms and the per-room
//! actor that owns membership, the round state machine, and the 30 ms
//! simulation loop.
//!
//! A room is a Tokio task reached through a [`RoomHandle`]. The
//! [`RoomRegistry`] allocates names, spawns the actors, and enforces
//! that a user occupies at most one room at a time. The simulation
//! rules themselves live in [`sim`], kept deterministic so they can be
//! tested without a runtime.

mod error;
mod registry;
mod room;
pub mod sim;

pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{Departure, RoomHandle};
