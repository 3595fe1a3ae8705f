//! Matchmaking for Rally: the random-match queue and the invite
//! handshake.
//!
//! Both structures are plain single-threaded state owned by the gateway;
//! they decide WHO plays together, while room creation and membership
//! stay with the room layer.

mod error;
mod invite;
mod queue;

pub use error::MatchError;
pub use invite::{InviteBook, InviteSession};
pub use queue::{Enqueued, MatchQueue};
