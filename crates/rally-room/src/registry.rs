//! The room registry: name allocation, lookup, and the one-room-per-user
//! invariant.

use std::collections::HashMap;

use rally_presence::EventSink;
use rally_protocol::{Identity, Role, RoomName, RoomSummary, UserId};
use rally_tick::TickConfig;
use rand::Rng;

use crate::room::{spawn_room, Departure, RoomHandle};
use crate::RoomError;

const COMMAND_CHANNEL_SIZE: usize = 64;

/// Owns every live room and tracks which room each user occupies.
///
/// Not internally synchronized; the gateway holds it behind one lock.
/// Room actors run on their own tasks, so registry methods only block
/// for the round trip of a single command.
pub struct RoomRegistry {
    rooms: HashMap<RoomName, RoomHandle>,
    occupants: HashMap<UserId, RoomName>,
    tick: TickConfig,
}

impl RoomRegistry {
    pub fn new(tick: TickConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            occupants: HashMap::new(),
            tick,
        }
    }

    /// Creates a room under a fresh random name and returns the name.
    /// Name collisions are retried, so every live room name is unique.
    pub fn create(&mut self) -> RoomName {
        let name = loop {
            // Nine decimal digits, the same shape clients already use
            // for room links.
            let candidate = RoomName::from(
                rand::rng().random_range(100_000_000u64..1_000_000_000).to_string(),
            );
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        tracing::info!(room = %name, "room created");
        let handle = spawn_room(name.clone(), self.tick.clone(), COMMAND_CHANNEL_SIZE);
        self.rooms.insert(name.clone(), handle);
        name
    }

    /// Adds a user to a room, enforcing that nobody occupies two rooms
    /// at once. The role comes back from the room itself.
    pub async fn join(
        &mut self,
        name: &RoomName,
        identity: Identity,
        sink: EventSink,
    ) -> Result<Role, RoomError> {
        let user = identity.id;
        if let Some(current) = self.occupants.get(&user) {
            return Err(RoomError::AlreadyMember(user, current.clone()));
        }
        let handle = self
            .rooms
            .get(name)
            .ok_or_else(|| RoomError::NotFound(name.clone()))?;

        let role = handle.join(identity, sink).await?;
        self.occupants.insert(user, name.clone());
        Ok(role)
    }

    /// Removes a user from a room. Destroys the room once the last
    /// occupant is gone.
    pub async fn leave(&mut self, name: &RoomName, user: UserId) -> Result<Departure, RoomError> {
        let handle = self
            .rooms
            .get(name)
            .ok_or_else(|| RoomError::NotFound(name.clone()))?;

        let departure = handle.leave(user).await?;
        self.occupants.remove(&user);

        if departure.remaining == 0 {
            tracing::info!(room = %name, "room empty, destroying");
            if let Some(handle) = self.rooms.remove(name) {
                let _ = handle.shutdown().await;
            }
        }
        Ok(departure)
    }

    /// The room a user currently occupies, if any.
    pub fn room_of(&self, user: UserId) -> Option<&RoomName> {
        self.occupants.get(&user)
    }

    pub fn get(&self, name: &RoomName) -> Option<&RoomHandle> {
        self.rooms.get(name)
    }

    /// Summaries of every live room. A room that died without being
    /// removed is skipped rather than failing the whole listing.
    pub async fn list(&self) -> Vec<RoomSummary> {
        let mut summaries = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            match handle.summary().await {
                Ok(summary) => summaries.push(summary),
                Err(err) => {
                    tracing::warn!(room = %handle.name(), %err, "skipping unresponsive room");
                }
            }
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
