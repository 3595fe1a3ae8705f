//! The gateway: one dispatch surface between connections and the engine.
//!
//! A transport adapter resolves each connection to an [`Identity`],
//! registers it with [`Gateway::connect`], and forwards decoded
//! [`ClientCommand`]s to [`Gateway::handle_command`]. Events flow back
//! through the per-connection channel handed out at connect time.
//!
//! The gateway owns the room registry, the match queue, the invite book,
//! and the connection registry behind a single lock. Room actors run on
//! their own tasks, so the lock is only held for registry bookkeeping
//! and the round trip of individual room commands.

use rally_match::{Enqueued, InviteBook, MatchQueue};
use rally_presence::{
    ConnectionRegistry, EventSink, PresenceError, PresenceHook, PresenceStatus,
};
use rally_protocol::{ClientCommand, Identity, Role, RoomName, ServerEvent, UserId};
use rally_room::{RoomError, RoomRegistry};
use rally_tick::TickConfig;
use tokio::sync::{mpsc, Mutex};

use crate::RallyError;

struct GatewayState {
    rooms: RoomRegistry,
    queue: MatchQueue,
    invites: InviteBook,
    connections: ConnectionRegistry,
}

/// The engine façade. One instance per process; share it behind an
/// `Arc` across connection tasks.
pub struct Gateway<H: PresenceHook = rally_presence::NoopPresenceHook> {
    state: Mutex<GatewayState>,
    hook: H,
}

impl Gateway {
    /// A gateway with the default tick rate and no presence hook.
    pub fn new() -> Self {
        Self::with_hook(TickConfig::default(), rally_presence::NoopPresenceHook)
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: PresenceHook> Gateway<H> {
    pub fn with_hook(tick: TickConfig, hook: H) -> Self {
        Self {
            state: Mutex::new(GatewayState {
                rooms: RoomRegistry::new(tick),
                queue: MatchQueue::new(),
                invites: InviteBook::new(),
                connections: ConnectionRegistry::new(),
            }),
            hook,
        }
    }

    /// Registers a connection and returns the event stream for it.
    pub async fn connect(&self, identity: Identity) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let user = identity.id;
        self.state.lock().await.connections.insert(identity, tx);
        self.hook.status_changed(user, PresenceStatus::Online);
        rx
    }

    /// Tears a connection down exactly as if the user had walked out:
    /// leave the current room, cancel any queue entry, discard open
    /// invites (the counterpart sees a decline), then drop the entry.
    pub async fn disconnect(&self, user: UserId) {
        let mut state = self.state.lock().await;

        if let Some(room) = state.rooms.room_of(user).cloned() {
            if let Err(err) = state.rooms.leave(&room, user).await {
                tracing::warn!(%user, room = %room, %err, "leave on disconnect failed");
            }
        }
        state.queue.cancel(user);
        for session in state.invites.purge_user(user) {
            let other = if session.host == user { session.guest } else { session.host };
            let _ = state.connections.send_to(other, ServerEvent::InviteResponse {
                invite: session.id,
                accept: false,
            });
        }
        let removed = state.connections.remove(user);
        drop(state);

        if removed.is_some() {
            self.hook.status_changed(user, PresenceStatus::Offline);
        }
    }

    /// Dispatches one command on behalf of a connected user.
    ///
    /// Errors are returned to the caller and never mutate shared state:
    /// every precondition is validated before the first side effect.
    pub async fn handle_command(
        &self,
        user: UserId,
        cmd: ClientCommand,
    ) -> Result<(), RallyError> {
        let mut transitions: Vec<(UserId, PresenceStatus)> = Vec::new();
        let mut state = self.state.lock().await;

        match cmd {
            ClientCommand::ListRooms => {
                let rooms = state.rooms.list().await;
                state.connections.send_to(user, ServerEvent::RoomList { rooms })?;
            }

            ClientCommand::CreateRoom => {
                let room = state.rooms.create();
                state.connections.send_to(user, ServerEvent::RoomCreated { room })?;
            }

            ClientCommand::JoinRoom { room } => {
                let (identity, sink) = connection_of(&state.connections, user)?;
                state.rooms.join(&room, identity, sink).await?;
                // Joining a room by hand abandons any matchmaking wait.
                state.queue.cancel(user);
                transitions.push((user, PresenceStatus::InGame));
            }

            ClientCommand::Ready { room, options } => {
                let handle = room_handle(&state.rooms, &room)?;
                handle.ready(user, options).await?;
            }

            ClientCommand::Start { room } => {
                let handle = room_handle(&state.rooms, &room)?;
                handle.start(user).await?;
            }

            ClientCommand::TouchBar { room, offset } => {
                let handle = room_handle(&state.rooms, &room)?;
                handle.touch_bar(user, offset).await?;
            }

            ClientCommand::ExitRoom { room } => {
                state.rooms.leave(&room, user).await?;
                transitions.push((user, PresenceStatus::Online));
            }

            ClientCommand::RandomMatch => {
                // Occupants cannot queue: pairing would fail after the
                // room is already created.
                if let Some(current) = state.rooms.room_of(user) {
                    return Err(RoomError::AlreadyMember(user, current.clone()).into());
                }
                match state.queue.enqueue(user) {
                    Enqueued::Waiting | Enqueued::AlreadyWaiting => {}
                    Enqueued::Paired(partner) => {
                        // The longer-waiting partner takes the first slot.
                        // Both ends are validated before any room exists.
                        let (partner_identity, partner_sink) =
                            connection_of(&state.connections, partner)?;
                        let (identity, sink) = connection_of(&state.connections, user)?;
                        if let Some(current) = state.rooms.room_of(partner) {
                            return Err(
                                RoomError::AlreadyMember(partner, current.clone()).into()
                            );
                        }

                        let room = state.rooms.create();
                        expect_player(
                            state.rooms.join(&room, partner_identity, partner_sink).await?,
                            &room,
                        )?;
                        expect_player(state.rooms.join(&room, identity, sink).await?, &room)?;

                        let handle = room_handle(&state.rooms, &room)?;
                        handle
                            .broadcast(ServerEvent::MatchFound { room: room.clone() })
                            .await?;
                        transitions.push((partner, PresenceStatus::InGame));
                        transitions.push((user, PresenceStatus::InGame));
                    }
                }
            }

            ClientCommand::CreateInvite { target } => {
                if !state.connections.is_connected(target) {
                    return Err(PresenceError::TargetUnreachable(target).into());
                }
                let (host, _) = connection_of(&state.connections, user)?;
                let invite = state.invites.create(user, target);
                state
                    .connections
                    .send_to(target, ServerEvent::InviteRequested { invite, host })?;
            }

            ClientCommand::RespondInvite { invite, accept } => {
                let host = state.invites.respond(&invite, user, accept)?;
                state
                    .connections
                    .send_to(host, ServerEvent::InviteResponse { invite, accept })?;
            }

            ClientCommand::RelayRoomInfo { invite, room } => {
                let guest = state.invites.take_for_relay(&invite, user)?;
                state
                    .connections
                    .send_to(guest, ServerEvent::InviteRoomInfo { invite, room })?;
            }
        }

        drop(state);
        for (user, status) in transitions {
            self.hook.status_changed(user, status);
        }
        Ok(())
    }

    /// Number of live connections, for diagnostics.
    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connections.len()
    }

    /// Number of live rooms, for diagnostics.
    pub async fn room_count(&self) -> usize {
        self.state.lock().await.rooms.len()
    }
}

fn connection_of(
    connections: &ConnectionRegistry,
    user: UserId,
) -> Result<(Identity, EventSink), PresenceError> {
    let handle = connections
        .get(user)
        .ok_or(PresenceError::NotConnected(user))?;
    Ok((handle.identity.clone(), handle.sink()))
}

fn room_handle<'a>(
    rooms: &'a RoomRegistry,
    room: &RoomName,
) -> Result<&'a rally_room::RoomHandle, RoomError> {
    rooms.get(room).ok_or_else(|| RoomError::NotFound(room.clone()))
}

fn expect_player(role: Role, room: &RoomName) -> Result<(), RoomError> {
    if role == Role::Player {
        Ok(())
    } else {
        Err(RoomError::CapacityExceeded(room.clone()))
    }
}
