//! Room actor: an isolated Tokio task owning one match session.
//!
//! Each room runs in its own task and is reached only through its
//! command channel. The actor also owns the room's tick scheduler, so
//! inbound commands and simulation ticks are serialized by the same
//! `select!` loop — the single-writer discipline the engine requires.

use std::collections::HashMap;

use rally_physics::Ball;
use rally_presence::EventSink;
use rally_protocol::{
    GameOptions, Identity, Role, RoomName, RoomStatus, RoomSummary, ServerEvent, UserId,
};
use rally_tick::{TickConfig, TickInfo, TickScheduler};
use tokio::sync::{mpsc, oneshot};

use crate::sim::{self, PlayState, SimEvent};
use crate::RoomError;

/// What a completed leave looked like, reported back to the registry.
#[derive(Debug, Clone)]
pub struct Departure {
    pub identity: Identity,
    pub role: Role,
    /// Occupants (players + spectators) left behind. Zero means the
    /// registry must destroy the room.
    pub remaining: usize,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        identity: Identity,
        sink: EventSink,
        reply: oneshot::Sender<Result<Role, RoomError>>,
    },
    Leave {
        user: UserId,
        reply: oneshot::Sender<Result<Departure, RoomError>>,
    },
    Ready {
        user: UserId,
        options: GameOptions,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Start {
        user: UserId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    TouchBar {
        user: UserId,
        offset: f32,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Summary {
        reply: oneshot::Sender<RoomSummary>,
    },
    /// Broadcast an event to every occupant (used by the gateway for
    /// room-scoped notifications it originates, e.g. match pairing).
    Broadcast {
        event: ServerEvent,
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone; the registry holds
/// one per room.
#[derive(Clone)]
pub struct RoomHandle {
    name: RoomName,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn name(&self) -> &RoomName {
        &self.name
    }

    pub async fn join(&self, identity: Identity, sink: EventSink) -> Result<Role, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join { identity, sink, reply: reply_tx })
            .await?;
        self.recv(reply_rx).await?
    }

    pub async fn leave(&self, user: UserId) -> Result<Departure, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave { user, reply: reply_tx }).await?;
        self.recv(reply_rx).await?
    }

    pub async fn ready(&self, user: UserId, options: GameOptions) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Ready { user, options, reply: reply_tx })
            .await?;
        self.recv(reply_rx).await?
    }

    pub async fn start(&self, user: UserId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Start { user, reply: reply_tx }).await?;
        self.recv(reply_rx).await?
    }

    pub async fn touch_bar(&self, user: UserId, offset: f32) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::TouchBar { user, offset, reply: reply_tx })
            .await?;
        self.recv(reply_rx).await?
    }

    pub async fn summary(&self) -> Result<RoomSummary, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Summary { reply: reply_tx }).await?;
        self.recv(reply_rx).await
    }

    pub async fn broadcast(&self, event: ServerEvent) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Broadcast { event, reply: reply_tx })
            .await?;
        self.recv(reply_rx).await
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))
    }

    async fn recv<T>(&self, rx: oneshot::Receiver<T>) -> Result<T, RoomError> {
        rx.await.map_err(|_| RoomError::Unavailable(self.name.clone()))
    }
}

/// One of the (at most two) player slots, in join order. Slot 0 defends
/// the left goal line, slot 1 the right.
struct PlayerSlot {
    identity: Identity,
    ready: bool,
    proposal: Option<GameOptions>,
    /// Last reported paddle center, already scaled into board
    /// coordinates. Client-trusted; no plausibility checks.
    touch_bar: f32,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    name: RoomName,
    status: RoomStatus,
    players: Vec<PlayerSlot>,
    spectators: Vec<Identity>,
    /// Per-occupant outbound channels (players and spectators alike).
    sinks: HashMap<UserId, EventSink>,
    /// Options adopted for the current round (slot 0's proposal once
    /// both players are ready; defaults until then).
    options: GameOptions,
    play: Option<PlayState>,
    scheduler: TickScheduler,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room = %self.name, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(RoomCommand::Join { identity, sink, reply }) => {
                            let _ = reply.send(self.handle_join(identity, sink));
                        }
                        Some(RoomCommand::Leave { user, reply }) => {
                            let _ = reply.send(self.handle_leave(user));
                        }
                        Some(RoomCommand::Ready { user, options, reply }) => {
                            let _ = reply.send(self.handle_ready(user, options));
                        }
                        Some(RoomCommand::Start { user, reply }) => {
                            let _ = reply.send(self.handle_start(user));
                        }
                        Some(RoomCommand::TouchBar { user, offset, reply }) => {
                            let _ = reply.send(self.handle_touch_bar(user, offset));
                        }
                        Some(RoomCommand::Summary { reply }) => {
                            let _ = reply.send(self.summary());
                        }
                        Some(RoomCommand::Broadcast { event, reply }) => {
                            self.broadcast(event);
                            let _ = reply.send(());
                        }
                        Some(RoomCommand::Shutdown) | None => break,
                    }
                }
                tick = self.scheduler.wait_for_tick() => {
                    self.handle_tick(tick);
                }
            }
        }

        tracing::info!(room = %self.name, "room actor stopped");
    }

    fn handle_join(&mut self, identity: Identity, sink: EventSink) -> Result<Role, RoomError> {
        let user = identity.id;
        if self.sinks.contains_key(&user) {
            return Err(RoomError::AlreadyMember(user, self.name.clone()));
        }

        // An empty player slot is filled first; a full room admits the
        // joiner as a spectator — capacity never fails a join.
        let role = if self.players.len() < 2 {
            self.players.push(PlayerSlot {
                identity: identity.clone(),
                ready: false,
                proposal: None,
                touch_bar: 0.0,
            });
            Role::Player
        } else {
            self.spectators.push(identity.clone());
            Role::Spectator
        };
        self.sinks.insert(user, sink);

        tracing::info!(
            room = %self.name,
            %user,
            ?role,
            players = self.players.len(),
            spectators = self.spectators.len(),
            "occupant joined"
        );

        self.broadcast(ServerEvent::RoomJoined {
            room: self.name.clone(),
            user: identity,
            role,
        });
        Ok(role)
    }

    fn handle_leave(&mut self, user: UserId) -> Result<Departure, RoomError> {
        let (identity, role) =
            if let Some(idx) = self.players.iter().position(|p| p.identity.id == user) {
                (self.players.remove(idx).identity, Role::Player)
            } else if let Some(idx) = self.spectators.iter().position(|s| s.id == user) {
                (self.spectators.remove(idx), Role::Spectator)
            } else {
                return Err(RoomError::NotAPlayer(user, self.name.clone()));
            };

        // The leaver still holds their sink, so they see their own exit.
        self.broadcast(ServerEvent::RoomExited {
            room: self.name.clone(),
            user: identity.clone(),
            role,
        });
        self.sinks.remove(&user);

        // Any occupant leaving mid-game tears the match down: the tick
        // stops before the play state is dropped, so no late tick can
        // touch it.
        if self.status.has_play_state() {
            self.abort_play(RoomStatus::Lobby);
        }

        tracing::info!(
            room = %self.name,
            %user,
            ?role,
            remaining = self.occupant_count(),
            "occupant left"
        );

        Ok(Departure {
            identity,
            role,
            remaining: self.occupant_count(),
        })
    }

    fn handle_ready(&mut self, user: UserId, options: GameOptions) -> Result<(), RoomError> {
        if !self.is_player(user) {
            return Err(RoomError::NotAPlayer(user, self.name.clone()));
        }

        // A finished room is recycled: the first ready of the next
        // round resets the lobby before being recorded.
        if self.status == RoomStatus::Finished {
            self.reset_round();
        }
        if self.status != RoomStatus::Lobby {
            return Err(RoomError::NotReady(self.name.clone(), self.status));
        }

        if let Some(slot) = self.players.iter_mut().find(|p| p.identity.id == user) {
            slot.ready = true;
            slot.proposal = Some(options);
        }

        let both_ready = self.players.len() == 2 && self.players.iter().all(|p| p.ready);
        if !both_ready {
            // Only the ready player hears that the room is waiting.
            self.send_to(user, ServerEvent::WaitNotice { room: self.name.clone() });
            return Ok(());
        }

        // Options merge rule: the room adopts slot 0's proposal.
        self.options = self.players[0]
            .proposal
            .clone()
            .unwrap_or_default();
        self.play = Some(PlayState::new(self.options.clone()));
        self.status = RoomStatus::Countdown;

        tracing::info!(room = %self.name, "both players ready, countdown");

        let players: Vec<Identity> =
            self.players.iter().map(|p| p.identity.clone()).collect();
        self.broadcast(ServerEvent::ReadyConfirmed {
            room: self.name.clone(),
            options: self.options.clone(),
            players,
        });
        if let Some(play) = &self.play {
            self.broadcast(ServerEvent::BallState {
                room: self.name.clone(),
                ball: play.snapshot(),
            });
        }
        Ok(())
    }

    fn handle_start(&mut self, user: UserId) -> Result<(), RoomError> {
        if !self.is_player(user) {
            return Err(RoomError::NotAPlayer(user, self.name.clone()));
        }
        if self.status != RoomStatus::Countdown {
            return Err(RoomError::NotReady(self.name.clone(), self.status));
        }
        let Some(play) = self.play.as_mut() else {
            return Err(RoomError::NotReady(self.name.clone(), self.status));
        };

        play.ball = Ball::serve(&play.board, &mut rand::rng());
        self.status = RoomStatus::Playing;
        self.scheduler.resume();

        tracing::info!(room = %self.name, "match started");

        let snapshot = play.snapshot();
        self.broadcast(ServerEvent::BallState {
            room: self.name.clone(),
            ball: snapshot,
        });
        Ok(())
    }

    fn handle_touch_bar(&mut self, user: UserId, offset: f32) -> Result<(), RoomError> {
        let board_height = self.options.board_height;
        let Some(slot) = self.players.iter_mut().find(|p| p.identity.id == user) else {
            return Err(RoomError::NotAPlayer(user, self.name.clone()));
        };
        slot.touch_bar = offset * board_height;

        self.broadcast(ServerEvent::PaddleUpdate {
            room: self.name.clone(),
            user,
            offset,
        });
        Ok(())
    }

    fn handle_tick(&mut self, tick: TickInfo) {
        // Fence: a tick scheduled before a pause is stale and must not
        // touch the play state.
        if tick.generation != self.scheduler.generation() || !self.status.is_playing() {
            return;
        }
        let Some(mut play) = self.play.take() else {
            return;
        };

        let left_y = self.players.first().map(|p| p.touch_bar).unwrap_or(0.0);
        let right_y = self.players.get(1).map(|p| p.touch_bar).unwrap_or(0.0);
        let events = sim::advance(&mut play, left_y, right_y, tick.dt.as_secs_f32());

        let mut terminal = false;
        for event in events {
            match event {
                SimEvent::Ball(ball) => {
                    self.broadcast(ServerEvent::BallState {
                        room: self.name.clone(),
                        ball,
                    });
                }
                SimEvent::Scored { scores } => {
                    self.broadcast(ServerEvent::ScoreUpdate {
                        room: self.name.clone(),
                        scores,
                    });
                }
                SimEvent::Won { winner, scores } => {
                    terminal = true;
                    self.finish_match(winner, scores);
                }
                SimEvent::Fault => {
                    terminal = true;
                    tracing::error!(room = %self.name, "inconsistent play state, aborting match");
                    self.abort_play(RoomStatus::Finished);
                    self.broadcast(ServerEvent::Error {
                        message: format!("match in room {} aborted", self.name),
                    });
                }
            }
        }

        if !terminal {
            self.play = Some(play);
        }
    }

    /// Ends the match: tick stopped, play state gone, one game-over
    /// broadcast. The room stays `Finished` until a player readies
    /// again or everyone leaves.
    fn finish_match(&mut self, winner: usize, scores: [u32; 2]) {
        self.scheduler.pause();
        self.status = RoomStatus::Finished;
        self.play = None;
        for slot in &mut self.players {
            slot.ready = false;
        }

        let winner_identity = self.players[winner].identity.clone();
        tracing::info!(
            room = %self.name,
            winner = %winner_identity.id,
            ?scores,
            "match finished"
        );
        self.broadcast(ServerEvent::GameOver {
            room: self.name.clone(),
            winner: winner_identity,
            scores,
        });
    }

    /// Tears the play state down without a winner.
    fn abort_play(&mut self, next: RoomStatus) {
        self.scheduler.pause();
        self.play = None;
        self.status = next;
        for slot in &mut self.players {
            slot.ready = false;
        }
    }

    /// Returns a finished room to a clean lobby for the next round.
    fn reset_round(&mut self) {
        self.status = RoomStatus::Lobby;
        self.play = None;
        for slot in &mut self.players {
            slot.ready = false;
            slot.proposal = None;
        }
    }

    fn is_player(&self, user: UserId) -> bool {
        self.players.iter().any(|p| p.identity.id == user)
    }

    fn occupant_count(&self) -> usize {
        self.players.len() + self.spectators.len()
    }

    fn summary(&self) -> RoomSummary {
        RoomSummary {
            name: self.name.clone(),
            status: self.status,
            players: self.players.iter().map(|p| p.identity.clone()).collect(),
            spectator_count: self.spectators.len(),
        }
    }

    /// Fans an event out to every occupant. Fire-and-forget: a closed
    /// sink never stalls the loop.
    fn broadcast(&self, event: ServerEvent) {
        for sink in self.sinks.values() {
            let _ = sink.send(event.clone());
        }
    }

    fn send_to(&self, user: UserId, event: ServerEvent) {
        if let Some(sink) = self.sinks.get(&user) {
            let _ = sink.send(event);
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room(
    name: RoomName,
    tick: TickConfig,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        name: name.clone(),
        status: RoomStatus::Lobby,
        players: Vec::new(),
        spectators: Vec::new(),
        sinks: HashMap::new(),
        options: GameOptions::default(),
        play: None,
        scheduler: TickScheduler::new(tick),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { name, sender: tx }
}
