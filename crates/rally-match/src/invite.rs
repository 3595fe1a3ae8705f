//! Invite sessions: the three-step handshake that walks two users into
//! a private room.
//!
//! The flow is request, response, room relay. The host asks to play,
//! the guest accepts or declines, and on acceptance the host creates a
//! room through the ordinary path and relays its name through the same
//! session. Sessions are single-use; a decline or a completed relay
//! discards them.

use std::collections::HashMap;
use std::time::Instant;

use rally_protocol::{InviteId, UserId};
use rand::Rng;

use crate::MatchError;

/// One pending invite handshake.
#[derive(Debug, Clone)]
pub struct InviteSession {
    pub id: InviteId,
    pub host: UserId,
    pub guest: UserId,
    /// Set once the guest accepts; the room relay requires it.
    pub accepted: bool,
    pub created_at: Instant,
}

/// All open invite sessions, keyed by id.
///
/// Not internally synchronized; the gateway owns it behind one lock.
#[derive(Debug, Default)]
pub struct InviteBook {
    sessions: HashMap<InviteId, InviteSession>,
}

impl InviteBook {
    pub fn new() -> Self {
        Self { sessions: HashMap::new() }
    }

    /// Opens a session and returns its id. The caller is responsible
    /// for checking the guest is reachable first.
    pub fn create(&mut self, host: UserId, guest: UserId) -> InviteId {
        let id = generate_invite_id();
        tracing::info!(invite = %id, %host, %guest, "invite created");
        self.sessions.insert(
            id.clone(),
            InviteSession {
                id: id.clone(),
                host,
                guest,
                accepted: false,
                created_at: Instant::now(),
            },
        );
        id
    }

    /// Records the guest's answer and returns the host to notify.
    ///
    /// A decline discards the session; an acceptance keeps it open for
    /// the room relay.
    pub fn respond(
        &mut self,
        id: &InviteId,
        responder: UserId,
        accept: bool,
    ) -> Result<UserId, MatchError> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| MatchError::UnknownInvite(id.clone()))?;
        if session.guest != responder {
            return Err(MatchError::NotParticipant(responder, id.clone()));
        }

        let host = session.host;
        if accept {
            session.accepted = true;
            tracing::info!(invite = %id, guest = %responder, "invite accepted");
        } else {
            self.sessions.remove(id);
            tracing::info!(invite = %id, guest = %responder, "invite declined");
        }
        Ok(host)
    }

    /// Consumes an accepted session and returns the guest to relay the
    /// room name to. Only the host may relay.
    pub fn take_for_relay(
        &mut self,
        id: &InviteId,
        relayer: UserId,
    ) -> Result<UserId, MatchError> {
        let session = self
            .sessions
            .get(id)
            .ok_or_else(|| MatchError::UnknownInvite(id.clone()))?;
        if session.host != relayer {
            return Err(MatchError::NotParticipant(relayer, id.clone()));
        }
        if !session.accepted {
            return Err(MatchError::NotAccepted(id.clone()));
        }

        let guest = session.guest;
        let age_ms = session.created_at.elapsed().as_millis() as u64;
        self.sessions.remove(id);
        tracing::info!(invite = %id, %guest, age_ms, "invite room relayed, session closed");
        Ok(guest)
    }

    /// Discards every session a user participates in. Used when a
    /// connection drops so counterparts never answer into the void.
    pub fn purge_user(&mut self, user: UserId) -> Vec<InviteSession> {
        let ids: Vec<InviteId> = self
            .sessions
            .values()
            .filter(|s| s.host == user || s.guest == user)
            .map(|s| s.id.clone())
            .collect();
        let mut purged = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(session) = self.sessions.remove(&id) {
                tracing::info!(invite = %id, %user, "invite purged");
                purged.push(session);
            }
        }
        purged
    }

    pub fn get(&self, id: &InviteId) -> Option<&InviteSession> {
        self.sessions.get(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// 16 random bytes as a 32-character lowercase hex id.
fn generate_invite_id() -> InviteId {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    InviteId(bytes.iter().map(|b| format!("{b:02x}")).collect())
}
