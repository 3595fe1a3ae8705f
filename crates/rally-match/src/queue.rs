//! The random-match queue: strict FIFO pairing of waiting players.

use std::collections::VecDeque;
use std::time::Instant;

use rally_protocol::UserId;

/// One waiting player.
#[derive(Debug, Clone)]
struct QueueEntry {
    user: UserId,
    enqueued_at: Instant,
}

/// Outcome of an enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Nobody was waiting; the caller is now queued.
    Waiting,
    /// The caller was already queued. Idempotent, no state change.
    AlreadyWaiting,
    /// The oldest waiter was dequeued and should be paired with the
    /// caller (the caller is never queued in this case).
    Paired(UserId),
}

/// FIFO matchmaking queue.
///
/// O(1) enqueue and dequeue at the ends; the duplicate scan is linear
/// but the queue holds at most the players waiting right now.
/// Not internally synchronized; the gateway owns it behind one lock.
#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: VecDeque<QueueEntry>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self { waiting: VecDeque::new() }
    }

    /// Queues a player, or pairs them with the oldest waiter.
    pub fn enqueue(&mut self, user: UserId) -> Enqueued {
        if self.contains(user) {
            tracing::debug!(%user, "already in match queue");
            return Enqueued::AlreadyWaiting;
        }
        if let Some(partner) = self.waiting.pop_front() {
            tracing::info!(
                %user,
                partner = %partner.user,
                waited_ms = partner.enqueued_at.elapsed().as_millis() as u64,
                "matched pair"
            );
            return Enqueued::Paired(partner.user);
        }
        tracing::info!(%user, "queued for random match");
        self.waiting.push_back(QueueEntry { user, enqueued_at: Instant::now() });
        Enqueued::Waiting
    }

    /// Removes a player from the queue. Returns whether they were in it.
    pub fn cancel(&mut self, user: UserId) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|entry| entry.user != user);
        let removed = self.waiting.len() != before;
        if removed {
            tracing::info!(%user, "left match queue");
        }
        removed
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.waiting.iter().any(|entry| entry.user == user)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}
