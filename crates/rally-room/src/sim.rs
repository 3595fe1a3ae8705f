//! One simulation step of a running match.
//!
//! The room actor owns the timing and the broadcasting; this module owns
//! the rules. [`advance`] is deterministic — given the same play state
//! and paddle offsets it produces the same events — which is what makes
//! the scoring and game-over behavior unit-testable without a clock.

use rally_physics::{Ball, Board, Side, Vec2};
use rally_protocol::{BallSnapshot, GameOptions};

/// Player slot indexes: slot 0 defends the left goal, slot 1 the right.
pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;

/// The mutable state of a match. Exists only while the room is in
/// `Countdown` or `Playing`.
#[derive(Debug, Clone)]
pub struct PlayState {
    pub board: Board,
    pub options: GameOptions,
    pub ball: Ball,
    pub scores: [u32; 2],
}

impl PlayState {
    /// Fresh state for a countdown: ball parked at the board center,
    /// scores zeroed. The ball starts moving on the explicit start
    /// command, not here.
    pub fn new(options: GameOptions) -> Self {
        let board = Board::new(
            options.board_width,
            options.board_height,
            options.paddle_width,
            options.paddle_height,
        );
        Self {
            board,
            ball: Ball { pos: board.center(), vel: Vec2::default() },
            scores: [0, 0],
            options,
        }
    }

    pub fn snapshot(&self) -> BallSnapshot {
        BallSnapshot {
            x: self.ball.pos.x,
            y: self.ball.pos.y,
            vx: self.ball.vel.x,
            vy: self.ball.vel.y,
        }
    }

    /// Which slot defends the given side.
    pub fn slot_of(side: Side) -> usize {
        match side {
            Side::Left => LEFT,
            Side::Right => RIGHT,
        }
    }
}

/// What a single tick produced, in broadcast order.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A goal was scored; `scores` is the updated pair.
    Scored { scores: [u32; 2] },
    /// The winning slot reached the configured score. Terminal: the
    /// caller must stop ticking and discard the play state.
    Won { winner: usize, scores: [u32; 2] },
    /// The ball changed course or moved.
    Ball(BallSnapshot),
    /// The play state is numerically broken (non-finite coordinates).
    /// Terminal for this room's simulation only.
    Fault,
}

/// Advances the match by one fixed step.
///
/// Step order: goal check and scoring, game-over check, paddle
/// collision, wall collision, integration. Collision steps emit a ball
/// event only when they changed the ball; integration always moves a
/// live ball and emits the result.
///
/// `left_y` / `right_y` are the paddle center offsets in board
/// coordinates (client-reported, trusted as-is).
pub fn advance(play: &mut PlayState, left_y: f32, right_y: f32, dt: f32) -> Vec<SimEvent> {
    let mut events = Vec::new();

    if !(play.ball.pos.x.is_finite() && play.ball.pos.y.is_finite()) {
        return vec![SimEvent::Fault];
    }

    // A ball past a goal line scores for the defender's opponent and
    // re-centers toward the conceding side (the loser receives the
    // serve; vertical speed resets downward so rallies stay symmetric).
    if let Some(crossed) = play.ball.goal(&play.board) {
        let scorer = PlayState::slot_of(crossed.opponent());
        play.scores[scorer] += 1;
        events.push(SimEvent::Scored { scores: play.scores });

        if play.scores[scorer] >= play.options.winning_score {
            events.push(SimEvent::Won { winner: scorer, scores: play.scores });
            return events;
        }

        let vx = match crossed {
            Side::Left => -rally_physics::SERVE_VX,
            Side::Right => rally_physics::SERVE_VX,
        };
        play.ball = Ball {
            pos: play.board.center(),
            vel: Vec2::new(vx, rally_physics::SERVE_VY),
        };
        events.push(SimEvent::Ball(play.snapshot()));
        return events;
    }

    if play.ball.bounce_paddles(&play.board, left_y, right_y) {
        events.push(SimEvent::Ball(play.snapshot()));
    }

    if play.ball.bounce_walls(&play.board) {
        events.push(SimEvent::Ball(play.snapshot()));
    }

    play.ball.integrate(dt);
    events.push(SimEvent::Ball(play.snapshot()));

    events
}
