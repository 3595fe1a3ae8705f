//! Deterministic ball-and-paddle physics for Rally.
//!
//! Pure functions over plain values: given a ball, a board, and paddle
//! offsets, each step either mutates the ball and reports that it did,
//! or leaves it untouched. No clocks, no shared state — the room actor
//! decides when to call these and what to broadcast.
//!
//! Coordinates: origin at the top-left of the board, x grows rightward,
//! y grows downward. The left paddle guards the `x = 0` goal line, the
//! right paddle guards `x = board_width`.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Serve speed along the x axis, board units per second.
pub const SERVE_VX: f32 = 240.0;

/// Serve speed along the y axis, board units per second.
pub const SERVE_VY: f32 = 120.0;

/// Vertical velocity added per unit of normalized paddle impact offset.
///
/// A ball striking a paddle at its extreme edge (offset ±1) picks up
/// ±`DEFLECT_GAIN` vertical speed; a center hit (offset 0) reflects
/// horizontally with `vy` unchanged.
pub const DEFLECT_GAIN: f32 = 120.0;

/// A vector in 2D board space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The playing field and paddle dimensions for one match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub width: f32,
    pub height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
}

impl Board {
    pub fn new(width: f32, height: f32, paddle_width: f32, paddle_height: f32) -> Self {
        Self { width, height, paddle_width, paddle_height }
    }

    /// The board center, where every rally starts.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// The side of the board a player defends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// The ball: position and velocity in board units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Ball {
    /// Places the ball at the board center with a pseudo-random diagonal
    /// direction at fixed speed. Both axis signs are drawn independently,
    /// so the serve goes toward one of the four corners.
    pub fn serve(board: &Board, rng: &mut impl Rng) -> Self {
        let vx = if rng.random_range(0..2) == 0 { SERVE_VX } else { -SERVE_VX };
        let vy = if rng.random_range(0..2) == 0 { SERVE_VY } else { -SERVE_VY };
        Self {
            pos: board.center(),
            vel: Vec2::new(vx, vy),
        }
    }

    /// Returns the goal line the ball has crossed, if any.
    ///
    /// Crossing the left goal line means the right player scored, and
    /// vice versa — callers credit `side.opponent()`.
    pub fn goal(&self, board: &Board) -> Option<Side> {
        if self.pos.x <= 0.0 {
            Some(Side::Left)
        } else if self.pos.x >= board.width {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Resolves collision against both paddle planes.
    ///
    /// `left_y` / `right_y` are the paddle center offsets in board
    /// coordinates. A collision happens when the ball, moving toward a
    /// goal line, reaches that paddle's plane within half a paddle height
    /// of the paddle center. On impact the horizontal velocity reflects
    /// and the vertical velocity shifts linearly with the normalized
    /// impact offset (see [`DEFLECT_GAIN`]).
    ///
    /// Returns `true` if the ball was deflected.
    pub fn bounce_paddles(&mut self, board: &Board, left_y: f32, right_y: f32) -> bool {
        let half = board.paddle_height / 2.0;
        let left_plane = board.paddle_width;
        let right_plane = board.width - board.paddle_width;

        if self.vel.x < 0.0 && self.pos.x <= left_plane {
            let miss = self.pos.y - left_y;
            if miss.abs() <= half {
                self.vel.x = -self.vel.x;
                self.vel.y += (miss / half).clamp(-1.0, 1.0) * DEFLECT_GAIN;
                self.pos.x = left_plane;
                return true;
            }
        }

        if self.vel.x > 0.0 && self.pos.x >= right_plane {
            let miss = self.pos.y - right_y;
            if miss.abs() <= half {
                self.vel.x = -self.vel.x;
                self.vel.y += (miss / half).clamp(-1.0, 1.0) * DEFLECT_GAIN;
                self.pos.x = right_plane;
                return true;
            }
        }

        false
    }

    /// Inverts vertical velocity when the ball reaches the top or bottom
    /// bound, clamping it back inside the board.
    ///
    /// Returns `true` if the ball bounced.
    pub fn bounce_walls(&mut self, board: &Board) -> bool {
        if self.pos.y <= 0.0 && self.vel.y < 0.0 {
            self.pos.y = 0.0;
            self.vel.y = -self.vel.y;
            true
        } else if self.pos.y >= board.height && self.vel.y > 0.0 {
            self.pos.y = board.height;
            self.vel.y = -self.vel.y;
            true
        } else {
            false
        }
    }

    /// Advances the ball by `dt` seconds: `pos += vel * dt`.
    pub fn integrate(&mut self, dt: f32) {
        self.pos.x += self.vel.x * dt;
        self.pos.y += self.vel.y * dt;
    }
}
