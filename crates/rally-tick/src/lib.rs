//! Fixed-period tick scheduler for Rally room simulations.
//!
//! One scheduler per room actor. The scheduler is born paused — a room
//! in the lobby has no simulation — and is resumed when play starts.
//! Each resume begins a new *generation*; a tick carries the generation
//! it was scheduled under, so the room can discard a tick that raced
//! with a pause (the fencing required when a match ends or a player
//! walks out mid-rally).
//!
//! # Integration
//!
//! The scheduler sits inside the room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         tick = scheduler.wait_for_tick() => {
//!             if tick.generation == scheduler.generation() {
//!                 // advance the simulation by tick.dt
//!             }
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, warn};

/// Configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Fixed simulation period. Rally rooms run at 30 ms.
    pub period: Duration,
    /// Random jitter (0–max µs) added when a loop (re)starts, to
    /// desynchronize rooms resumed at the same instant.
    pub start_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(30),
            start_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// A config with the given period and default jitter.
    pub fn with_period(period: Duration) -> Self {
        Self { period, ..Self::default() }
    }
}

/// Information about a fired tick, returned by
/// [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, Copy)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1, never resets).
    pub tick: u64,
    /// The run generation this tick was scheduled under. Stale if it no
    /// longer matches [`TickScheduler::generation`].
    pub generation: u64,
    /// Fixed delta time — always the configured period, never wall-clock
    /// elapsed, so the simulation stays deterministic.
    pub dt: Duration,
    /// How many periods were skipped because the loop fell behind.
    pub ticks_skipped: u64,
}

/// Fixed-period tick scheduler with pause/resume and generation fencing.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    generation: u64,
    /// `None` while paused; the next deadline otherwise.
    next_tick: Option<TokioInstant>,
}

impl TickScheduler {
    /// Creates a scheduler in the paused state.
    pub fn new(config: TickConfig) -> Self {
        debug!(period_ms = config.period.as_millis() as u64, "tick scheduler created (paused)");
        Self {
            config,
            tick_count: 0,
            generation: 0,
            next_tick: None,
        }
    }

    /// Waits until the next tick is due and returns its [`TickInfo`].
    ///
    /// While paused this future pends forever; inside `tokio::select!`
    /// the other branches still run.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let Some(next) = self.next_tick else {
            std::future::pending::<()>().await;
            unreachable!()
        };
        let period = self.config.period;

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;

        // If the loop fell behind by whole periods, skip them and
        // reschedule from now. A catch-up burst would only make an
        // overloaded host fall further behind.
        let late_by = now.saturating_duration_since(next);
        let ticks_skipped = if period.is_zero() {
            0
        } else {
            late_by.as_nanos() as u64 / period.as_nanos() as u64
        };
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun — skipping ahead"
            );
            self.next_tick = Some(now + period);
        } else {
            self.next_tick = Some(next + period);
        }

        TickInfo {
            tick: self.tick_count,
            generation: self.generation,
            dt: period,
            ticks_skipped,
        }
    }

    /// Starts (or restarts) the tick loop and returns the new generation.
    ///
    /// Ticks already in flight from a previous run carry the old
    /// generation and must be discarded by the caller.
    pub fn resume(&mut self) -> u64 {
        self.generation += 1;
        let jitter = if self.config.start_jitter_us > 0 {
            let us = rand::rng().random_range(0..self.config.start_jitter_us);
            Duration::from_micros(us)
        } else {
            Duration::ZERO
        };
        self.next_tick = Some(TokioInstant::now() + self.config.period + jitter);
        debug!(generation = self.generation, "tick loop resumed");
        self.generation
    }

    /// Stops the tick loop. Idempotent; `wait_for_tick` pends until the
    /// next [`resume`](Self::resume).
    pub fn pause(&mut self) {
        if self.next_tick.take().is_some() {
            debug!(tick = self.tick_count, "tick loop paused");
        }
    }

    /// Whether the loop is currently paused.
    pub fn is_paused(&self) -> bool {
        self.next_tick.is_none()
    }

    /// The current run generation. Incremented by every resume.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total ticks fired across all generations.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The fixed tick period.
    pub fn period(&self) -> Duration {
        self.config.period
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(TickConfig::default())
    }
}
