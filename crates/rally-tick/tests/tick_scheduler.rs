//! Integration tests for the tick scheduler.
//!
//! Uses `tokio::test(start_paused = true)` so `sleep_until` resolves
//! instantly as the test clock auto-advances.

use std::time::Duration;

use rally_tick::{TickConfig, TickScheduler};

fn config_30ms() -> TickConfig {
    TickConfig {
        period: Duration::from_millis(30),
        start_jitter_us: 0,
    }
}

// =========================================================================
// Config and initial state
// =========================================================================

#[test]
fn default_period_is_30ms() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.period, Duration::from_millis(30));
}

#[test]
fn scheduler_starts_paused() {
    let s = TickScheduler::new(config_30ms());
    assert!(s.is_paused());
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.generation(), 0);
    assert_eq!(s.period(), Duration::from_millis(30));
}

// =========================================================================
// Pause / resume / generation fencing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn paused_scheduler_never_fires() {
    let mut s = TickScheduler::new(config_30ms());
    let result =
        tokio::time::timeout(Duration::from_secs(5), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler should pend forever");
}

#[tokio::test(start_paused = true)]
async fn resume_starts_the_loop() {
    let mut s = TickScheduler::new(config_30ms());
    let generation = s.resume();
    assert_eq!(generation, 1);
    assert!(!s.is_paused());

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
    assert_eq!(info.generation, 1);
    assert_eq!(info.dt, Duration::from_millis(30));
    assert_eq!(info.ticks_skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn ticks_increment_monotonically() {
    let mut s = TickScheduler::new(config_30ms());
    s.resume();
    for expected in 1..=5 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
    }
    assert_eq!(s.tick_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn pause_stops_the_loop() {
    let mut s = TickScheduler::new(config_30ms());
    s.resume();
    let _ = s.wait_for_tick().await;

    s.pause();
    assert!(s.is_paused());
    let result =
        tokio::time::timeout(Duration::from_secs(5), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler should pend");
}

#[test]
fn pause_is_idempotent() {
    let mut s = TickScheduler::new(config_30ms());
    s.resume();
    s.pause();
    s.pause();
    assert!(s.is_paused());
}

#[tokio::test(start_paused = true)]
async fn each_resume_bumps_the_generation() {
    let mut s = TickScheduler::new(config_30ms());
    assert_eq!(s.resume(), 1);
    let first = s.wait_for_tick().await;
    assert_eq!(first.generation, 1);

    s.pause();
    assert_eq!(s.resume(), 2);
    let second = s.wait_for_tick().await;
    assert_eq!(second.generation, 2);

    // A tick from the old run is recognizable as stale.
    assert_ne!(first.generation, s.generation());
}

#[tokio::test(start_paused = true)]
async fn tick_count_survives_pause_cycles() {
    let mut s = TickScheduler::new(config_30ms());
    s.resume();
    let _ = s.wait_for_tick().await;
    let _ = s.wait_for_tick().await;
    s.pause();
    s.resume();
    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 3);
}

// =========================================================================
// dt is fixed, never wall-clock
// =========================================================================

#[tokio::test(start_paused = true)]
async fn dt_is_always_the_configured_period() {
    let mut s = TickScheduler::new(TickConfig {
        period: Duration::from_millis(30),
        start_jitter_us: 0,
    });
    s.resume();
    for _ in 0..3 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.dt, Duration::from_millis(30));
    }
}
