//! Integration tests for the room registry and the room actor.

use std::time::Duration;

use rally_presence::EventSink;
use rally_protocol::{GameOptions, Identity, Role, RoomName, RoomStatus, ServerEvent, UserId};
use rally_room::{RoomError, RoomRegistry};
use rally_tick::TickConfig;
use tokio::sync::mpsc;
use tokio::time::timeout;

// =========================================================================
// Helpers
// =========================================================================

fn identity(id: u64) -> Identity {
    Identity::new(UserId(id), format!("user{id}"))
}

fn sink() -> (EventSink, mpsc::UnboundedReceiver<ServerEvent>) {
    mpsc::unbounded_channel()
}

fn registry() -> RoomRegistry {
    RoomRegistry::new(TickConfig::default())
}

/// Drains everything currently queued on a receiver.
fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn recv_or_timeout(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Option<ServerEvent> {
    timeout(Duration::from_secs(5), rx.recv()).await.ok().flatten()
}

// =========================================================================
// Registry tests
// =========================================================================

#[tokio::test]
async fn test_create_returns_unique_nine_digit_names() {
    let mut reg = registry();
    let r1 = reg.create();
    let r2 = reg.create();

    assert_ne!(r1, r2);
    assert_eq!(r1.as_str().len(), 9);
    assert!(r1.as_str().chars().all(|c| c.is_ascii_digit()));
    assert_eq!(reg.len(), 2);
}

#[tokio::test]
async fn test_join_assigns_player_slots_then_spectator() {
    let mut reg = registry();
    let room = reg.create();

    let (tx1, _rx1) = sink();
    let (tx2, _rx2) = sink();
    let (tx3, _rx3) = sink();

    assert_eq!(reg.join(&room, identity(1), tx1).await.unwrap(), Role::Player);
    assert_eq!(reg.join(&room, identity(2), tx2).await.unwrap(), Role::Player);
    assert_eq!(reg.join(&room, identity(3), tx3).await.unwrap(), Role::Spectator);
}

#[tokio::test]
async fn test_join_unknown_room_fails() {
    let mut reg = registry();
    let (tx, _rx) = sink();
    let result = reg.join(&RoomName::from("nope"), identity(1), tx).await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[tokio::test]
async fn test_one_room_per_user() {
    let mut reg = registry();
    let r1 = reg.create();
    let r2 = reg.create();

    let (tx1, _rx1) = sink();
    let (tx2, _rx2) = sink();
    reg.join(&r1, identity(1), tx1).await.unwrap();

    let result = reg.join(&r2, identity(1), tx2).await;
    match result {
        Err(RoomError::AlreadyMember(user, room)) => {
            assert_eq!(user, UserId(1));
            assert_eq!(room, r1);
        }
        other => panic!("expected AlreadyMember, got {other:?}"),
    }
    assert_eq!(reg.room_of(UserId(1)), Some(&r1));
}

#[tokio::test]
async fn test_last_leave_destroys_the_room() {
    let mut reg = registry();
    let room = reg.create();
    let (tx, _rx) = sink();
    reg.join(&room, identity(1), tx).await.unwrap();

    let departure = reg.leave(&room, UserId(1)).await.unwrap();

    assert_eq!(departure.remaining, 0);
    assert_eq!(departure.role, Role::Player);
    assert!(reg.is_empty());
    assert_eq!(reg.room_of(UserId(1)), None);
}

#[tokio::test]
async fn test_leave_when_not_a_member_fails() {
    let mut reg = registry();
    let room = reg.create();
    let (tx, _rx) = sink();
    reg.join(&room, identity(1), tx).await.unwrap();

    let result = reg.leave(&room, UserId(9)).await;
    assert!(matches!(result, Err(RoomError::NotAPlayer(UserId(9), _))));
    // The room survives: someone still occupies it.
    assert_eq!(reg.len(), 1);
}

#[tokio::test]
async fn test_list_reports_status_and_players() {
    let mut reg = registry();
    let room = reg.create();
    let (tx1, _rx1) = sink();
    let (tx2, _rx2) = sink();
    let (tx3, _rx3) = sink();
    reg.join(&room, identity(1), tx1).await.unwrap();
    reg.join(&room, identity(2), tx2).await.unwrap();
    reg.join(&room, identity(3), tx3).await.unwrap();

    let rooms = reg.list().await;

    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].name, room);
    assert_eq!(rooms[0].status, RoomStatus::Lobby);
    assert_eq!(rooms[0].players.len(), 2);
    assert_eq!(rooms[0].spectator_count, 1);
}

// =========================================================================
// Round state machine
// =========================================================================

#[tokio::test]
async fn test_join_and_exit_are_announced_to_everyone() {
    let mut reg = registry();
    let room = reg.create();
    let (tx1, mut rx1) = sink();
    let (tx2, mut rx2) = sink();
    reg.join(&room, identity(1), tx1).await.unwrap();
    reg.join(&room, identity(2), tx2).await.unwrap();

    // Player 1 saw both joins, player 2 only their own.
    assert_eq!(drain(&mut rx1).len(), 2);
    assert_eq!(drain(&mut rx2).len(), 1);

    reg.leave(&room, UserId(2)).await.unwrap();
    let events = drain(&mut rx1);
    assert!(matches!(
        events.as_slice(),
        [ServerEvent::RoomExited { user, role: Role::Player, .. }] if user.id == UserId(2)
    ));
    // The leaver sees their own exit before the sink is dropped.
    assert_eq!(drain(&mut rx2).len(), 1);
}

#[tokio::test]
async fn test_lone_ready_gets_a_wait_notice() {
    let mut reg = registry();
    let room = reg.create();
    let (tx1, mut rx1) = sink();
    let (tx2, mut rx2) = sink();
    reg.join(&room, identity(1), tx1).await.unwrap();
    reg.join(&room, identity(2), tx2).await.unwrap();
    drain(&mut rx1);
    drain(&mut rx2);

    let handle = reg.get(&room).unwrap();
    handle.ready(UserId(1), GameOptions::default()).await.unwrap();

    // Only the ready player hears the notice; the room stays in lobby.
    assert!(matches!(drain(&mut rx1).as_slice(), [ServerEvent::WaitNotice { .. }]));
    assert!(drain(&mut rx2).is_empty());
    assert_eq!(handle.summary().await.unwrap().status, RoomStatus::Lobby);
}

#[tokio::test]
async fn test_both_ready_adopts_first_slot_options_and_counts_down() {
    let mut reg = registry();
    let room = reg.create();
    let (tx1, mut rx1) = sink();
    let (tx2, mut rx2) = sink();
    reg.join(&room, identity(1), tx1).await.unwrap();
    reg.join(&room, identity(2), tx2).await.unwrap();
    drain(&mut rx1);
    drain(&mut rx2);

    let slot0 = GameOptions { winning_score: 7, ..GameOptions::default() };
    let slot1 = GameOptions { winning_score: 99, ..GameOptions::default() };
    let handle = reg.get(&room).unwrap();
    handle.ready(UserId(1), slot0.clone()).await.unwrap();
    drain(&mut rx1);
    handle.ready(UserId(2), slot1).await.unwrap();

    let events = drain(&mut rx2);
    match events.as_slice() {
        [ServerEvent::ReadyConfirmed { options, players, .. }, ServerEvent::BallState { ball, .. }] => {
            assert_eq!(options.winning_score, 7, "room adopts slot 0's proposal");
            assert_eq!(players.len(), 2);
            // Ball parked at center until the explicit start.
            assert_eq!((ball.vx, ball.vy), (0.0, 0.0));
            assert_eq!(ball.x, slot0.board_width / 2.0);
        }
        other => panic!("expected ReadyConfirmed + BallState, got {other:?}"),
    }
    assert_eq!(handle.summary().await.unwrap().status, RoomStatus::Countdown);
}

#[tokio::test]
async fn test_spectator_cannot_ready_or_touch() {
    let mut reg = registry();
    let room = reg.create();
    let (tx1, _rx1) = sink();
    let (tx2, _rx2) = sink();
    let (tx3, _rx3) = sink();
    reg.join(&room, identity(1), tx1).await.unwrap();
    reg.join(&room, identity(2), tx2).await.unwrap();
    reg.join(&room, identity(3), tx3).await.unwrap();

    let handle = reg.get(&room).unwrap();
    let ready = handle.ready(UserId(3), GameOptions::default()).await;
    assert!(matches!(ready, Err(RoomError::NotAPlayer(UserId(3), _))));

    let touch = handle.touch_bar(UserId(3), 0.5).await;
    assert!(matches!(touch, Err(RoomError::NotAPlayer(UserId(3), _))));
}

#[tokio::test]
async fn test_start_requires_countdown() {
    let mut reg = registry();
    let room = reg.create();
    let (tx1, _rx1) = sink();
    reg.join(&room, identity(1), tx1).await.unwrap();

    let handle = reg.get(&room).unwrap();
    let result = handle.start(UserId(1)).await;
    assert!(matches!(
        result,
        Err(RoomError::NotReady(_, RoomStatus::Lobby))
    ));
}

#[tokio::test]
async fn test_ready_during_countdown_is_rejected() {
    let mut reg = registry();
    let room = reg.create();
    let (tx1, _rx1) = sink();
    let (tx2, _rx2) = sink();
    reg.join(&room, identity(1), tx1).await.unwrap();
    reg.join(&room, identity(2), tx2).await.unwrap();

    let handle = reg.get(&room).unwrap();
    handle.ready(UserId(1), GameOptions::default()).await.unwrap();
    handle.ready(UserId(2), GameOptions::default()).await.unwrap();

    let again = handle.ready(UserId(1), GameOptions::default()).await;
    assert!(matches!(
        again,
        Err(RoomError::NotReady(_, RoomStatus::Countdown))
    ));
}

#[tokio::test]
async fn test_touch_bar_scales_and_broadcasts() {
    let mut reg = registry();
    let room = reg.create();
    let (tx1, _rx1) = sink();
    let (tx2, mut rx2) = sink();
    reg.join(&room, identity(1), tx1).await.unwrap();
    reg.join(&room, identity(2), tx2).await.unwrap();
    drain(&mut rx2);

    let handle = reg.get(&room).unwrap();
    handle.touch_bar(UserId(1), 0.25).await.unwrap();

    let events = drain(&mut rx2);
    assert!(matches!(
        events.as_slice(),
        [ServerEvent::PaddleUpdate { user: UserId(1), offset, .. }] if *offset == 0.25
    ));
}

#[tokio::test]
async fn test_leave_during_countdown_resets_to_lobby() {
    let mut reg = registry();
    let room = reg.create();
    let (tx1, mut rx1) = sink();
    let (tx2, _rx2) = sink();
    reg.join(&room, identity(1), tx1).await.unwrap();
    reg.join(&room, identity(2), tx2).await.unwrap();

    let handle = reg.get(&room).unwrap().clone();
    handle.ready(UserId(1), GameOptions::default()).await.unwrap();
    handle.ready(UserId(2), GameOptions::default()).await.unwrap();
    assert_eq!(handle.summary().await.unwrap().status, RoomStatus::Countdown);

    reg.leave(&room, UserId(2)).await.unwrap();
    drain(&mut rx1);

    assert_eq!(handle.summary().await.unwrap().status, RoomStatus::Lobby);

    // Readiness was cleared: a new partner plus one ready is not enough
    // to restart the countdown.
    let (tx3, _rx3) = sink();
    reg.join(&room, identity(3), tx3).await.unwrap();
    handle.ready(UserId(1), GameOptions::default()).await.unwrap();
    assert!(matches!(
        drain(&mut rx1).as_slice(),
        [ServerEvent::RoomJoined { .. }, ServerEvent::WaitNotice { .. }]
    ));
}

// =========================================================================
// Full match (virtual time)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_full_match_reaches_game_over_exactly_once() {
    let mut reg = registry();
    let room = reg.create();
    let (tx1, mut rx1) = sink();
    let (tx2, _rx2) = sink();
    reg.join(&room, identity(1), tx1).await.unwrap();
    reg.join(&room, identity(2), tx2).await.unwrap();

    let handle = reg.get(&room).unwrap().clone();
    let options = GameOptions { winning_score: 2, ..GameOptions::default() };
    handle.ready(UserId(1), options.clone()).await.unwrap();
    handle.ready(UserId(2), options).await.unwrap();

    // Park both paddles far off the board so every crossing scores.
    handle.touch_bar(UserId(1), 5.0).await.unwrap();
    handle.touch_bar(UserId(2), 5.0).await.unwrap();
    drain(&mut rx1);

    handle.start(UserId(1)).await.unwrap();
    assert_eq!(handle.summary().await.unwrap().status, RoomStatus::Playing);

    let mut score_updates = 0;
    let mut game_over = None;
    while let Some(event) = recv_or_timeout(&mut rx1).await {
        match event {
            ServerEvent::ScoreUpdate { .. } => score_updates += 1,
            ServerEvent::GameOver { winner, scores, .. } => {
                game_over = Some((winner, scores));
                break;
            }
            _ => {}
        }
    }

    let (winner, scores) = game_over.expect("match should finish");
    assert!(winner.id == UserId(1) || winner.id == UserId(2));
    assert_eq!(scores.iter().max(), Some(&2));
    assert_eq!(score_updates, 2, "one score update per goal");
    assert_eq!(handle.summary().await.unwrap().status, RoomStatus::Finished);

    // The tick loop stopped with the match: nothing arrives afterwards.
    assert!(recv_or_timeout(&mut rx1).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_finished_room_recycles_into_a_new_round() {
    let mut reg = registry();
    let room = reg.create();
    let (tx1, mut rx1) = sink();
    let (tx2, _rx2) = sink();
    reg.join(&room, identity(1), tx1).await.unwrap();
    reg.join(&room, identity(2), tx2).await.unwrap();

    let handle = reg.get(&room).unwrap().clone();
    let options = GameOptions { winning_score: 1, ..GameOptions::default() };
    handle.ready(UserId(1), options.clone()).await.unwrap();
    handle.ready(UserId(2), options).await.unwrap();
    handle.touch_bar(UserId(1), 5.0).await.unwrap();
    handle.touch_bar(UserId(2), 5.0).await.unwrap();
    handle.start(UserId(1)).await.unwrap();

    // Run until the single goal ends the match.
    loop {
        match recv_or_timeout(&mut rx1).await {
            Some(ServerEvent::GameOver { .. }) => break,
            Some(_) => {}
            None => panic!("match did not finish"),
        }
    }
    assert_eq!(handle.summary().await.unwrap().status, RoomStatus::Finished);

    // The first ready of the next round recycles the room to a lobby.
    drain(&mut rx1);
    handle.ready(UserId(1), GameOptions::default()).await.unwrap();
    assert!(matches!(
        drain(&mut rx1).as_slice(),
        [ServerEvent::WaitNotice { .. }]
    ));
    assert_eq!(handle.summary().await.unwrap().status, RoomStatus::Lobby);
}
