//! Session loop tests on a paused tokio clock: inputs are timestamped by the
//! loop's wall clock and timers fire as virtual time advances.

#[allow(dead_code)]
mod common;

use std::time::Duration;

use crazytie_core::game_registry::GameId;
use crazytie_core::game_trait::{GameEvent, Input};
use crazytie_core::player::Player;
use crazytie_host::game_loop::{SessionBroadcast, SessionCommand, SessionConfig};

use common::{TestSession, wait_for_end};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test(start_paused = true)]
async fn first_broadcast_is_the_opening_view() {
    let mut session = TestSession::game(GameId::Reaction);
    session.settle().await;
    match session.seen.first() {
        Some(SessionBroadcast::View(view)) => {
            assert_eq!(view.phase, "waiting");
            assert_eq!(view.round, 1);
            assert_eq!(view.max_rounds, 5);
        },
        other => panic!("expected opening view, got {other:?}"),
    }
    assert!(session.stop().await);
}

#[tokio::test(start_paused = true)]
async fn nerve_later_tap_wins_through_the_session() {
    let mut session = TestSession::game(GameId::Nerve);
    // 2 s intro, 3 s countdown, 4 s building: danger opens at 9 s.
    session.wait(secs(10)).await;
    assert_eq!(session.latest_view().phase, "danger");

    session.tap(Player::P1);
    session.wait(ms(800)).await;
    session.tap(Player::P2);
    session.settle().await;

    let view = session.latest_view();
    assert_eq!(view.phase, "finished");
    assert_eq!(view.round_winner, Some(Player::P2));
    assert_eq!(view.scores, [0, 1]);
    assert_eq!(
        view.win_reason.as_deref(),
        Some("PLAYER 2 held their nerve longer!")
    );
    assert!(session.events().contains(&GameEvent::ScoreUpdate {
        player: Player::P2,
        score: 1
    }));
    assert!(session.stop().await);
}

#[tokio::test(start_paused = true)]
async fn tap_battle_counts_taps_and_ends_on_time() {
    let config = SessionConfig {
        seed: Some(9),
        ..SessionConfig::new(GameId::TapBattle)
    };
    let mut session = TestSession::spawn(config);
    session.wait(ms(5100)).await;
    assert_eq!(session.latest_view().phase, "playing");

    for _ in 0..3 {
        session.tap(Player::P1);
    }
    session.tap(Player::P2);
    session.settle().await;
    assert_eq!(session.latest_view().scores, [3, 1]);

    session.wait(secs(10)).await;
    let view = session.latest_view();
    assert_eq!(view.phase, "finished");
    assert_eq!(view.round_winner, Some(Player::P1));

    session.wait(secs(3)).await;
    let view = session.latest_view();
    assert!(view.match_over);
    assert_eq!(view.match_winner, Some(Player::P1));
    assert!(session.stop().await);
}

#[tokio::test(start_paused = true)]
async fn manual_start_waits_for_command() {
    let config = SessionConfig {
        auto_start: false,
        ..SessionConfig::new(GameId::Nerve)
    };
    let mut session = TestSession::spawn(config);
    session.wait(secs(5)).await;
    assert_eq!(session.latest_view().phase, "waiting");
    assert!(session.events().is_empty());

    session.send(SessionCommand::Start);
    session.wait(ms(2500)).await;
    let view = session.latest_view();
    assert_eq!(view.phase, "countdown");
    assert_eq!(view.countdown, Some(3));
    assert!(session.stop().await);
}

#[tokio::test(start_paused = true)]
async fn reset_mid_round_starts_over() {
    let mut session = TestSession::game(GameId::Nerve);
    session.wait(secs(6)).await;
    assert_eq!(session.latest_view().phase, "building");

    session.tap(Player::P1);
    session.settle().await;
    assert_eq!(session.latest_view().scores, [0, 1]);

    session.send(SessionCommand::Reset);
    session.settle().await;
    let view = session.latest_view();
    assert_eq!(view.phase, "waiting");
    assert_eq!(view.scores, [0, 0]);
    assert_eq!(view.round, 1);

    // The abandoned round's result delay must not move the new match on.
    session.wait(secs(3)).await;
    assert_eq!(session.latest_view().round, 1);
    assert!(session.stop().await);
}

#[tokio::test(start_paused = true)]
async fn published_state_decodes_as_game_state() {
    let config = SessionConfig {
        publish_state: true,
        ..SessionConfig::new(GameId::Nerve)
    };
    let mut session = TestSession::spawn(config);
    session.wait(secs(7)).await;

    let bytes = session
        .seen
        .iter()
        .rev()
        .find_map(|m| match m {
            SessionBroadcast::EncodedState(b) => Some(b.clone()),
            _ => None,
        })
        .expect("state published");
    let state: crazytie_nerve::NerveState = rmp_serde::from_slice(&bytes).unwrap();
    assert_eq!(state.phase, crazytie_nerve::NervePhase::Building);
    assert!(state.tension > 0.3 && state.tension < 0.7, "tension {}", state.tension);
    assert!(session.stop().await);
}

#[tokio::test(start_paused = true)]
async fn irrelevant_inputs_are_ignored() {
    let mut session = TestSession::game(GameId::Nerve);
    session.wait(secs(10)).await;
    session.send(SessionCommand::Input(Input::TargetHit(3)));
    session.send(SessionCommand::Input(Input::ScreenTap { x: 10.0, y: 10.0 }));
    session.settle().await;
    let view = session.latest_view();
    assert_eq!(view.phase, "danger");
    assert_eq!(view.scores, [0, 0]);
    assert!(session.stop().await);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_sender_ends_the_session() {
    let TestSession {
        cmd_tx,
        mut rx,
        handle,
        ..
    } = TestSession::game(GameId::Reflex);
    drop(cmd_tx);
    assert!(wait_for_end(&mut rx).await);
    handle.await.unwrap();
}
