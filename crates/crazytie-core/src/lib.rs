pub mod config;
pub mod game_registry;
pub mod game_trait;
pub mod player;
pub mod round;
pub mod scheduler;
pub mod scoring;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::time::Duration;

    use crate::game_trait::{GameEvent, Input, MiniGame};
    use crate::player::Player;

    /// Advance the game in fixed `step`s for `total`, collecting every event.
    pub fn run_for(game: &mut dyn MiniGame, total: Duration, step: Duration) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            let dt = step.min(total - elapsed);
            events.extend(game.update(dt));
            elapsed += dt;
        }
        events
    }

    /// Advance until the view's phase label equals `phase`, at most `limit`.
    /// Returns the events seen on the way.
    pub fn run_until_phase(
        game: &mut dyn MiniGame,
        phase: &str,
        limit: Duration,
    ) -> Vec<GameEvent> {
        let step = Duration::from_millis(10);
        let mut events = Vec::new();
        let mut elapsed = Duration::ZERO;
        while game.view().phase != phase {
            assert!(
                elapsed < limit,
                "phase '{phase}' not reached within {limit:?} (stuck in '{}')",
                game.view().phase
            );
            events.extend(game.update(step));
            elapsed += step;
        }
        events
    }

    /// Tap for `player`.
    pub fn tap(game: &mut dyn MiniGame, player: Player) -> Vec<GameEvent> {
        game.apply_input(Input::PlayerActed(player))
    }

    // ================================================================
    // Mini-game Contract Tests
    // ================================================================
    // Every MiniGame implementation must pass these. Game crates call them
    // from their own #[cfg(test)] modules with a fresh instance.

    /// Before `start()`, time passes without any phase change or event.
    pub fn contract_idle_until_started(game: &mut dyn MiniGame) {
        let before = game.view();
        let events = run_for(game, Duration::from_secs(60), Duration::from_millis(100));
        assert!(events.is_empty(), "idle game emitted {events:?}");
        assert_eq!(before, game.view(), "idle game changed its view");
    }

    /// Taps before `start()` change nothing.
    pub fn contract_input_before_start_is_noop(game: &mut dyn MiniGame) {
        let before = game.view();
        for player in Player::ALL {
            assert!(tap(game, player).is_empty());
        }
        assert_eq!(before, game.view());
    }

    /// `start()` while running does not restart or re-arm anything.
    pub fn contract_start_is_idempotent(game: &mut dyn MiniGame) {
        game.start();
        run_for(game, Duration::from_millis(2500), Duration::from_millis(100));
        let before = game.view();
        game.start();
        assert_eq!(before, game.view(), "second start() must be a no-op");
    }

    /// With nobody tapping, the match reaches its end within `limit`.
    pub fn contract_match_eventually_ends(game: &mut dyn MiniGame, limit: Duration) {
        game.start();
        let step = Duration::from_millis(50);
        let mut elapsed = Duration::ZERO;
        while !game.is_match_over() {
            assert!(elapsed < limit, "match not over after {limit:?}");
            game.update(step);
            elapsed += step;
        }
        let view = game.view();
        assert!(view.match_over);
        assert_eq!(view.round, view.max_rounds, "match ended before the final round");
    }

    /// Once the match is over, nothing changes: no timers fire, taps are ignored.
    pub fn contract_match_over_is_terminal(game: &mut dyn MiniGame, limit: Duration) {
        contract_match_eventually_ends(game, limit);
        let before = game.view();
        for player in Player::ALL {
            tap(game, player);
        }
        let events = run_for(game, Duration::from_secs(30), Duration::from_millis(100));
        assert!(events.is_empty(), "finished match emitted {events:?}");
        assert_eq!(before, game.view());
    }

    /// `reset()` mid-match returns to round 1 with zero scores and a fresh
    /// intro.
    pub fn contract_reset_restarts_match(game: &mut dyn MiniGame, play_for: Duration) {
        game.start();
        run_for(game, play_for, Duration::from_millis(50));
        game.reset();
        let view = game.view();
        assert_eq!(view.scores, [0, 0]);
        assert_eq!(view.round, 1);
        assert!(!view.match_over);
        assert_eq!(view.round_winner, None);
        assert_eq!(view.phase, "waiting");
    }

    /// `serialize_state()` produces MessagePack bytes after start.
    pub fn contract_state_serializes(game: &mut dyn MiniGame) {
        game.start();
        let state = game.serialize_state();
        assert!(
            !state.is_empty(),
            "serialize_state() must return non-empty bytes"
        );
    }
}
