pub mod config;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crazytie_core::game_trait::{GameEvent, GameMetadata, GamePhase, Input, MiniGame};
use crazytie_core::mini_game_boilerplate;
use crazytie_core::player::Player;
use crazytie_core::round::RoundCounter;
use crazytie_core::scheduler::{Fired, Scheduler};
use crazytie_core::scoring::ScoreLedger;

use config::TapBattleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapBattlePhase {
    Waiting,
    Countdown,
    Playing,
    Finished,
    MatchOver,
}

impl GamePhase for TapBattlePhase {
    fn label(&self) -> &'static str {
        match self {
            TapBattlePhase::Waiting => "waiting",
            TapBattlePhase::Countdown => "countdown",
            TapBattlePhase::Playing => "playing",
            TapBattlePhase::Finished => "finished",
            TapBattlePhase::MatchOver => "match_over",
        }
    }

    fn shows_countdown(&self) -> bool {
        matches!(self, TapBattlePhase::Countdown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    IntroElapsed,
    CountdownTick,
    ClockTick,
    BattleOver,
    EffectExpired(u32),
    ShowResults,
}

impl TimerEvent {
    fn belongs_to(self, phase: TapBattlePhase) -> bool {
        match self {
            TimerEvent::IntroElapsed => phase == TapBattlePhase::Waiting,
            TimerEvent::CountdownTick => phase == TapBattlePhase::Countdown,
            TimerEvent::ClockTick | TimerEvent::BattleOver | TimerEvent::EffectExpired(_) => {
                phase == TapBattlePhase::Playing
            },
            TimerEvent::ShowResults => phase == TapBattlePhase::Finished,
        }
    }
}

/// Cosmetic burst drawn where a tap landed. Purely visual; expires on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapEffect {
    pub id: u32,
    pub player: Player,
    pub x: f32,
    pub y: f32,
}

/// Serializable game state published to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapBattleState {
    pub phase: TapBattlePhase,
    pub countdown: u8,
    /// Tap counts.
    pub scores: ScoreLedger,
    pub rounds: RoundCounter,
    /// Whole seconds left on the battle clock.
    pub time_remaining: u32,
    pub round_winner: Option<Player>,
    pub win_reason: Option<String>,
    pub tap_effects: Vec<TapEffect>,
    pub match_over: bool,
}

impl TapBattleState {
    fn new(config: &TapBattleConfig) -> Self {
        Self {
            phase: TapBattlePhase::Waiting,
            countdown: 0,
            scores: ScoreLedger::new(),
            rounds: RoundCounter::new(1),
            time_remaining: config.battle_seconds(),
            round_winner: None,
            win_reason: None,
            tap_effects: Vec::new(),
            match_over: false,
        }
    }
}

/// The Tap Battle game: most taps in a fixed window wins.
pub struct TapBattle {
    state: TapBattleState,
    timers: Scheduler<TimerEvent>,
    rng: StdRng,
    next_effect_id: u32,
    started: bool,
    game_config: TapBattleConfig,
}

impl TapBattle {
    pub fn new() -> Self {
        Self::with_config(TapBattleConfig::load())
    }

    pub fn with_config(config: TapBattleConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Deterministic tap-effect placement for a given seed.
    pub fn with_seed(config: TapBattleConfig, seed: u64) -> Self {
        Self {
            state: TapBattleState::new(&config),
            timers: Scheduler::new(),
            rng: StdRng::seed_from_u64(seed),
            next_effect_id: 0,
            started: false,
            game_config: config,
        }
    }

    pub fn state(&self) -> &TapBattleState {
        &self.state
    }

    pub fn config(&self) -> &TapBattleConfig {
        &self.game_config
    }

    /// Count a tap while the battle is running.
    pub fn player_acted(&mut self, player: Player) -> Vec<GameEvent> {
        if self.state.phase != TapBattlePhase::Playing {
            tracing::trace!(
                game = "tap_battle",
                %player,
                phase = self.state.phase.label(),
                "Tap ignored"
            );
            return Vec::new();
        }

        let score = self.state.scores.add(player, 1);
        if self.game_config.tap_effects {
            self.spawn_effect(player);
        }
        vec![GameEvent::ScoreUpdate { player, score }]
    }

    fn spawn_effect(&mut self, player: Player) {
        let id = self.next_effect_id;
        self.next_effect_id = self.next_effect_id.wrapping_add(1);
        let x = sample(&mut self.rng, self.game_config.effect_x_range);
        let y = sample(&mut self.rng, self.game_config.effect_y_range);
        self.state.tap_effects.push(TapEffect { id, player, x, y });
        self.timers.schedule(
            self.game_config.tap_effect_lifetime(),
            TimerEvent::EffectExpired(id),
        );
    }

    fn on_timer(&mut self, fired: Fired<TimerEvent>, events: &mut Vec<GameEvent>) {
        if !fired.event.belongs_to(self.state.phase) {
            tracing::warn!(
                game = "tap_battle",
                timer = ?fired.event,
                phase = self.state.phase.label(),
                "Stale timer ignored"
            );
            self.timers.cancel(fired.handle);
            return;
        }

        match fired.event {
            TimerEvent::IntroElapsed => {
                self.state.countdown = self.game_config.countdown_from.max(1);
                self.set_phase(TapBattlePhase::Countdown, events);
                self.timers.schedule_repeating(
                    self.game_config.countdown_interval(),
                    TimerEvent::CountdownTick,
                );
            },
            TimerEvent::CountdownTick => {
                if self.state.countdown > 1 {
                    self.state.countdown -= 1;
                    return;
                }
                self.timers.cancel(fired.handle);
                self.begin_battle(events);
            },
            TimerEvent::ClockTick => {
                self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
            },
            TimerEvent::EffectExpired(id) => {
                self.state.tap_effects.retain(|e| e.id != id);
            },
            TimerEvent::BattleOver => self.end_battle(events),
            TimerEvent::ShowResults => {
                self.state.match_over = true;
                self.set_phase(TapBattlePhase::MatchOver, events);
                events.push(GameEvent::MatchOver {
                    winner: self.state.scores.leader(),
                    scores: self.state.scores.scores(),
                });
            },
        }
    }

    fn begin_battle(&mut self, events: &mut Vec<GameEvent>) {
        self.state.time_remaining = self.game_config.battle_seconds();
        self.set_phase(TapBattlePhase::Playing, events);
        // Armed before the clock tick so the end of the battle wins a tie on due time.
        self.timers
            .schedule(self.game_config.battle_duration(), TimerEvent::BattleOver);
        self.timers
            .schedule_repeating(Duration::from_secs(1), TimerEvent::ClockTick);
    }

    fn end_battle(&mut self, events: &mut Vec<GameEvent>) {
        self.timers.cancel_all();
        self.state.time_remaining = 0;
        self.state.tap_effects.clear();

        let winner = self.state.scores.leader();
        let [p1, p2] = self.state.scores.scores();
        self.state.round_winner = winner;
        self.state.win_reason = Some(match winner {
            Some(player) => format!("{player} wins! {p1} - {p2}"),
            None => format!("It's a tie! {p1} - {p2}"),
        });
        tracing::info!(game = "tap_battle", p1, p2, winner = ?winner, "Battle over");

        self.set_phase(TapBattlePhase::Finished, events);
        events.push(GameEvent::RoundComplete {
            round: self.state.rounds.current(),
            winner,
        });
        self.timers
            .schedule(self.game_config.results_delay(), TimerEvent::ShowResults);
    }

    fn set_phase(&mut self, phase: TapBattlePhase, events: &mut Vec<GameEvent>) {
        self.state.phase = phase;
        tracing::debug!(game = "tap_battle", phase = phase.label(), "Phase changed");
        events.push(GameEvent::PhaseChanged {
            phase: phase.label().to_string(),
        });
    }
}

impl Default for TapBattle {
    fn default() -> Self {
        Self::with_config(TapBattleConfig::default())
    }
}

/// Uniform sample from a config range given in either order.
fn sample(rng: &mut StdRng, (a, b): (f32, f32)) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo.is_finite() && hi.is_finite() {
        rng.random_range(lo..=hi)
    } else {
        0.0
    }
}

impl MiniGame for TapBattle {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Tap Battle".to_string(),
            tagline: "Tap your half faster".to_string(),
            max_rounds: 1,
            estimated_round_duration: self.game_config.battle_duration(),
        }
    }

    fn start(&mut self) {
        if self.started {
            tracing::debug!(game = "tap_battle", "start() while running ignored");
            return;
        }
        self.started = true;
        tracing::info!(game = "tap_battle", "Match starting");
        let mut events = Vec::new();
        self.timers.cancel_all();
        self.set_phase(TapBattlePhase::Waiting, &mut events);
        self.timers
            .schedule(self.game_config.intro_delay(), TimerEvent::IntroElapsed);
    }

    fn reset(&mut self) {
        self.timers.cancel_all();
        self.state = TapBattleState::new(&self.game_config);
        self.started = false;
        self.start();
    }

    fn apply_input(&mut self, input: Input) -> Vec<GameEvent> {
        match input {
            Input::PlayerActed(player) => self.player_acted(player),
            other => {
                tracing::trace!(game = "tap_battle", input = ?other, "Input not used by this game");
                Vec::new()
            },
        }
    }

    mini_game_boilerplate!(state_type: TapBattleState);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crazytie_core::test_helpers;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Started game advanced to the first instant of `Playing` (2 s intro + 3 s countdown).
    fn playing_game() -> TapBattle {
        let mut game = TapBattle::with_seed(TapBattleConfig::default(), 11);
        game.start();
        game.update(ms(5000));
        assert_eq!(game.state.phase, TapBattlePhase::Playing);
        game
    }

    fn tap_n(game: &mut TapBattle, player: Player, n: u32) {
        for _ in 0..n {
            game.player_acted(player);
        }
    }

    #[test]
    fn taps_count_only_while_playing() {
        let mut game = TapBattle::with_seed(TapBattleConfig::default(), 1);
        game.start();
        game.update(ms(3000));
        assert_eq!(game.state.phase, TapBattlePhase::Countdown);
        assert!(game.player_acted(Player::P1).is_empty());
        game.update(ms(2000));
        let events = game.player_acted(Player::P1);
        assert_eq!(
            events,
            vec![GameEvent::ScoreUpdate {
                player: Player::P1,
                score: 1
            }]
        );
    }

    #[test]
    fn higher_count_wins_at_expiry() {
        let mut game = playing_game();
        tap_n(&mut game, Player::P1, 12);
        tap_n(&mut game, Player::P2, 30);
        game.update(ms(10_000));
        assert_eq!(game.state.phase, TapBattlePhase::Finished);
        assert_eq!(game.state.round_winner, Some(Player::P2));
        assert_eq!(game.state.scores.scores(), [12, 30]);
    }

    #[test]
    fn equal_counts_tie() {
        let mut game = playing_game();
        tap_n(&mut game, Player::P1, 7);
        tap_n(&mut game, Player::P2, 7);
        game.update(ms(10_000));
        assert_eq!(game.state.round_winner, None);
        assert_eq!(game.state.win_reason.as_deref(), Some("It's a tie! 7 - 7"));
    }

    #[test]
    fn battle_lasts_exactly_the_configured_duration() {
        let mut game = playing_game();
        game.update(ms(9_999));
        assert_eq!(game.state.phase, TapBattlePhase::Playing);
        game.player_acted(Player::P1);
        game.update(ms(1));
        assert_eq!(game.state.phase, TapBattlePhase::Finished);
        assert_eq!(game.state.time_remaining, 0);
        assert!(game.player_acted(Player::P1).is_empty());
        assert_eq!(game.state.scores.scores(), [1, 0]);
    }

    #[test]
    fn clock_counts_down_each_second() {
        let mut game = playing_game();
        assert_eq!(game.state.time_remaining, 10);
        game.update(ms(1000));
        assert_eq!(game.state.time_remaining, 9);
        game.update(ms(3500));
        assert_eq!(game.state.time_remaining, 6);
    }

    #[test]
    fn tap_effects_expire() {
        let mut game = playing_game();
        game.player_acted(Player::P1);
        game.update(ms(200));
        game.player_acted(Player::P2);
        assert_eq!(game.state.tap_effects.len(), 2);
        let first = &game.state.tap_effects[0];
        assert!((50.0..=300.0).contains(&first.x));
        assert!((50.0..=200.0).contains(&first.y));

        game.update(ms(300));
        assert_eq!(game.state.tap_effects.len(), 1);
        assert_eq!(game.state.tap_effects[0].player, Player::P2);
        game.update(ms(200));
        assert!(game.state.tap_effects.is_empty());
    }

    #[test]
    fn tap_effects_can_be_disabled() {
        let config = TapBattleConfig {
            tap_effects: false,
            ..TapBattleConfig::default()
        };
        let mut game = TapBattle::with_seed(config, 2);
        game.start();
        game.update(ms(5000));
        game.player_acted(Player::P2);
        assert!(game.state.tap_effects.is_empty());
        assert_eq!(game.state.scores.score(Player::P2), 1);
    }

    #[test]
    fn match_over_after_results_delay() {
        let mut game = playing_game();
        game.player_acted(Player::P1);
        game.update(ms(10_000));
        game.update(ms(2_999));
        assert!(!game.state.match_over);
        let events = game.update(ms(1));
        assert!(game.state.match_over);
        assert!(events.contains(&GameEvent::MatchOver {
            winner: Some(Player::P1),
            scores: [1, 0]
        }));
        assert_eq!(game.view().match_winner, Some(Player::P1));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn winner_is_strictly_higher_count(c1 in 0u32..60, c2 in 0u32..60) {
                let mut game = playing_game();
                tap_n(&mut game, Player::P1, c1);
                tap_n(&mut game, Player::P2, c2);
                game.update(ms(10_000));
                let expected = if c1 > c2 {
                    Some(Player::P1)
                } else if c2 > c1 {
                    Some(Player::P2)
                } else {
                    None
                };
                prop_assert_eq!(game.state.round_winner, expected);
                prop_assert_eq!(game.state.scores.scores(), [c1 as i32, c2 as i32]);
            }
        }
    }

    // ================================================================
    // Mini-game Contract Tests
    // ================================================================

    #[test]
    fn contract_idle_until_started() {
        let mut game = TapBattle::with_seed(TapBattleConfig::default(), 1);
        test_helpers::contract_idle_until_started(&mut game);
    }

    #[test]
    fn contract_input_before_start_is_noop() {
        let mut game = TapBattle::with_seed(TapBattleConfig::default(), 1);
        test_helpers::contract_input_before_start_is_noop(&mut game);
    }

    #[test]
    fn contract_start_is_idempotent() {
        let mut game = TapBattle::with_seed(TapBattleConfig::default(), 1);
        test_helpers::contract_start_is_idempotent(&mut game);
    }

    #[test]
    fn contract_match_over_is_terminal() {
        let mut game = TapBattle::with_seed(TapBattleConfig::default(), 1);
        test_helpers::contract_match_over_is_terminal(&mut game, Duration::from_secs(30));
    }

    #[test]
    fn contract_reset_restarts_match() {
        let mut game = TapBattle::with_seed(TapBattleConfig::default(), 1);
        test_helpers::contract_reset_restarts_match(&mut game, Duration::from_secs(7));
    }

    #[test]
    fn contract_state_serializes() {
        let mut game = TapBattle::with_seed(TapBattleConfig::default(), 1);
        test_helpers::contract_state_serializes(&mut game);
    }

    #[test]
    fn reset_mid_battle_clears_counts_and_effects() {
        let mut game = playing_game();
        tap_n(&mut game, Player::P1, 3);
        game.reset();
        assert_eq!(game.state.scores.scores(), [0, 0]);
        assert!(game.state.tap_effects.is_empty());
        assert_eq!(game.state.phase, TapBattlePhase::Waiting);
        // The abandoned battle's end timer must not fire.
        game.update(ms(10_000));
        assert_eq!(game.state.phase, TapBattlePhase::Playing);
        assert!(game.state.round_winner.is_none());
    }
}
