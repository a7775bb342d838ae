pub mod config;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crazytie_core::game_trait::{GameEvent, GameMetadata, GamePhase, Input, MiniGame};
use crazytie_core::mini_game_boilerplate;
use crazytie_core::player::Player;
use crazytie_core::round::RoundCounter;
use crazytie_core::scheduler::{Fired, Scheduler, duration_from_secs};
use crazytie_core::scoring::ScoreLedger;

use config::ReactionConfig;

/// Phases of one Reaction round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionPhase {
    Waiting,
    Countdown,
    /// Random wait before the signal; tapping now is a false start.
    Arming,
    /// Signal is showing; first tap wins.
    Live,
    Finished,
    FalseStart,
    MatchOver,
}

impl GamePhase for ReactionPhase {
    fn label(&self) -> &'static str {
        match self {
            ReactionPhase::Waiting => "waiting",
            ReactionPhase::Countdown => "countdown",
            ReactionPhase::Arming => "arming",
            ReactionPhase::Live => "live",
            ReactionPhase::Finished => "finished",
            ReactionPhase::FalseStart => "false_start",
            ReactionPhase::MatchOver => "match_over",
        }
    }

    fn shows_countdown(&self) -> bool {
        matches!(self, ReactionPhase::Countdown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    IntroElapsed,
    CountdownTick,
    SignalGo,
    LiveTimeout,
    RoundOver,
}

impl TimerEvent {
    /// Whether this timer may fire in `phase`. A mismatch means the timer
    /// outlived its phase.
    fn belongs_to(self, phase: ReactionPhase) -> bool {
        match self {
            TimerEvent::IntroElapsed => phase == ReactionPhase::Waiting,
            TimerEvent::CountdownTick => phase == ReactionPhase::Countdown,
            TimerEvent::SignalGo => phase == ReactionPhase::Arming,
            TimerEvent::LiveTimeout => phase == ReactionPhase::Live,
            TimerEvent::RoundOver => {
                matches!(phase, ReactionPhase::Finished | ReactionPhase::FalseStart)
            },
        }
    }
}

/// Serializable game state published to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionState {
    pub phase: ReactionPhase,
    pub countdown: u8,
    pub scores: ScoreLedger,
    pub rounds: RoundCounter,
    pub round_winner: Option<Player>,
    pub win_reason: Option<String>,
    /// Reaction time of the round winner, when won on the signal.
    pub winning_time: Option<Duration>,
    /// Logical time the signal went live this round.
    pub live_since: Option<Duration>,
    pub match_over: bool,
}

impl ReactionState {
    fn new(max_rounds: u8) -> Self {
        Self {
            phase: ReactionPhase::Waiting,
            countdown: 0,
            scores: ScoreLedger::new(),
            rounds: RoundCounter::new(max_rounds),
            round_winner: None,
            win_reason: None,
            winning_time: None,
            live_since: None,
            match_over: false,
        }
    }
}

/// The Quick Reaction game: first to tap after the signal wins the round.
pub struct ReactionGame {
    state: ReactionState,
    timers: Scheduler<TimerEvent>,
    rng: StdRng,
    started: bool,
    game_config: ReactionConfig,
}

impl ReactionGame {
    pub fn new() -> Self {
        Self::with_config(ReactionConfig::load())
    }

    pub fn with_config(config: ReactionConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Deterministic arming delays for a given seed.
    pub fn with_seed(config: ReactionConfig, seed: u64) -> Self {
        Self {
            state: ReactionState::new(config.max_rounds),
            timers: Scheduler::new(),
            rng: StdRng::seed_from_u64(seed),
            started: false,
            game_config: config,
        }
    }

    pub fn state(&self) -> &ReactionState {
        &self.state
    }

    pub fn config(&self) -> &ReactionConfig {
        &self.game_config
    }

    /// A player tapped their half of the screen.
    pub fn player_acted(&mut self, player: Player) -> Vec<GameEvent> {
        let mut events = Vec::new();
        match self.state.phase {
            ReactionPhase::Arming => self.false_start(player, &mut events),
            ReactionPhase::Waiting | ReactionPhase::Countdown
                if self.started && self.game_config.false_start_before_arming =>
            {
                self.false_start(player, &mut events)
            },
            ReactionPhase::Live => self.signal_tap(player, &mut events),
            phase => {
                tracing::trace!(game = "reaction", %player, phase = phase.label(), "Tap ignored");
            },
        }
        events
    }

    fn begin_round(&mut self, events: &mut Vec<GameEvent>) {
        self.timers.cancel_all();
        self.state.round_winner = None;
        self.state.win_reason = None;
        self.state.winning_time = None;
        self.state.live_since = None;
        self.state.countdown = 0;
        self.set_phase(ReactionPhase::Waiting, events);
        self.timers
            .schedule(self.game_config.intro_delay(), TimerEvent::IntroElapsed);
    }

    fn on_timer(&mut self, fired: Fired<TimerEvent>, events: &mut Vec<GameEvent>) {
        if !fired.event.belongs_to(self.state.phase) {
            tracing::warn!(
                game = "reaction",
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
                self.set_phase(ReactionPhase::Countdown, events);
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
                self.set_phase(ReactionPhase::Arming, events);
                let (lo, hi) = self.game_config.arming_range();
                let delay = self.rng.random_range(lo..=hi);
                tracing::debug!(game = "reaction", delay_secs = delay, "Arming");
                self.timers
                    .schedule(duration_from_secs(delay), TimerEvent::SignalGo);
            },
            TimerEvent::SignalGo => {
                self.state.live_since = Some(self.timers.now());
                self.set_phase(ReactionPhase::Live, events);
                if let Some(timeout) = self.game_config.live_timeout() {
                    self.timers.schedule(timeout, TimerEvent::LiveTimeout);
                }
            },
            TimerEvent::LiveTimeout => {
                self.state.win_reason = Some("Nobody tapped!".to_string());
                self.finish_round(ReactionPhase::Finished, events);
            },
            TimerEvent::RoundOver => self.after_round(events),
        }
    }

    fn false_start(&mut self, player: Player, events: &mut Vec<GameEvent>) {
        let winner = player.opponent();
        let score = self.state.scores.add(winner, 1);
        tracing::debug!(
            game = "reaction",
            round = self.state.rounds.current(),
            offender = %player,
            "False start"
        );
        self.state.round_winner = Some(winner);
        self.state.win_reason = Some(format!("{player} tapped too early!"));
        events.push(GameEvent::ScoreUpdate {
            player: winner,
            score,
        });
        self.finish_round(ReactionPhase::FalseStart, events);
    }

    fn signal_tap(&mut self, player: Player, events: &mut Vec<GameEvent>) {
        let now = self.timers.now();
        let reaction = now.saturating_sub(self.state.live_since.unwrap_or(now));
        let score = self.state.scores.add(player, 1);
        tracing::debug!(
            game = "reaction",
            round = self.state.rounds.current(),
            %player,
            reaction_ms = reaction.as_millis() as u64,
            "Signal tap"
        );
        self.state.round_winner = Some(player);
        self.state.winning_time = Some(reaction);
        self.state.win_reason = Some(format!(
            "{player} reacted in {:.3}s",
            reaction.as_secs_f64()
        ));
        events.push(GameEvent::ScoreUpdate { player, score });
        self.finish_round(ReactionPhase::Finished, events);
    }

    /// Lock the round: drop every pending timer, then arm the result delay.
    fn finish_round(&mut self, phase: ReactionPhase, events: &mut Vec<GameEvent>) {
        self.timers.cancel_all();
        self.set_phase(phase, events);
        events.push(GameEvent::RoundComplete {
            round: self.state.rounds.current(),
            winner: self.state.round_winner,
        });
        self.timers
            .schedule(self.game_config.round_end_delay(), TimerEvent::RoundOver);
    }

    fn after_round(&mut self, events: &mut Vec<GameEvent>) {
        if self.state.rounds.advance() {
            self.begin_round(events);
            return;
        }
        self.timers.cancel_all();
        self.state.match_over = true;
        self.set_phase(ReactionPhase::MatchOver, events);
        let winner = self.state.scores.leader();
        tracing::info!(
            game = "reaction",
            winner = ?winner,
            scores = ?self.state.scores.scores(),
            "Match over"
        );
        events.push(GameEvent::MatchOver {
            winner,
            scores: self.state.scores.scores(),
        });
    }

    fn set_phase(&mut self, phase: ReactionPhase, events: &mut Vec<GameEvent>) {
        self.state.phase = phase;
        tracing::debug!(
            game = "reaction",
            round = self.state.rounds.current(),
            phase = phase.label(),
            "Phase changed"
        );
        events.push(GameEvent::PhaseChanged {
            phase: phase.label().to_string(),
        });
    }
}

impl Default for ReactionGame {
    fn default() -> Self {
        Self::with_config(ReactionConfig::default())
    }
}

impl MiniGame for ReactionGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Quick Reaction".to_string(),
            tagline: "First to tap wins".to_string(),
            max_rounds: self.state.rounds.max(),
            estimated_round_duration: Duration::from_secs(10),
        }
    }

    fn start(&mut self) {
        if self.started {
            tracing::debug!(game = "reaction", "start() while running ignored");
            return;
        }
        self.started = true;
        tracing::info!(game = "reaction", rounds = self.state.rounds.max(), "Match starting");
        let mut events = Vec::new();
        self.begin_round(&mut events);
    }

    fn reset(&mut self) {
        self.timers.cancel_all();
        self.state = ReactionState::new(self.game_config.max_rounds);
        self.started = false;
        self.start();
    }

    fn apply_input(&mut self, input: Input) -> Vec<GameEvent> {
        match input {
            Input::PlayerActed(player) => self.player_acted(player),
            other => {
                tracing::trace!(game = "reaction", input = ?other, "Input not used by this game");
                Vec::new()
            },
        }
    }

    mini_game_boilerplate!(state_type: ReactionState);
}
