pub mod config;
pub mod target;

use std::collections::HashMap;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crazytie_core::game_trait::{GameEvent, GameMetadata, GamePhase, Input, MiniGame, TargetId};
use crazytie_core::mini_game_boilerplate;
use crazytie_core::player::Player;
use crazytie_core::round::RoundCounter;
use crazytie_core::scheduler::{Fired, Scheduler, TimerHandle};
use crazytie_core::scoring::ScoreLedger;

use config::ReflexConfig;
use target::Target;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflexPhase {
    Waiting,
    Countdown,
    Playing,
    Finished,
    MatchOver,
}

impl GamePhase for ReflexPhase {
    fn label(&self) -> &'static str {
        match self {
            ReflexPhase::Waiting => "waiting",
            ReflexPhase::Countdown => "countdown",
            ReflexPhase::Playing => "playing",
            ReflexPhase::Finished => "finished",
            ReflexPhase::MatchOver => "match_over",
        }
    }

    fn shows_countdown(&self) -> bool {
        matches!(self, ReflexPhase::Countdown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    IntroElapsed,
    CountdownTick,
    ClockTick,
    SpawnTick,
    TargetExpired(TargetId),
    WaveOver,
    ShowResults,
}

impl TimerEvent {
    fn belongs_to(self, phase: ReflexPhase) -> bool {
        match self {
            TimerEvent::IntroElapsed => phase == ReflexPhase::Waiting,
            TimerEvent::CountdownTick => phase == ReflexPhase::Countdown,
            TimerEvent::ClockTick
            | TimerEvent::SpawnTick
            | TimerEvent::TargetExpired(_)
            | TimerEvent::WaveOver => phase == ReflexPhase::Playing,
            TimerEvent::ShowResults => phase == ReflexPhase::Finished,
        }
    }
}

/// How a target left the screen. Each target gets exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetOutcome {
    Hit,
    WrongTap,
    Expired,
}

/// Per-player tap accuracy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapTally {
    pub correct: u32,
    pub wrong: u32,
}

/// Serializable game state published to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflexState {
    pub phase: ReflexPhase,
    pub countdown: u8,
    /// Clamped at zero.
    pub scores: ScoreLedger,
    pub rounds: RoundCounter,
    pub time_remaining: u32,
    /// Live targets in spawn order.
    pub targets: Vec<Target>,
    pub spawned: u32,
    pub total_targets: u32,
    /// Seat order `[P1, P2]`.
    pub tallies: [TapTally; 2],
    pub expired: u32,
    /// Most recently resolved target, for hit and miss feedback.
    pub last_outcome: Option<(TargetId, TargetOutcome)>,
    pub round_winner: Option<Player>,
    pub win_reason: Option<String>,
    pub match_over: bool,
}

impl ReflexState {
    fn new(config: &ReflexConfig) -> Self {
        Self {
            phase: ReflexPhase::Waiting,
            countdown: 0,
            scores: ScoreLedger::clamped(),
            rounds: RoundCounter::new(1),
            time_remaining: config.game_seconds(),
            targets: Vec::new(),
            spawned: 0,
            total_targets: config.total_targets,
            tallies: [TapTally::default(); 2],
            expired: 0,
            last_outcome: None,
            round_winner: None,
            win_reason: None,
            match_over: false,
        }
    }

    pub fn tally(&self, player: Player) -> TapTally {
        self.tallies[player.index()]
    }
}

/// The Reflex game: targets pop up for one player or the other; hit yours
/// before they vanish.
pub struct ReflexGame {
    state: ReflexState,
    timers: Scheduler<TimerEvent>,
    /// Expiry timer of each live target.
    expiry: HashMap<TargetId, TimerHandle>,
    rng: StdRng,
    started: bool,
    game_config: ReflexConfig,
}

impl ReflexGame {
    pub fn new() -> Self {
        Self::with_config(ReflexConfig::load())
    }

    pub fn with_config(config: ReflexConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Deterministic target owners, positions and sizes for a given seed.
    pub fn with_seed(config: ReflexConfig, seed: u64) -> Self {
        Self {
            state: ReflexState::new(&config),
            timers: Scheduler::new(),
            expiry: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
            started: false,
            game_config: config,
        }
    }

    pub fn state(&self) -> &ReflexState {
        &self.state
    }

    pub fn config(&self) -> &ReflexConfig {
        &self.game_config
    }

    /// A target was tapped. Scored as a correct tap for the target's owner.
    pub fn target_hit(&mut self, id: TargetId) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let Some(target) = self.consume(id) else {
            return events;
        };
        let owner = target.owner;
        let score = self
            .state
            .scores
            .add(owner, self.game_config.correct_points);
        self.state.tallies[owner.index()].correct += 1;
        self.state.last_outcome = Some((id, TargetOutcome::Hit));
        tracing::trace!(game = "reflex", target = id, %owner, score, "Target hit");
        events.push(GameEvent::ScoreUpdate {
            player: owner,
            score,
        });
        self.end_if_exhausted(&mut events);
        events
    }

    /// `tapper` hit a target that is not theirs: penalty, clamped at zero.
    pub fn wrong_tap(&mut self, id: TargetId, tapper: Player) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.consume(id).is_none() {
            return events;
        }
        let score = self
            .state
            .scores
            .add(tapper, -self.game_config.wrong_penalty);
        self.state.tallies[tapper.index()].wrong += 1;
        self.state.last_outcome = Some((id, TargetOutcome::WrongTap));
        tracing::trace!(game = "reflex", target = id, %tapper, score, "Wrong tap");
        events.push(GameEvent::ScoreUpdate {
            player: tapper,
            score,
        });
        self.end_if_exhausted(&mut events);
        events
    }

    /// A raw screen tap. Hits the oldest live target under the point, if
    /// any, as a correct tap.
    pub fn screen_tapped(&mut self, x: f32, y: f32) -> Vec<GameEvent> {
        if self.state.phase != ReflexPhase::Playing {
            return Vec::new();
        }
        match target::hit_test(&self.state.targets, x, y) {
            Some(id) => self.target_hit(id),
            None => Vec::new(),
        }
    }

    /// Remove a live target that was tapped, disarming its expiry. `None`
    /// when the target already expired, was already tapped, or play is over.
    fn consume(&mut self, id: TargetId) -> Option<Target> {
        if self.state.phase != ReflexPhase::Playing {
            tracing::trace!(
                game = "reflex",
                target = id,
                phase = self.state.phase.label(),
                "Tap ignored"
            );
            return None;
        }
        let Some(pos) = self.state.targets.iter().position(|t| t.id == id) else {
            tracing::trace!(game = "reflex", target = id, "Tap on a target that is gone");
            return None;
        };
        if let Some(handle) = self.expiry.remove(&id) {
            self.timers.cancel(handle);
        }
        Some(self.state.targets.remove(pos))
    }

    fn on_timer(&mut self, fired: Fired<TimerEvent>, events: &mut Vec<GameEvent>) {
        if !fired.event.belongs_to(self.state.phase) {
            tracing::warn!(
                game = "reflex",
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
                self.set_phase(ReflexPhase::Countdown, events);
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
                self.begin_wave(events);
            },
            TimerEvent::ClockTick => {
                self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
            },
            TimerEvent::SpawnTick => {
                if self.state.spawned < self.state.total_targets {
                    self.spawn();
                }
                if self.state.spawned >= self.state.total_targets {
                    self.timers.cancel(fired.handle);
                    self.end_if_exhausted(events);
                }
            },
            TimerEvent::TargetExpired(id) => {
                self.expiry.remove(&id);
                let before = self.state.targets.len();
                self.state.targets.retain(|t| t.id != id);
                if self.state.targets.len() < before {
                    self.state.expired += 1;
                    self.state.last_outcome = Some((id, TargetOutcome::Expired));
                    tracing::trace!(game = "reflex", target = id, "Target expired");
                }
                self.end_if_exhausted(events);
            },
            TimerEvent::WaveOver => self.end_wave(events),
            TimerEvent::ShowResults => {
                self.state.match_over = true;
                self.set_phase(ReflexPhase::MatchOver, events);
                events.push(GameEvent::MatchOver {
                    winner: self.state.scores.leader(),
                    scores: self.state.scores.scores(),
                });
            },
        }
    }

    fn begin_wave(&mut self, events: &mut Vec<GameEvent>) {
        self.state.time_remaining = self.game_config.game_seconds();
        self.set_phase(ReflexPhase::Playing, events);
        self.timers
            .schedule(self.game_config.game_duration(), TimerEvent::WaveOver);
        self.timers
            .schedule_repeating(Duration::from_secs(1), TimerEvent::ClockTick);
        self.timers
            .schedule_repeating(self.game_config.spawn_interval(), TimerEvent::SpawnTick);
        // A zero-target wave has nothing to wait for.
        self.end_if_exhausted(events);
    }

    fn spawn(&mut self) {
        let id = self.state.spawned;
        let target = target::spawn_target(&mut self.rng, id, self.timers.now(), &self.game_config);
        tracing::trace!(game = "reflex", target = id, owner = %target.owner, "Target spawned");
        self.state.targets.push(target);
        self.state.spawned += 1;
        let handle = self.timers.schedule(
            self.game_config.target_lifetime(),
            TimerEvent::TargetExpired(id),
        );
        self.expiry.insert(id, handle);
    }

    fn end_if_exhausted(&mut self, events: &mut Vec<GameEvent>) {
        if self.state.phase == ReflexPhase::Playing
            && self.state.spawned >= self.state.total_targets
            && self.state.targets.is_empty()
        {
            tracing::debug!(game = "reflex", "All targets resolved, ending early");
            self.end_wave(events);
        }
    }

    fn end_wave(&mut self, events: &mut Vec<GameEvent>) {
        self.timers.cancel_all();
        self.expiry.clear();
        self.state.targets.clear();
        self.state.time_remaining = 0;

        let winner = self.state.scores.leader();
        let [p1, p2] = self.state.scores.scores();
        self.state.round_winner = winner;
        self.state.win_reason = Some(match winner {
            Some(player) => format!("{player} wins! {p1} - {p2}"),
            None => format!("It's a tie! {p1} - {p2}"),
        });
        tracing::info!(
            game = "reflex",
            p1,
            p2,
            spawned = self.state.spawned,
            expired = self.state.expired,
            winner = ?winner,
            "Wave over"
        );

        self.set_phase(ReflexPhase::Finished, events);
        events.push(GameEvent::RoundComplete {
            round: self.state.rounds.current(),
            winner,
        });
        self.timers
            .schedule(self.game_config.results_delay(), TimerEvent::ShowResults);
    }

    fn set_phase(&mut self, phase: ReflexPhase, events: &mut Vec<GameEvent>) {
        self.state.phase = phase;
        tracing::debug!(game = "reflex", phase = phase.label(), "Phase changed");
        events.push(GameEvent::PhaseChanged {
            phase: phase.label().to_string(),
        });
    }
}

impl Default for ReflexGame {
    fn default() -> Self {
        Self::with_config(ReflexConfig::default())
    }
}

impl MiniGame for ReflexGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Reflex Game".to_string(),
            tagline: "Tap your color only".to_string(),
            max_rounds: 1,
            estimated_round_duration: self.game_config.game_duration(),
        }
    }

    fn start(&mut self) {
        if self.started {
            tracing::debug!(game = "reflex", "start() while running ignored");
            return;
        }
        self.started = true;
        tracing::info!(
            game = "reflex",
            targets = self.game_config.total_targets,
            "Match starting"
        );
        let mut events = Vec::new();
        self.timers.cancel_all();
        self.set_phase(ReflexPhase::Waiting, &mut events);
        self.timers
            .schedule(self.game_config.intro_delay(), TimerEvent::IntroElapsed);
    }

    fn reset(&mut self) {
        self.timers.cancel_all();
        self.expiry.clear();
        self.state = ReflexState::new(&self.game_config);
        self.started = false;
        self.start();
    }

    fn apply_input(&mut self, input: Input) -> Vec<GameEvent> {
        match input {
            Input::TargetHit(id) => self.target_hit(id),
            Input::WrongTap { target, player } => self.wrong_tap(target, player),
            Input::ScreenTap { x, y } => self.screen_tapped(x, y),
            Input::PlayerActed(player) => {
                tracing::trace!(game = "reflex", %player, "Reflex taps land on targets, ignoring");
                Vec::new()
            },
        }
    }

    mini_game_boilerplate!(state_type: ReflexState);
}
