pub mod config;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crazytie_core::game_trait::{GameEvent, GameMetadata, GamePhase, Input, MiniGame};
use crazytie_core::mini_game_boilerplate;
use crazytie_core::player::Player;
use crazytie_core::round::RoundCounter;
use crazytie_core::scheduler::{Fired, Scheduler};
use crazytie_core::scoring::ScoreLedger;

use config::NerveConfig;

/// Phases of one Nerve round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NervePhase {
    Waiting,
    Countdown,
    /// Tension ramps up; any tap is a false start.
    Building,
    /// Taps are latched; the later one wins.
    Danger,
    Finished,
    MatchOver,
}

impl GamePhase for NervePhase {
    fn label(&self) -> &'static str {
        match self {
            NervePhase::Waiting => "waiting",
            NervePhase::Countdown => "countdown",
            NervePhase::Building => "building",
            NervePhase::Danger => "danger",
            NervePhase::Finished => "finished",
            NervePhase::MatchOver => "match_over",
        }
    }

    fn shows_countdown(&self) -> bool {
        matches!(self, NervePhase::Countdown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    IntroElapsed,
    CountdownTick,
    BuildingOver,
    DangerOver,
    MeterTick,
    RoundOver,
}

impl TimerEvent {
    fn belongs_to(self, phase: NervePhase) -> bool {
        match self {
            TimerEvent::IntroElapsed => phase == NervePhase::Waiting,
            TimerEvent::CountdownTick => phase == NervePhase::Countdown,
            TimerEvent::BuildingOver => phase == NervePhase::Building,
            TimerEvent::DangerOver => phase == NervePhase::Danger,
            TimerEvent::MeterTick => matches!(phase, NervePhase::Building | NervePhase::Danger),
            TimerEvent::RoundOver => phase == NervePhase::Finished,
        }
    }
}

/// A player's first tap in the danger window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Latch {
    /// Logical time of the tap.
    pub at: Duration,
    /// 0 for the first latch of the round, 1 for the second.
    pub order: u8,
}

/// Serializable game state published to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NerveState {
    pub phase: NervePhase,
    pub countdown: u8,
    pub scores: ScoreLedger,
    pub rounds: RoundCounter,
    /// 0.0 to 1.0 over `Building`; 1.0 in `Danger`.
    pub tension: f32,
    /// Seconds left in the danger window.
    pub danger_time_left: f32,
    /// Seat order `[P1, P2]`.
    pub latches: [Option<Latch>; 2],
    pub round_winner: Option<Player>,
    pub win_reason: Option<String>,
    pub match_over: bool,
}

impl NerveState {
    fn new(config: &NerveConfig) -> Self {
        Self {
            phase: NervePhase::Waiting,
            countdown: 0,
            scores: ScoreLedger::new(),
            rounds: RoundCounter::new(config.max_rounds),
            tension: 0.0,
            danger_time_left: config.danger_secs.max(0.0),
            latches: [None; 2],
            round_winner: None,
            win_reason: None,
            match_over: false,
        }
    }

    pub fn tapped(&self, player: Player) -> bool {
        self.latches[player.index()].is_some()
    }
}

/// The Nerve game: wait out the tension, then be the last to tap before
/// the danger window closes.
pub struct NerveGame {
    state: NerveState,
    timers: Scheduler<TimerEvent>,
    /// Logical time the current `Building` or `Danger` phase began.
    phase_since: Duration,
    started: bool,
    game_config: NerveConfig,
}

impl NerveGame {
    pub fn new() -> Self {
        Self::with_config(NerveConfig::load())
    }

    pub fn with_config(config: NerveConfig) -> Self {
        Self {
            state: NerveState::new(&config),
            timers: Scheduler::new(),
            phase_since: Duration::ZERO,
            started: false,
            game_config: config,
        }
    }

    pub fn state(&self) -> &NerveState {
        &self.state
    }

    pub fn config(&self) -> &NerveConfig {
        &self.game_config
    }

    /// A player tapped their half of the screen.
    pub fn player_acted(&mut self, player: Player) -> Vec<GameEvent> {
        let mut events = Vec::new();
        match self.state.phase {
            NervePhase::Building => self.false_start(player, &mut events),
            NervePhase::Danger => self.danger_tap(player, &mut events),
            phase => {
                tracing::trace!(game = "nerve", %player, phase = phase.label(), "Tap ignored");
            },
        }
        events
    }

    fn begin_round(&mut self, events: &mut Vec<GameEvent>) {
        self.timers.cancel_all();
        self.state.round_winner = None;
        self.state.win_reason = None;
        self.state.tension = 0.0;
        self.state.danger_time_left = self.game_config.danger_secs.max(0.0);
        self.state.latches = [None; 2];
        self.state.countdown = 0;
        self.set_phase(NervePhase::Waiting, events);
        self.timers
            .schedule(self.game_config.intro_delay(), TimerEvent::IntroElapsed);
    }

    fn on_timer(&mut self, fired: Fired<TimerEvent>, events: &mut Vec<GameEvent>) {
        if !fired.event.belongs_to(self.state.phase) {
            tracing::warn!(
                game = "nerve",
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
                self.set_phase(NervePhase::Countdown, events);
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
                self.enter_timed_phase(
                    NervePhase::Building,
                    self.game_config.building(),
                    TimerEvent::BuildingOver,
                    events,
                );
            },
            TimerEvent::MeterTick => self.refresh_meters(),
            TimerEvent::BuildingOver => {
                self.state.tension = 1.0;
                self.enter_timed_phase(
                    NervePhase::Danger,
                    self.game_config.danger(),
                    TimerEvent::DangerOver,
                    events,
                );
            },
            TimerEvent::DangerOver => {
                self.state.danger_time_left = 0.0;
                self.danger_timeout(events);
            },
            TimerEvent::RoundOver => self.after_round(events),
        }
    }

    /// Cancel the previous phase's timers, then arm the phase end ahead of
    /// the meter so the end fires first when both come due together.
    fn enter_timed_phase(
        &mut self,
        phase: NervePhase,
        length: Duration,
        end: TimerEvent,
        events: &mut Vec<GameEvent>,
    ) {
        self.timers.cancel_all();
        self.phase_since = self.timers.now();
        self.set_phase(phase, events);
        self.refresh_meters();
        self.timers.schedule(length, end);
        self.timers
            .schedule_repeating(self.game_config.meter_interval(), TimerEvent::MeterTick);
    }

    fn refresh_meters(&mut self) {
        let elapsed = self.timers.now().saturating_sub(self.phase_since);
        match self.state.phase {
            NervePhase::Building => {
                let total = self.game_config.building();
                self.state.tension = if total.is_zero() {
                    1.0
                } else {
                    (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
                };
            },
            NervePhase::Danger => {
                self.state.tension = 1.0;
                self.state.danger_time_left =
                    self.game_config.danger().saturating_sub(elapsed).as_secs_f32();
            },
            _ => {},
        }
    }

    fn false_start(&mut self, player: Player, events: &mut Vec<GameEvent>) {
        tracing::debug!(
            game = "nerve",
            round = self.state.rounds.current(),
            offender = %player,
            "False start"
        );
        self.award(player.opponent(), format!("{player} tapped too early!"), events);
    }

    fn danger_tap(&mut self, player: Player, events: &mut Vec<GameEvent>) {
        if self.state.tapped(player) {
            tracing::trace!(game = "nerve", %player, "Repeat tap ignored");
            return;
        }
        let latch = Latch {
            at: self.timers.now(),
            order: self.state.latches.iter().flatten().count() as u8,
        };
        self.state.latches[player.index()] = Some(latch);
        tracing::debug!(
            game = "nerve",
            round = self.state.rounds.current(),
            %player,
            at_ms = latch.at.as_millis() as u64,
            "Tap latched"
        );

        if let [Some(p1), Some(p2)] = self.state.latches {
            let winner = if (p1.at, p1.order) > (p2.at, p2.order) {
                Player::P1
            } else {
                Player::P2
            };
            self.award(winner, format!("{winner} held their nerve longer!"), events);
        }
    }

    fn danger_timeout(&mut self, events: &mut Vec<GameEvent>) {
        let in_time = Player::ALL.into_iter().find(|p| self.state.tapped(*p));
        match in_time {
            Some(player) => {
                let late = player.opponent();
                self.award(
                    player,
                    format!("{player} tapped in time, {late} was too late!"),
                    events,
                );
            },
            None => {
                self.state.round_winner = None;
                self.state.win_reason = Some("Both players were too late!".to_string());
                self.finish_round(events);
            },
        }
    }

    fn award(&mut self, winner: Player, reason: String, events: &mut Vec<GameEvent>) {
        let score = self.state.scores.add(winner, 1);
        self.state.round_winner = Some(winner);
        self.state.win_reason = Some(reason);
        events.push(GameEvent::ScoreUpdate {
            player: winner,
            score,
        });
        self.finish_round(events);
    }

    fn finish_round(&mut self, events: &mut Vec<GameEvent>) {
        self.timers.cancel_all();
        self.set_phase(NervePhase::Finished, events);
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
        self.set_phase(NervePhase::MatchOver, events);
        let winner = self.state.scores.leader();
        tracing::info!(
            game = "nerve",
            winner = ?winner,
            scores = ?self.state.scores.scores(),
            "Match over"
        );
        events.push(GameEvent::MatchOver {
            winner,
            scores: self.state.scores.scores(),
        });
    }

    fn set_phase(&mut self, phase: NervePhase, events: &mut Vec<GameEvent>) {
        self.state.phase = phase;
        tracing::debug!(
            game = "nerve",
            round = self.state.rounds.current(),
            phase = phase.label(),
            "Phase changed"
        );
        events.push(GameEvent::PhaseChanged {
            phase: phase.label().to_string(),
        });
    }
}

impl Default for NerveGame {
    fn default() -> Self {
        Self::with_config(NerveConfig::default())
    }
}

impl MiniGame for NerveGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Nerve Game".to_string(),
            tagline: "Steel nerves win".to_string(),
            max_rounds: self.state.rounds.max(),
            estimated_round_duration: Duration::from_secs(15),
        }
    }

    fn start(&mut self) {
        if self.started {
            tracing::debug!(game = "nerve", "start() while running ignored");
            return;
        }
        self.started = true;
        tracing::info!(game = "nerve", rounds = self.state.rounds.max(), "Match starting");
        let mut events = Vec::new();
        self.begin_round(&mut events);
    }

    fn reset(&mut self) {
        self.timers.cancel_all();
        self.state = NerveState::new(&self.game_config);
        self.started = false;
        self.start();
    }

    fn apply_input(&mut self, input: Input) -> Vec<GameEvent> {
        match input {
            Input::PlayerActed(player) => self.player_acted(player),
            other => {
                tracing::trace!(game = "nerve", input = ?other, "Input not used by this game");
                Vec::new()
            },
        }
    }

    mini_game_boilerplate!(state_type: NerveState);
}
