use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::player::Player;

/// Identifier of a Reflex target, unique within one match.
pub type TargetId = u32;

/// Core trait that all Crazy Tie mini-games implement.
///
/// A controller owns its phase, scores and timers exclusively. The host
/// drives the logical clock through `update` and forwards taps through
/// `apply_input`; both run on the same thread, so inputs and timer firings
/// are always totally ordered.
pub trait MiniGame: Send {
    /// Catalog metadata for the game selector.
    fn metadata(&self) -> GameMetadata;

    /// Begin a match from idle. No-op if a match is already running.
    fn start(&mut self);

    /// Cancel every pending timer, clear scores and rounds, then start over.
    fn reset(&mut self);

    /// Deliver one input at the current logical time. Inputs that are not
    /// legal in the current phase, or not meaningful for this game, are
    /// ignored.
    fn apply_input(&mut self, input: Input) -> Vec<GameEvent>;

    /// Advance the logical clock by `dt`, firing every timer that comes due.
    fn update(&mut self, dt: Duration) -> Vec<GameEvent>;

    /// Current logical time since the controller was created.
    fn clock(&self) -> Duration;

    /// Read-only snapshot of everything the presentation layer needs.
    fn view(&self) -> MatchView;

    /// Full game-specific state (targets, tension, tap effects) as MessagePack.
    fn serialize_state(&self) -> Vec<u8>;

    /// Whether the match has finished.
    fn is_match_over(&self) -> bool;

    /// Suggested clock step rate in Hz for hosts driving `update` in real time.
    fn tick_rate(&self) -> f32 {
        60.0
    }
}

/// Per-game phase enums expose a label and whether the countdown is showing.
pub trait GamePhase {
    fn label(&self) -> &'static str;

    fn shows_countdown(&self) -> bool;
}

/// Game metadata for the selection screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub tagline: String,
    pub max_rounds: u8,
    pub estimated_round_duration: Duration,
}

/// Commands from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Input {
    /// A player tapped their half of the screen.
    PlayerActed(Player),
    /// A Reflex target was tapped; scored for the target's owner.
    TargetHit(TargetId),
    /// A Reflex target was tapped by the wrong player.
    WrongTap { target: TargetId, player: Player },
    /// A raw Reflex screen tap, hit-tested against live targets.
    ScreenTap { x: f32, y: f32 },
}

/// Events emitted while handling inputs and timers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged { phase: String },
    ScoreUpdate { player: Player, score: i32 },
    RoundComplete { round: u8, winner: Option<Player> },
    MatchOver { winner: Option<Player>, scores: [i32; 2] },
}

/// Snapshot common to every game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchView {
    pub phase: String,
    pub countdown: Option<u8>,
    /// Seat order `[P1, P2]`.
    pub scores: [i32; 2],
    pub round: u8,
    pub max_rounds: u8,
    pub round_winner: Option<Player>,
    pub win_reason: Option<String>,
    pub match_over: bool,
    /// `None` while running, and also on a tied final score.
    pub match_winner: Option<Player>,
}

/// Generates the `MiniGame` methods that are identical across all games:
/// `update`, `clock`, `view`, `serialize_state`, `is_match_over`.
///
/// Requires the implementing struct to have `state: $StateType` and
/// `timers: Scheduler<_>` fields and an
/// `on_timer(&mut self, Fired<_>, &mut Vec<GameEvent>)` method. `$StateType`
/// needs `phase` (a `GamePhase`), `countdown: u8`, `scores: ScoreLedger`,
/// `rounds: RoundCounter`, `round_winner`, `win_reason` and `match_over`.
#[macro_export]
macro_rules! mini_game_boilerplate {
    (state_type: $StateType:ty) => {
        fn update(
            &mut self,
            dt: ::std::time::Duration,
        ) -> Vec<$crate::game_trait::GameEvent> {
            let until = self.timers.now().saturating_add(dt);
            let mut events = Vec::new();
            while let Some(fired) = self.timers.pop_due(until) {
                self.on_timer(fired, &mut events);
            }
            self.timers.advance_to(until);
            events
        }

        fn clock(&self) -> ::std::time::Duration {
            self.timers.now()
        }

        fn view(&self) -> $crate::game_trait::MatchView {
            use $crate::game_trait::GamePhase as _;
            let state: &$StateType = &self.state;
            $crate::game_trait::MatchView {
                phase: state.phase.label().to_string(),
                countdown: state.phase.shows_countdown().then_some(state.countdown),
                scores: state.scores.scores(),
                round: state.rounds.current(),
                max_rounds: state.rounds.max(),
                round_winner: state.round_winner,
                win_reason: state.win_reason.clone(),
                match_over: state.match_over,
                match_winner: if state.match_over {
                    state.scores.leader()
                } else {
                    None
                },
            }
        }

        fn serialize_state(&self) -> Vec<u8> {
            rmp_serde::to_vec(&self.state).expect("game state serialization must succeed")
        }

        fn is_match_over(&self) -> bool {
            self.state.match_over
        }
    };
}
