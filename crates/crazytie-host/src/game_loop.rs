use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crazytie_core::game_registry::GameId;
use crazytie_core::game_trait::{GameEvent, Input, MatchView, MiniGame};

/// Highest tick rate a session will run at.
pub const MAX_TICK_RATE_HZ: f32 = 1000.0;

/// Commands sent from the input adapter to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Input(Input),
    Start,
    Reset,
    Stop,
}

/// Broadcasts sent from the session loop to the presentation side.
#[derive(Debug, Clone)]
pub enum SessionBroadcast {
    /// Sent whenever the view differs from the last one published.
    View(MatchView),
    /// Events produced by one input or one clock step.
    Events(Vec<GameEvent>),
    /// MessagePack game state, when `publish_state` is on.
    EncodedState(Bytes),
    /// The loop has exited.
    Ended,
}

/// Factory function type for creating game instances. Takes an optional
/// RNG seed.
type GameFactory = fn(Option<u64>) -> Box<dyn MiniGame>;

/// Registry mapping game IDs to factory functions.
pub struct GameRegistry {
    factories: HashMap<GameId, GameFactory>,
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        #[cfg(feature = "reaction")]
        self.factories.insert(GameId::Reaction, |seed| {
            use crazytie_reaction::{ReactionGame, config::ReactionConfig};
            match seed {
                Some(seed) => Box::new(ReactionGame::with_seed(ReactionConfig::load(), seed)),
                None => Box::new(ReactionGame::new()),
            }
        });
        #[cfg(feature = "tapbattle")]
        self.factories.insert(GameId::TapBattle, |seed| {
            use crazytie_tapbattle::{TapBattle, config::TapBattleConfig};
            match seed {
                Some(seed) => Box::new(TapBattle::with_seed(TapBattleConfig::load(), seed)),
                None => Box::new(TapBattle::new()),
            }
        });
        #[cfg(feature = "reflex")]
        self.factories.insert(GameId::Reflex, |seed| {
            use crazytie_reflex::{ReflexGame, config::ReflexConfig};
            match seed {
                Some(seed) => Box::new(ReflexGame::with_seed(ReflexConfig::load(), seed)),
                None => Box::new(ReflexGame::new()),
            }
        });
        #[cfg(feature = "nerve")]
        self.factories
            .insert(GameId::Nerve, |_| Box::new(crazytie_nerve::NerveGame::new()));
    }

    pub fn create(&self, game_id: GameId, seed: Option<u64>) -> Option<Box<dyn MiniGame>> {
        self.factories.get(&game_id).map(|f| f(seed))
    }

    /// Return the number of registered game types.
    pub fn available_games(&self) -> usize {
        self.factories.len()
    }

    /// Registered games in menu order.
    pub fn games(&self) -> Vec<GameId> {
        GameId::ALL
            .into_iter()
            .filter(|id| self.factories.contains_key(id))
            .collect()
    }
}

/// Configuration for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub game_id: GameId,
    pub seed: Option<u64>,
    /// Overrides the game's own tick rate.
    pub tick_rate: Option<f32>,
    pub auto_start: bool,
    pub publish_state: bool,
}

impl SessionConfig {
    pub fn new(game_id: GameId) -> Self {
        Self {
            game_id,
            seed: None,
            tick_rate: None,
            auto_start: true,
            publish_state: false,
        }
    }
}

/// Spawn a session loop as a tokio task.
/// Returns the command sender, the broadcast receiver and the task handle.
pub fn spawn_session(
    registry: &GameRegistry,
    config: SessionConfig,
) -> Option<(
    mpsc::UnboundedSender<SessionCommand>,
    mpsc::UnboundedReceiver<SessionBroadcast>,
    JoinHandle<()>,
)> {
    let mut game = registry.create(config.game_id, config.seed)?;

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        run_session(&mut *game, config, cmd_rx, broadcast_tx).await;
    });

    Some((cmd_tx, broadcast_rx, handle))
}

/// Period for the requested rate, else the game's own. Rates outside
/// (0, `MAX_TICK_RATE_HZ`] are ignored; the result is never zero.
fn tick_interval(requested: Option<f32>, game_rate: f32) -> Duration {
    let valid = |r: &f32| r.is_finite() && *r > 0.0 && *r <= MAX_TICK_RATE_HZ;
    if let Some(rate) = requested
        && !valid(&rate)
    {
        tracing::warn!(rate, "Tick rate out of range, using the game's rate");
    }
    let rate = requested
        .filter(valid)
        .or(Some(game_rate).filter(valid))
        .unwrap_or(MAX_TICK_RATE_HZ);
    Duration::from_secs_f32(1.0 / rate).max(Duration::from_millis(1))
}

/// Drives one controller against the wall clock. The controller's logical
/// clock is brought up to date before every command, so each input carries
/// the timestamp at which the loop received it.
async fn run_session(
    game: &mut dyn MiniGame,
    config: SessionConfig,
    mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    broadcast_tx: mpsc::UnboundedSender<SessionBroadcast>,
) {
    let origin = Instant::now();
    let mut publisher = Publisher {
        tx: broadcast_tx,
        last_view: None,
        publish_state: config.publish_state,
    };

    tracing::info!(game = %config.game_id, seed = ?config.seed, "Session starting");
    if config.auto_start {
        game.start();
    }
    publisher.publish(game, Vec::new());

    let mut interval = tokio::time::interval(tick_interval(config.tick_rate, game.tick_rate()));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let events = catch_up(game, origin);
                publisher.publish(game, events);
            }
            cmd = cmd_rx.recv() => {
                let mut events = catch_up(game, origin);
                match cmd {
                    Some(SessionCommand::Input(input)) => {
                        tracing::trace!(input = ?input, clock = ?game.clock(), "Input");
                        events.extend(game.apply_input(input));
                    },
                    Some(SessionCommand::Start) => game.start(),
                    Some(SessionCommand::Reset) => {
                        tracing::info!(game = %config.game_id, "Session reset");
                        game.reset();
                    },
                    Some(SessionCommand::Stop) | None => {
                        break;
                    },
                }
                publisher.publish(game, events);
            }
        }
    }

    tracing::info!(game = %config.game_id, "Session ended");
    let _ = publisher.tx.send(SessionBroadcast::Ended);
}

/// Advance the logical clock to the time elapsed since `origin`.
fn catch_up(game: &mut dyn MiniGame, origin: Instant) -> Vec<GameEvent> {
    let dt = origin.elapsed().saturating_sub(game.clock());
    if dt.is_zero() {
        return Vec::new();
    }
    game.update(dt)
}

struct Publisher {
    tx: mpsc::UnboundedSender<SessionBroadcast>,
    last_view: Option<MatchView>,
    publish_state: bool,
}

impl Publisher {
    fn publish(&mut self, game: &dyn MiniGame, events: Vec<GameEvent>) {
        if !events.is_empty() {
            for event in &events {
                tracing::debug!(event = ?event, "Game event");
            }
            let _ = self.tx.send(SessionBroadcast::Events(events));
        }

        let view = game.view();
        if self.last_view.as_ref() != Some(&view) {
            self.last_view = Some(view.clone());
            let _ = self.tx.send(SessionBroadcast::View(view));
        }

        if self.publish_state {
            let state = game.serialize_state();
            let _ = self.tx.send(SessionBroadcast::EncodedState(Bytes::from(state)));
        }
    }
}
