use serde::Deserialize;

use crazytie_core::game_registry::GameId;

use crate::error::HostError;
use crate::game_loop::MAX_TICK_RATE_HZ;

/// Host configuration, loaded from `crazytie.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Game played when none is named on the command line.
    pub default_game: GameId,
    /// Clock step rate in Hz. `None` uses the game's own rate.
    pub tick_rate_hz: Option<f32>,
    /// Fixed RNG seed for reproducible matches.
    pub seed: Option<u64>,
    /// Start the match as soon as the session is up.
    pub auto_start: bool,
    /// Also publish the MessagePack game state every tick.
    pub publish_state: bool,
    /// Log as JSON instead of text.
    pub json_logs: bool,
    pub keys: KeyBindings,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            default_game: GameId::Reaction,
            tick_rate_hz: None,
            seed: None,
            auto_start: true,
            publish_state: false,
            json_logs: false,
            keys: KeyBindings::default(),
        }
    }
}

/// Terminal key bindings. Each is the whole input line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub player1: String,
    pub player2: String,
    pub start: String,
    pub reset: String,
    pub quit: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            player1: "a".to_string(),
            player2: "l".to_string(),
            start: "s".to_string(),
            reset: "r".to_string(),
            quit: "q".to_string(),
        }
    }
}

impl KeyBindings {
    fn all(&self) -> [&str; 5] {
        [
            &self.player1,
            &self.player2,
            &self.start,
            &self.reset,
            &self.quit,
        ]
    }
}

impl HostConfig {
    /// Check ranges and key uniqueness.
    pub fn validate(&self) -> Result<(), HostError> {
        if let Some(rate) = self.tick_rate_hz
            && !(rate.is_finite() && rate > 0.0 && rate <= MAX_TICK_RATE_HZ)
        {
            return Err(HostError::InvalidConfig(format!(
                "tick_rate_hz must be in (0, {MAX_TICK_RATE_HZ}], got {rate}"
            )));
        }

        let keys = self.keys.all();
        for (i, key) in keys.iter().enumerate() {
            if key.trim().is_empty() {
                return Err(HostError::InvalidConfig(
                    "key bindings must not be empty".to_string(),
                ));
            }
            if keys[..i].contains(key) {
                return Err(HostError::InvalidConfig(format!(
                    "key '{key}' is bound twice"
                )));
            }
        }

        if self.publish_state && self.tick_rate_hz.is_some_and(|r| r > 120.0) {
            tracing::warn!(
                tick_rate_hz = ?self.tick_rate_hz,
                "Publishing state above 120 Hz floods the terminal"
            );
        }
        Ok(())
    }

    /// Load config from `crazytie.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("crazytie.toml") {
            Ok(content) => match toml::from_str::<HostConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from crazytie.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse crazytie.toml: {e}, using defaults");
                    HostConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No crazytie.toml found, using defaults");
                HostConfig::default()
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// `CRAZYTIE_*` overrides. Unparseable values are logged and skipped.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(name) = var("CRAZYTIE_GAME")
            && !name.is_empty()
        {
            match name.parse::<GameId>() {
                Ok(id) => self.default_game = id,
                Err(e) => tracing::warn!("CRAZYTIE_GAME ignored: {e}"),
            }
        }
        if let Some(val) = var("CRAZYTIE_TICK_RATE")
            && let Ok(rate) = val.parse::<f32>()
        {
            self.tick_rate_hz = Some(rate);
        }
        if let Some(val) = var("CRAZYTIE_SEED")
            && let Ok(seed) = val.parse::<u64>()
        {
            self.seed = Some(seed);
        }
        if let Some(val) = var("CRAZYTIE_PUBLISH_STATE")
            && let Ok(flag) = val.parse::<bool>()
        {
            self.publish_state = flag;
        }
        if let Some(val) = var("CRAZYTIE_LOG_JSON")
            && let Ok(flag) = val.parse::<bool>()
        {
            self.json_logs = flag;
        }
    }
}
