use std::time::Duration;

use serde::{Deserialize, Serialize};

use crazytie_core::config::load_game_config;
use crazytie_core::scheduler::duration_from_secs;

/// Data-driven configuration for the Reaction game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// Rounds per match.
    pub max_rounds: u8,
    /// Pause on the "get ready" screen before the countdown (seconds).
    pub intro_delay_secs: f32,
    /// First number shown by the countdown.
    pub countdown_from: u8,
    /// Time each countdown number stays up (seconds).
    pub countdown_interval_secs: f32,
    /// Lower bound of the random wait before the signal (seconds).
    pub arming_delay_min_secs: f32,
    /// Upper bound of the random wait before the signal (seconds).
    pub arming_delay_max_secs: f32,
    /// Result screen time before the next round (seconds).
    pub round_end_delay_secs: f32,
    /// Treat a tap during the intro or the countdown as a false start too.
    pub false_start_before_arming: bool,
    /// End a live round with no winner if nobody taps within this many
    /// seconds. `None` waits forever.
    pub live_timeout_secs: Option<f32>,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            intro_delay_secs: 2.0,
            countdown_from: 3,
            countdown_interval_secs: 1.0,
            arming_delay_min_secs: 2.0,
            arming_delay_max_secs: 5.0,
            round_end_delay_secs: 2.0,
            false_start_before_arming: false,
            live_timeout_secs: None,
        }
    }
}

impl ReactionConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        load_game_config("CRAZYTIE_REACTION_CONFIG", "config/reaction.toml")
    }

    pub fn intro_delay(&self) -> Duration {
        duration_from_secs(self.intro_delay_secs)
    }

    pub fn countdown_interval(&self) -> Duration {
        duration_from_secs(self.countdown_interval_secs)
    }

    pub fn round_end_delay(&self) -> Duration {
        duration_from_secs(self.round_end_delay_secs)
    }

    pub fn live_timeout(&self) -> Option<Duration> {
        self.live_timeout_secs.map(duration_from_secs)
    }

    /// Arming bounds in ascending order, finite and never negative.
    pub fn arming_range(&self) -> (f32, f32) {
        let a = self.arming_delay_min_secs.max(0.0).min(f32::MAX);
        let b = self.arming_delay_max_secs.max(0.0).min(f32::MAX);
        if a <= b { (a, b) } else { (b, a) }
    }
}
