use std::time::Duration;

use serde::{Deserialize, Serialize};

use crazytie_core::config::load_game_config;
use crazytie_core::scheduler::duration_from_secs;

/// Data-driven configuration for the Nerve game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NerveConfig {
    pub max_rounds: u8,
    /// Pause before the countdown (seconds).
    pub intro_delay_secs: f32,
    /// First number shown by the countdown.
    pub countdown_from: u8,
    /// Time each countdown number stays up (seconds).
    pub countdown_interval_secs: f32,
    /// Tension ramp during which any tap is a false start (seconds).
    pub building_secs: f32,
    /// Window in which taps are latched (seconds).
    pub danger_secs: f32,
    /// Refresh rate of the tension meter and danger clock (seconds).
    pub meter_interval_secs: f32,
    /// Result screen time before the next round (seconds).
    pub round_end_delay_secs: f32,
}

impl Default for NerveConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            intro_delay_secs: 2.0,
            countdown_from: 3,
            countdown_interval_secs: 1.0,
            building_secs: 4.0,
            danger_secs: 3.0,
            meter_interval_secs: 0.1,
            round_end_delay_secs: 3.0,
        }
    }
}

impl NerveConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        load_game_config("CRAZYTIE_NERVE_CONFIG", "config/nerve.toml")
    }

    pub fn intro_delay(&self) -> Duration {
        duration_from_secs(self.intro_delay_secs)
    }

    pub fn countdown_interval(&self) -> Duration {
        duration_from_secs(self.countdown_interval_secs)
    }

    pub fn building(&self) -> Duration {
        duration_from_secs(self.building_secs)
    }

    pub fn danger(&self) -> Duration {
        duration_from_secs(self.danger_secs)
    }

    pub fn meter_interval(&self) -> Duration {
        duration_from_secs(self.meter_interval_secs)
    }

    pub fn round_end_delay(&self) -> Duration {
        duration_from_secs(self.round_end_delay_secs)
    }
}
