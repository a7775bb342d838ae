use std::time::Duration;

use serde::{Deserialize, Serialize};

use crazytie_core::config::load_game_config;
use crazytie_core::scheduler::duration_from_secs;

/// Data-driven configuration for the Tap-Battle game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TapBattleConfig {
    /// Pause before the countdown (seconds).
    pub intro_delay_secs: f32,
    /// First number shown by the countdown.
    pub countdown_from: u8,
    /// Time each countdown number stays up (seconds).
    pub countdown_interval_secs: f32,
    /// Length of the tapping window (seconds).
    pub battle_duration_secs: f32,
    /// Result screen time before the match is declared over (seconds).
    pub results_delay_secs: f32,
    /// Emit cosmetic tap effects.
    pub tap_effects: bool,
    /// How long a tap effect stays on screen (seconds).
    pub tap_effect_lifetime_secs: f32,
    /// Horizontal spawn range for tap effects (points).
    pub effect_x_range: (f32, f32),
    /// Vertical spawn range for tap effects (points).
    pub effect_y_range: (f32, f32),
}

impl Default for TapBattleConfig {
    fn default() -> Self {
        Self {
            intro_delay_secs: 2.0,
            countdown_from: 3,
            countdown_interval_secs: 1.0,
            battle_duration_secs: 10.0,
            results_delay_secs: 3.0,
            tap_effects: true,
            tap_effect_lifetime_secs: 0.5,
            effect_x_range: (50.0, 300.0),
            effect_y_range: (50.0, 200.0),
        }
    }
}

impl TapBattleConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        load_game_config("CRAZYTIE_TAP_BATTLE_CONFIG", "config/tap_battle.toml")
    }

    pub fn intro_delay(&self) -> Duration {
        duration_from_secs(self.intro_delay_secs)
    }

    pub fn countdown_interval(&self) -> Duration {
        duration_from_secs(self.countdown_interval_secs)
    }

    pub fn battle_duration(&self) -> Duration {
        duration_from_secs(self.battle_duration_secs)
    }

    pub fn results_delay(&self) -> Duration {
        duration_from_secs(self.results_delay_secs)
    }

    pub fn tap_effect_lifetime(&self) -> Duration {
        duration_from_secs(self.tap_effect_lifetime_secs)
    }

    /// Whole seconds shown on the battle clock at the start.
    pub fn battle_seconds(&self) -> u32 {
        self.battle_duration_secs.max(0.0).ceil() as u32
    }
}
