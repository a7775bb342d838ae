use std::time::Duration;

use serde::{Deserialize, Serialize};

use crazytie_core::config::load_game_config;
use crazytie_core::scheduler::duration_from_secs;

/// Data-driven configuration for the Reflex game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflexConfig {
    /// Pause before the countdown (seconds).
    pub intro_delay_secs: f32,
    /// First number shown by the countdown.
    pub countdown_from: u8,
    /// Time each countdown number stays up (seconds).
    pub countdown_interval_secs: f32,
    /// Length of the wave (seconds).
    pub game_duration_secs: f32,
    /// Targets spawned over the whole wave.
    pub total_targets: u32,
    /// Time between spawns (seconds).
    pub spawn_interval_secs: f32,
    /// Time a target stays up if nobody taps it (seconds).
    pub target_lifetime_secs: f32,
    /// Points for tapping your own target.
    pub correct_points: i32,
    /// Points lost for tapping the other player's target.
    pub wrong_penalty: i32,
    /// Horizontal spawn range for target centres (points).
    pub x_range: (f32, f32),
    /// Vertical spawn range for target centres (points).
    pub y_range: (f32, f32),
    /// Target diameter range (points).
    pub size_range: (f32, f32),
    /// Result screen time before the match is declared over (seconds).
    pub results_delay_secs: f32,
}

impl Default for ReflexConfig {
    fn default() -> Self {
        Self {
            intro_delay_secs: 2.0,
            countdown_from: 3,
            countdown_interval_secs: 1.0,
            game_duration_secs: 30.0,
            total_targets: 50,
            spawn_interval_secs: 0.8,
            target_lifetime_secs: 3.0,
            correct_points: 2,
            wrong_penalty: 1,
            x_range: (60.0, 340.0),
            y_range: (150.0, 600.0),
            size_range: (40.0, 60.0),
            results_delay_secs: 3.0,
        }
    }
}

impl ReflexConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        load_game_config("CRAZYTIE_REFLEX_CONFIG", "config/reflex.toml")
    }

    pub fn intro_delay(&self) -> Duration {
        duration_from_secs(self.intro_delay_secs)
    }

    pub fn countdown_interval(&self) -> Duration {
        duration_from_secs(self.countdown_interval_secs)
    }

    pub fn game_duration(&self) -> Duration {
        duration_from_secs(self.game_duration_secs)
    }

    pub fn spawn_interval(&self) -> Duration {
        duration_from_secs(self.spawn_interval_secs)
    }

    pub fn target_lifetime(&self) -> Duration {
        duration_from_secs(self.target_lifetime_secs)
    }

    pub fn results_delay(&self) -> Duration {
        duration_from_secs(self.results_delay_secs)
    }

    pub fn game_seconds(&self) -> u32 {
        self.game_duration_secs.max(0.0).ceil() as u32
    }
}
