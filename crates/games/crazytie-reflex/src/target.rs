use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crazytie_core::game_trait::TargetId;
use crazytie_core::player::Player;

use crate::config::ReflexConfig;

/// A live on-screen target. Belongs to one player, who scores by hitting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub owner: Player,
    /// Centre position in points.
    pub x: f32,
    pub y: f32,
    /// Diameter in points.
    pub size: f32,
    /// Logical time the target appeared.
    pub spawned_at: Duration,
}

impl Target {
    /// Whether the point lies on the target's disc.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt() <= self.size / 2.0
    }
}

/// Roll a new target: owner uniformly at random, position and size within
/// the configured ranges.
pub fn spawn_target(
    rng: &mut StdRng,
    id: TargetId,
    now: Duration,
    config: &ReflexConfig,
) -> Target {
    let owner = if rng.random_bool(0.5) {
        Player::P1
    } else {
        Player::P2
    };
    Target {
        id,
        owner,
        x: sample(rng, config.x_range),
        y: sample(rng, config.y_range),
        size: sample(rng, config.size_range),
        spawned_at: now,
    }
}

/// First live target (in spawn order) under the point.
pub fn hit_test(targets: &[Target], x: f32, y: f32) -> Option<TargetId> {
    targets.iter().find(|t| t.contains(x, y)).map(|t| t.id)
}

fn sample(rng: &mut StdRng, (a, b): (f32, f32)) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo.is_finite() && hi.is_finite() {
        rng.random_range(lo..=hi)
    } else {
        0.0
    }
}
