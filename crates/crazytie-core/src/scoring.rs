use serde::{Deserialize, Serialize};

use crate::player::Player;

/// Per-player integer accumulators for one match.
///
/// Reflex uses a clamped ledger (scores never drop below zero); the other
/// games accumulate freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLedger {
    scores: [i32; 2],
    clamp_at_zero: bool,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger whose scores are floored at zero after every `add`.
    pub fn clamped() -> Self {
        Self {
            scores: [0, 0],
            clamp_at_zero: true,
        }
    }

    /// Apply `delta` (possibly negative) and return the new score.
    pub fn add(&mut self, player: Player, delta: i32) -> i32 {
        let slot = &mut self.scores[player.index()];
        *slot = slot.saturating_add(delta);
        if self.clamp_at_zero {
            *slot = (*slot).max(0);
        }
        *slot
    }

    pub fn score(&self, player: Player) -> i32 {
        self.scores[player.index()]
    }

    /// Scores in seat order `[P1, P2]`.
    pub fn scores(&self) -> [i32; 2] {
        self.scores
    }

    pub fn reset(&mut self) {
        self.scores = [0, 0];
    }

    /// Strictly higher score, or `None` when tied.
    pub fn leader(&self) -> Option<Player> {
        let [p1, p2] = self.scores;
        match p1.cmp(&p2) {
            std::cmp::Ordering::Greater => Some(Player::P1),
            std::cmp::Ordering::Less => Some(Player::P2),
            std::cmp::Ordering::Equal => None,
        }
    }
}
