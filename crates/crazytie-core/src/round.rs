use serde::{Deserialize, Serialize};

/// 1-indexed round number bounded by the game's maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundCounter {
    current: u8,
    max: u8,
}

impl RoundCounter {
    /// A counter at round 1. `max` is floored at 1.
    pub fn new(max: u8) -> Self {
        Self {
            current: 1,
            max: max.max(1),
        }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// Whether the current round is the last one of the match.
    pub fn is_final(&self) -> bool {
        self.current >= self.max
    }

    /// Move to the next round. Returns `false` (and stays put) on the final round.
    pub fn advance(&mut self) -> bool {
        if self.is_final() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn reset(&mut self) {
        self.current = 1;
    }
}
