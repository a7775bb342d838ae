use serde::{Deserialize, Serialize};

/// One of the two people sharing the device.
///
/// Every scoring and input-arbitration rule keys off this identity, so it is
/// deliberately a closed two-variant enum rather than an open id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    P1,
    P2,
}

impl Player {
    /// Both players, in seat order.
    pub const ALL: [Player; 2] = [Player::P1, Player::P2];

    /// The other player.
    pub fn opponent(self) -> Player {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
        }
    }

    /// Label shown on scoreboards and win messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Player::P1 => "PLAYER 1",
            Player::P2 => "PLAYER 2",
        }
    }

    /// Accent color used for this player's half of the screen.
    pub fn color(self) -> PlayerColor {
        PlayerColor::PALETTE[self.index()]
    }

    /// Zero-based seat index, handy for fixed-size per-player arrays.
    pub fn index(self) -> usize {
        match self {
            Player::P1 => 0,
            Player::P2 => 1,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Accent color, presentation-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PlayerColor {
    /// Seat colors, indexed by `Player::index`: red, then orange.
    pub const PALETTE: [PlayerColor; 2] = [
        PlayerColor {
            r: 235,
            g: 64,
            b: 52,
        },
        PlayerColor {
            r: 255,
            g: 149,
            b: 0,
        },
    ];
}
