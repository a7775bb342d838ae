use serde::{Deserialize, Serialize};

/// Unique identifier for a mini-game type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameId {
    Reaction,
    TapBattle,
    Reflex,
    Nerve,
}

impl GameId {
    /// Menu order.
    pub const ALL: [GameId; 4] = [
        GameId::Reaction,
        GameId::TapBattle,
        GameId::Reflex,
        GameId::Nerve,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GameId::Reaction => "reaction",
            GameId::TapBattle => "tap_battle",
            GameId::Reflex => "reflex",
            GameId::Nerve => "nerve",
        }
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised game name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGame(pub String);

impl std::fmt::Display for UnknownGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown game '{}'", self.0)
    }
}

impl std::error::Error for UnknownGame {}

impl std::str::FromStr for GameId {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "reaction" => Ok(GameId::Reaction),
            "tap_battle" | "tapbattle" | "tap" => Ok(GameId::TapBattle),
            "reflex" => Ok(GameId::Reflex),
            "nerve" | "chicken" => Ok(GameId::Nerve),
            _ => Err(UnknownGame(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_display() {
        for id in GameId::ALL {
            assert_eq!(id.to_string().parse::<GameId>(), Ok(id));
        }
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!("Chicken".parse::<GameId>(), Ok(GameId::Nerve));
        assert_eq!("tap-battle".parse::<GameId>(), Ok(GameId::TapBattle));
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "golf".parse::<GameId>().unwrap_err();
        assert_eq!(err.to_string(), "unknown game 'golf'");
    }
}
