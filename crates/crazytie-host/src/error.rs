use crazytie_core::game_registry::{GameId, UnknownGame};

#[derive(Debug)]
pub enum HostError {
    /// The game name on the command line or in the config is not a game.
    UnknownGame(String),
    /// The game exists but this build was compiled without it.
    NotRegistered(GameId),
    InvalidConfig(String),
    Io(std::io::Error),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownGame(name) => write!(f, "unknown game '{name}'"),
            Self::NotRegistered(id) => write!(f, "game '{id}' is not compiled into this build"),
            Self::InvalidConfig(m) => write!(f, "invalid configuration: {m}"),
            Self::Io(e) => write!(f, "terminal I/O failed: {e}"),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UnknownGame> for HostError {
    fn from(e: UnknownGame) -> Self {
        Self::UnknownGame(e.0)
    }
}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
