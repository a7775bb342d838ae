pub mod config;
pub mod error;
pub mod game_loop;
pub mod terminal;

use crazytie_core::game_registry::GameId;

use config::HostConfig;
use error::HostError;
use game_loop::SessionConfig;

/// Build the session config for `game` (or the configured default).
pub fn session_config(config: &HostConfig, game: Option<&str>) -> Result<SessionConfig, HostError> {
    let game_id = match game {
        Some(name) => name.parse::<GameId>()?,
        None => config.default_game,
    };
    Ok(SessionConfig {
        game_id,
        seed: config.seed,
        tick_rate: config.tick_rate_hz,
        auto_start: config.auto_start,
        publish_state: config.publish_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_game_overrides_default() {
        let config = HostConfig {
            seed: Some(3),
            ..HostConfig::default()
        };
        let session = session_config(&config, Some("chicken")).unwrap();
        assert_eq!(session.game_id, GameId::Nerve);
        assert_eq!(session.seed, Some(3));
        assert!(session.auto_start);

        let session = session_config(&config, None).unwrap();
        assert_eq!(session.game_id, GameId::Reaction);
    }

    #[test]
    fn unknown_game_is_an_error() {
        let err = session_config(&HostConfig::default(), Some("pong")).unwrap_err();
        assert!(matches!(err, HostError::UnknownGame(ref name) if name == "pong"));
    }
}
