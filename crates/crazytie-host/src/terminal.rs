//! Line-based terminal adapter: one command per stdin line, one JSON object
//! per stdout line.
//!
//! Besides the two player keys, Reflex taps can be typed directly:
//! `hit <id>`, `wrong <id> <1|2>` and `tap <x> <y>`.

use serde::Serialize;

use crazytie_core::game_trait::{GameEvent, Input, MatchView};
use crazytie_core::player::Player;

use crate::config::KeyBindings;
use crate::game_loop::SessionCommand;

/// What a typed line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum LineAction {
    Command(SessionCommand),
    Quit,
    /// Blank line or unrecognised text.
    Ignore,
}

pub fn parse_line(line: &str, keys: &KeyBindings) -> LineAction {
    let line = line.trim();
    if line.is_empty() {
        return LineAction::Ignore;
    }
    let input = |input| LineAction::Command(SessionCommand::Input(input));

    if line == keys.player1 {
        return input(Input::PlayerActed(Player::P1));
    }
    if line == keys.player2 {
        return input(Input::PlayerActed(Player::P2));
    }
    if line == keys.start {
        return LineAction::Command(SessionCommand::Start);
    }
    if line == keys.reset {
        return LineAction::Command(SessionCommand::Reset);
    }
    if line == keys.quit {
        return LineAction::Quit;
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["hit", id] => match id.parse() {
            Ok(id) => input(Input::TargetHit(id)),
            Err(_) => LineAction::Ignore,
        },
        ["wrong", id, seat] => match (id.parse(), parse_seat(seat)) {
            (Ok(target), Some(player)) => input(Input::WrongTap { target, player }),
            _ => LineAction::Ignore,
        },
        ["tap", x, y] => match (x.parse::<f32>(), y.parse::<f32>()) {
            (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() => input(Input::ScreenTap { x, y }),
            _ => LineAction::Ignore,
        },
        _ => LineAction::Ignore,
    }
}

fn parse_seat(s: &str) -> Option<Player> {
    match s {
        "1" => Some(Player::P1),
        "2" => Some(Player::P2),
        _ => None,
    }
}

/// One line of JSON output.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputLine<'a> {
    View(&'a MatchView),
    Event(&'a GameEvent),
    State { bytes: usize },
    Ended,
}

impl OutputLine<'_> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode output line");
            String::from("{}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> KeyBindings {
        KeyBindings::default()
    }

    #[test]
    fn player_keys_map_to_taps() {
        assert_eq!(
            parse_line("a", &keys()),
            LineAction::Command(SessionCommand::Input(Input::PlayerActed(Player::P1)))
        );
        assert_eq!(
            parse_line("  l \n", &keys()),
            LineAction::Command(SessionCommand::Input(Input::PlayerActed(Player::P2)))
        );
    }

    #[test]
    fn control_keys() {
        assert_eq!(parse_line("s", &keys()), LineAction::Command(SessionCommand::Start));
        assert_eq!(parse_line("r", &keys()), LineAction::Command(SessionCommand::Reset));
        assert_eq!(parse_line("q", &keys()), LineAction::Quit);
        assert_eq!(parse_line("", &keys()), LineAction::Ignore);
        assert_eq!(parse_line("jump", &keys()), LineAction::Ignore);
    }

    #[test]
    fn reflex_commands() {
        assert_eq!(
            parse_line("hit 4", &keys()),
            LineAction::Command(SessionCommand::Input(Input::TargetHit(4)))
        );
        assert_eq!(
            parse_line("wrong 2 1", &keys()),
            LineAction::Command(SessionCommand::Input(Input::WrongTap {
                target: 2,
                player: Player::P1
            }))
        );
        assert_eq!(
            parse_line("tap 120.5 300", &keys()),
            LineAction::Command(SessionCommand::Input(Input::ScreenTap { x: 120.5, y: 300.0 }))
        );
        assert_eq!(parse_line("hit x", &keys()), LineAction::Ignore);
        assert_eq!(parse_line("wrong 2 3", &keys()), LineAction::Ignore);
        assert_eq!(parse_line("tap NaN 1", &keys()), LineAction::Ignore);
    }

    #[test]
    fn rebound_keys_win_over_defaults() {
        let keys = KeyBindings {
            player1: "z".to_string(),
            ..KeyBindings::default()
        };
        assert_eq!(parse_line("a", &keys), LineAction::Ignore);
        assert_eq!(
            parse_line("z", &keys),
            LineAction::Command(SessionCommand::Input(Input::PlayerActed(Player::P1)))
        );
    }

    #[test]
    fn output_lines_are_tagged_json() {
        let event = GameEvent::ScoreUpdate {
            player: Player::P2,
            score: 3,
        };
        let json: serde_json::Value =
            serde_json::from_str(&OutputLine::Event(&event).to_json()).unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["ScoreUpdate"]["score"], 3);

        let json: serde_json::Value =
            serde_json::from_str(&OutputLine::State { bytes: 12 }.to_json()).unwrap();
        assert_eq!(json, serde_json::json!({"type": "state", "bytes": 12}));
    }
}
