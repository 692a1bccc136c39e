use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A player intent sent by the host. Carries at most one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "cmd", content = "value")]
pub enum Command {
    Play,
    Pause,
    TogglePause,
    Next,
    Prev,
    Love,
    Dislike,
    ToggleLike,
    ToggleDislike,
    ToggleRepeat,
    ToggleShuffle,
    ToggleMute,
    VolumeDown,
    VolumeUp,
    GoBackward,
    GoForward,
    SetPosition(f64),
    Navigate(String),
    PlayTrack(usize),
}

impl Command {
    /// Every payload-free command, in keyboard-table order.
    pub const SIMPLE: [Command; 16] = [
        Command::Play,
        Command::Pause,
        Command::TogglePause,
        Command::Next,
        Command::Prev,
        Command::Love,
        Command::Dislike,
        Command::ToggleLike,
        Command::ToggleDislike,
        Command::ToggleRepeat,
        Command::ToggleShuffle,
        Command::ToggleMute,
        Command::VolumeDown,
        Command::VolumeUp,
        Command::GoBackward,
        Command::GoForward,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::TogglePause => "togglePause",
            Command::Next => "next",
            Command::Prev => "prev",
            Command::Love => "love",
            Command::Dislike => "dislike",
            Command::ToggleLike => "toggleLike",
            Command::ToggleDislike => "toggleDislike",
            Command::ToggleRepeat => "toggleRepeat",
            Command::ToggleShuffle => "toggleShuffle",
            Command::ToggleMute => "toggleMute",
            Command::VolumeDown => "volumeDown",
            Command::VolumeUp => "volumeUp",
            Command::GoBackward => "goBackward",
            Command::GoForward => "goForward",
            Command::SetPosition(_) => "setPosition",
            Command::Navigate(_) => "navigate",
            Command::PlayTrack(_) => "playTrack",
        }
    }

    /// The key the page's own keyboard shortcuts bind to this command.
    /// Commands without an entry have no fallback.
    pub fn fallback_key(&self) -> Option<char> {
        match self {
            Command::Play | Command::Pause | Command::TogglePause => Some('K'),
            Command::Next => Some('N'),
            Command::Prev => Some('P'),
            Command::Love | Command::ToggleLike => Some('F'),
            Command::Dislike | Command::ToggleDislike => Some('D'),
            Command::ToggleRepeat => Some('R'),
            Command::ToggleShuffle => Some('S'),
            Command::ToggleMute => Some('M'),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetPosition(position) => write!(f, "setPosition({position})"),
            Command::Navigate(url) => write!(f, "navigate({url})"),
            Command::PlayTrack(index) => write!(f, "playTrack({index})"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Command::SIMPLE
            .iter()
            .find(|cmd| cmd.name().eq_ignore_ascii_case(wanted))
            .cloned()
            .ok_or_else(|| format!("Unknown player command: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_table() {
        let table: Vec<(&str, Option<char>)> = Command::SIMPLE
            .iter()
            .map(|cmd| (cmd.name(), cmd.fallback_key()))
            .collect();

        assert_eq!(
            table,
            vec![
                ("play", Some('K')),
                ("pause", Some('K')),
                ("togglePause", Some('K')),
                ("next", Some('N')),
                ("prev", Some('P')),
                ("love", Some('F')),
                ("dislike", Some('D')),
                ("toggleLike", Some('F')),
                ("toggleDislike", Some('D')),
                ("toggleRepeat", Some('R')),
                ("toggleShuffle", Some('S')),
                ("toggleMute", Some('M')),
                ("volumeDown", None),
                ("volumeUp", None),
                ("goBackward", None),
                ("goForward", None),
            ]
        );
        assert_eq!(Command::SetPosition(3.0).fallback_key(), None);
        assert_eq!(Command::PlayTrack(0).fallback_key(), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("togglePause".parse::<Command>(), Ok(Command::TogglePause));
        assert_eq!("VOLUMEUP".parse::<Command>(), Ok(Command::VolumeUp));
        assert!("setPosition".parse::<Command>().is_err());
        assert!("rewind".parse::<Command>().is_err());
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&Command::SetPosition(42.5)).unwrap();
        assert_eq!(json, r#"{"cmd":"setPosition","value":42.5}"#);

        let json = serde_json::to_string(&Command::ToggleLike).unwrap();
        assert_eq!(json, r#"{"cmd":"toggleLike"}"#);

        let parsed: Command = serde_json::from_str(r#"{"cmd":"playTrack","value":3}"#).unwrap();
        assert_eq!(parsed, Command::PlayTrack(3));
    }
}
