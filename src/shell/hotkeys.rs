use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::bridge::command::Command;

/// Visual feedback shown next to a hotkey's command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// "Loved" notice.
    Loved,
    /// Notice with the negation of the current track's liked flag.
    LikeToggled,
    /// Notification with the current track.
    TrackInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotkeyBinding {
    pub accelerator: String,
    pub command: Option<Command>,
    pub feedback: Option<Feedback>,
}

impl HotkeyBinding {
    fn new(accelerator: impl Into<String>, command: Option<Command>, feedback: Option<Feedback>) -> Self {
        Self {
            accelerator: accelerator.into(),
            command,
            feedback,
        }
    }
}

/// Settings key → (command, feedback). Order is registration order.
pub const CUSTOM_ACTIONS: [(&str, Option<Command>, Option<Feedback>); 16] = [
    ("play", Some(Command::Play), None),
    ("pause", Some(Command::Pause), None),
    ("play_pause", Some(Command::TogglePause), None),
    ("previous_track", Some(Command::Prev), None),
    ("next_track", Some(Command::Next), None),
    ("go_backward", Some(Command::GoBackward), None),
    ("go_forward", Some(Command::GoForward), None),
    ("love", Some(Command::Love), Some(Feedback::Loved)),
    ("dislike", Some(Command::Dislike), None),
    ("like_unlike", Some(Command::ToggleLike), Some(Feedback::LikeToggled)),
    ("mute_unmute", Some(Command::ToggleMute), None),
    ("repeat", Some(Command::ToggleRepeat), None),
    ("shuffle", Some(Command::ToggleShuffle), None),
    ("track_info", None, Some(Feedback::TrackInfo)),
    ("volume_down", Some(Command::VolumeDown), None),
    ("volume_up", Some(Command::VolumeUp), None),
];

/// Media keys, registered regardless of accessibility permissions.
pub fn system_media_bindings() -> Vec<HotkeyBinding> {
    vec![
        HotkeyBinding::new("MediaPlayPause", Some(Command::TogglePause), None),
        HotkeyBinding::new("MediaNextTrack", Some(Command::Next), None),
        HotkeyBinding::new("MediaPreviousTrack", Some(Command::Prev), None),
    ]
}

/// Every binding to register. Custom accelerators (key arrays joined with
/// `+`) need accessibility trust; empty ones are skipped.
pub fn bindings(hotkeys: &BTreeMap<String, Vec<String>>, trusted: bool) -> Vec<HotkeyBinding> {
    let mut bindings = system_media_bindings();
    if !trusted {
        return bindings;
    }

    for (action, command, feedback) in CUSTOM_ACTIONS {
        let Some(keys) = hotkeys.get(action) else {
            continue;
        };
        let accelerator = keys.join("+");
        if accelerator.is_empty() {
            continue;
        }
        bindings.push(HotkeyBinding::new(accelerator, command, feedback));
    }
    bindings
}

/// OS global shortcut registry.
pub trait GlobalShortcuts {
    /// `false` when the accelerator is taken or invalid.
    fn register(&mut self, accelerator: &str) -> bool;

    fn unregister_all(&mut self);
}

/// Registers `bindings` and returns the ones that took.
pub fn register_all(shortcuts: &mut impl GlobalShortcuts, bindings: Vec<HotkeyBinding>) -> Vec<HotkeyBinding> {
    let registered: Vec<HotkeyBinding> = bindings
        .into_iter()
        .filter(|binding| {
            let ok = shortcuts.register(&binding.accelerator);
            if !ok {
                warn!("[hotkeys] failed to register accelerator \"{}\"", binding.accelerator);
            }
            ok
        })
        .collect();
    info!("[hotkeys] {} shortcuts registered", registered.len());
    registered
}

/// Drops every shortcut and registers `bindings` again.
pub fn reload(shortcuts: &mut impl GlobalShortcuts, bindings: Vec<HotkeyBinding>) -> Vec<HotkeyBinding> {
    shortcuts.unregister_all();
    register_all(shortcuts, bindings)
}
