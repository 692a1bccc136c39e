//! Host side of the shell: reacts to what the page reports and turns OS
//! events (hotkeys, suspend) into player commands.

pub mod headless;
pub mod hotkeys;
pub mod input;
pub mod power;
pub mod window;

use std::time::Instant;
use tracing::{debug, info};

use crate::bridge::command::Command;
use crate::bridge::notify::Notification;
use crate::models::{PlayerStatus, Track};
use hotkeys::{Feedback, HotkeyBinding};
use input::InputInjector;
use power::{PowerGuard, PowerSaveBlocker};
use window::Loader;

/// Notices shown in response to hotkeys.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Love { loved: bool },
    Track(Option<Track>),
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Notice::Love { loved: true } => "Added to favorites".to_string(),
            Notice::Love { loved: false } => "Removed from favorites".to_string(),
            Notice::Track(Some(track)) => track.display_name(),
            Notice::Track(None) => "Nothing is playing".to_string(),
        }
    }
}

pub struct Shell<I, B> {
    injector: I,
    power: PowerGuard<B>,
    loader: Loader,
    status: PlayerStatus,
}

impl<I: InputInjector, B: PowerSaveBlocker> Shell<I, B> {
    pub fn new(injector: I, blocker: B) -> Self {
        Self {
            injector,
            power: PowerGuard::new(blocker),
            loader: Loader::show(Instant::now()),
            status: PlayerStatus::new(),
        }
    }

    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    pub fn is_blocking_sleep(&self) -> bool {
        self.power.is_blocking()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_visible(Instant::now())
    }

    pub fn handle_notification(&mut self, notification: Notification) {
        match notification {
            Notification::PlayerIsReady => {
                self.status.ready = true;
                if self.loader.dismiss() {
                    info!("Player is ready");
                }
            }
            Notification::InitControls {
                current_track,
                controls,
            }
            | Notification::ChangeControls {
                current_track,
                controls,
            } => {
                self.status.current_track = current_track;
                self.status.controls = controls;
            }
            Notification::ChangeTrack {
                is_playing,
                current_track,
            } => {
                if let Some(track) = &current_track {
                    debug!("Now playing: {}", track.display_name());
                }
                self.status.current_track = current_track;
                if let Some(is_playing) = is_playing {
                    self.status.is_playing = is_playing;
                }
            }
            Notification::ChangePlaylist {
                current_track,
                playlist,
            } => {
                self.status.current_track = current_track;
                self.status.playlist = playlist;
            }
            Notification::ChangeProgress(progress) => self.status.progress = progress,
            Notification::ChangeState {
                is_playing,
                current_track,
            } => {
                self.status.is_playing = is_playing;
                self.status.current_track = current_track;
                self.power.on_state_change(is_playing);
            }
            Notification::PlayerHotkey(key) => input::send_player_hotkey(&self.injector, &key),
        }
    }

    /// What a pressed hotkey should do: a command for the page and/or a
    /// notice for the user.
    pub fn hotkey_pressed(&self, binding: &HotkeyBinding) -> (Option<Command>, Option<Notice>) {
        let notice = binding.feedback.map(|feedback| match feedback {
            Feedback::Loved => Notice::Love { loved: true },
            Feedback::LikeToggled => Notice::Love {
                loved: !self
                    .status
                    .current_track
                    .as_ref()
                    .is_some_and(|t| t.liked),
            },
            Feedback::TrackInfo => Notice::Track(self.status.current_track.clone()),
        });
        (binding.command.clone(), notice)
    }

    /// The system is going to sleep: release the blocker and pause.
    pub fn suspend(&mut self) -> Command {
        self.power.on_suspend();
        Command::Pause
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Controls, Progress};
    use input::{DomKeyEvent, InjectError, InputEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Keys(Rc<RefCell<Vec<InputEvent>>>);

    impl InputInjector for Keys {
        fn send_input_event(&self, event: &InputEvent) -> Result<(), InjectError> {
            self.0.borrow_mut().push(event.clone());
            Ok(())
        }

        fn dispatch_dom_key(&self, _event: &DomKeyEvent) -> Result<(), InjectError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Blocker(u32);

    impl PowerSaveBlocker for Blocker {
        fn start(&mut self) -> u32 {
            self.0 += 1;
            self.0
        }

        fn stop(&mut self, _id: u32) {}
    }

    fn liked_track(liked: bool) -> Track {
        Track {
            title: "Song".to_string(),
            liked,
            ..Default::default()
        }
    }

    #[test]
    fn test_status_follows_notifications() {
        let mut shell = Shell::new(Keys::default(), Blocker::default());
        assert!(shell.is_loading());

        shell.handle_notification(Notification::PlayerIsReady);
        assert!(shell.status().ready);
        assert!(!shell.is_loading());

        shell.handle_notification(Notification::InitControls {
            current_track: Some(liked_track(false)),
            controls: Controls::navigable(),
        });
        shell.handle_notification(Notification::ChangeProgress(Progress::new(5.0, 100.0)));
        shell.handle_notification(Notification::ChangeTrack {
            is_playing: None,
            current_track: Some(liked_track(true)),
        });

        let status = shell.status();
        assert_eq!(status.controls, Controls::navigable());
        assert_eq!(status.progress, Progress::new(5.0, 100.0));
        assert!(status.current_track.as_ref().unwrap().liked);
        assert!(!status.is_playing);
    }

    #[test]
    fn test_state_drives_power_guard() {
        let mut shell = Shell::new(Keys::default(), Blocker::default());

        shell.handle_notification(Notification::ChangeState {
            is_playing: true,
            current_track: None,
        });
        assert!(shell.is_blocking_sleep());
        assert!(shell.status().is_playing);

        assert_eq!(shell.suspend(), Command::Pause);
        assert!(!shell.is_blocking_sleep());
    }

    #[test]
    fn test_hotkey_notification_types_key() {
        let keys = Keys::default();
        let mut shell = Shell::new(keys.clone(), Blocker::default());

        shell.handle_notification(Notification::PlayerHotkey("n".to_string()));
        assert_eq!(keys.0.borrow().len(), 3);
    }

    #[test]
    fn test_hotkey_feedback() {
        let mut shell = Shell::new(Keys::default(), Blocker::default());
        shell.handle_notification(Notification::ChangeState {
            is_playing: false,
            current_track: Some(liked_track(true)),
        });

        let like = HotkeyBinding {
            accelerator: "Alt+L".to_string(),
            command: Some(Command::ToggleLike),
            feedback: Some(Feedback::LikeToggled),
        };
        let (command, notice) = shell.hotkey_pressed(&like);
        assert_eq!(command, Some(Command::ToggleLike));
        assert_eq!(notice, Some(Notice::Love { loved: false }));

        let info = HotkeyBinding {
            accelerator: "Alt+I".to_string(),
            command: None,
            feedback: Some(Feedback::TrackInfo),
        };
        let (command, notice) = shell.hotkey_pressed(&info);
        assert_eq!(command, None);
        assert_eq!(notice.unwrap().text(), "Song");
    }
}
