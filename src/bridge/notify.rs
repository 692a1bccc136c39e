use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::models::{Controls, Progress, Track};

/// Messages the page side sends to the host shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "channel",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Notification {
    PlayerIsReady,
    InitControls {
        current_track: Option<Track>,
        controls: Controls,
    },
    ChangeControls {
        current_track: Option<Track>,
        controls: Controls,
    },
    ChangeTrack {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_playing: Option<bool>,
        current_track: Option<Track>,
    },
    ChangePlaylist {
        current_track: Option<Track>,
        playlist: Vec<Track>,
    },
    ChangeProgress(Progress),
    ChangeState {
        is_playing: bool,
        current_track: Option<Track>,
    },
    /// Asks the host to type `key` into the page.
    PlayerHotkey(String),
}

impl Notification {
    pub fn channel(&self) -> &'static str {
        match self {
            Notification::PlayerIsReady => "playerIsReady",
            Notification::InitControls { .. } => "initControls",
            Notification::ChangeControls { .. } => "changeControls",
            Notification::ChangeTrack { .. } => "changeTrack",
            Notification::ChangePlaylist { .. } => "changePlaylist",
            Notification::ChangeProgress(_) => "changeProgress",
            Notification::ChangeState { .. } => "changeState",
            Notification::PlayerHotkey(_) => "playerHotkey",
        }
    }
}

/// Fire-and-forget delivery to the host.
pub trait NotificationSink {
    fn send(&self, notification: Notification);
}

impl NotificationSink for UnboundedSender<Notification> {
    fn send(&self, notification: Notification) {
        let channel = notification.channel();
        if UnboundedSender::send(self, notification).is_err() {
            debug!("Host is gone, dropping {channel}");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records everything sent; clones share the same log.
    #[derive(Clone, Default)]
    pub struct Recorder(pub Rc<RefCell<Vec<Notification>>>);

    impl Recorder {
        pub fn take(&self) -> Vec<Notification> {
            self.0.borrow_mut().drain(..).collect()
        }

        pub fn channels(&self) -> Vec<&'static str> {
            self.0.borrow().iter().map(Notification::channel).collect()
        }

        pub fn hotkeys(&self) -> Vec<String> {
            self.0
                .borrow()
                .iter()
                .filter_map(|n| match n {
                    Notification::PlayerHotkey(key) => Some(key.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl NotificationSink for Recorder {
        fn send(&self, notification: Notification) {
            self.0.borrow_mut().push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let value = serde_json::to_value(Notification::ChangeState {
            is_playing: true,
            current_track: None,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"channel": "changeState", "payload": {"isPlaying": true, "currentTrack": null}})
        );

        let value = serde_json::to_value(Notification::ChangeTrack {
            is_playing: None,
            current_track: None,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"channel": "changeTrack", "payload": {"currentTrack": null}})
        );

        let value = serde_json::to_value(Notification::PlayerIsReady).unwrap();
        assert_eq!(value, json!({"channel": "playerIsReady"}));
    }
}
