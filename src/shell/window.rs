use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_WIDTH: u32 = 1301;
pub const DEFAULT_HEIGHT: u32 = 768;
pub const MIN_WIDTH: u32 = 400;
pub const MIN_HEIGHT: u32 = 200;
/// The loader overlay never outlives this, ready or not.
pub const LOADER_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEEP_LINK_SCHEME: &str = "yandex-music-app:/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowBounds {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl WindowBounds {
    /// Tiny windows are not worth restoring.
    pub fn worth_persisting(&self) -> bool {
        self.width > MIN_WIDTH && self.height > MIN_HEIGHT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// The app is quitting: let the window close and keep these bounds.
    Close { persist: Option<WindowBounds> },
    /// Keep running in the background.
    Hide { leave_full_screen: bool },
}

pub fn on_close_requested(quitting: bool, full_screen: bool, bounds: WindowBounds) -> CloseAction {
    if quitting {
        CloseAction::Close {
            persist: bounds.worth_persisting().then_some(bounds),
        }
    } else {
        CloseAction::Hide {
            leave_full_screen: full_screen,
        }
    }
}

/// Maps a deep link (or a site URL) onto the site under `base_url`.
pub fn deep_link_target(url: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let site_prefix = format!("{base}/");
    let path = url.replacen(DEEP_LINK_SCHEME, "", 1);
    let path = path.replacen(&site_prefix, "", 1);
    format!("{base}/{}", path.trim_start_matches('/'))
}

pub fn background_color(dark: bool) -> &'static str {
    if dark { "#181818" } else { "#ffffff" }
}

/// Startup overlay shown until the player reports ready.
#[derive(Debug)]
pub struct Loader {
    shown_at: Option<Instant>,
}

impl Loader {
    pub fn show(now: Instant) -> Self {
        Self {
            shown_at: Some(now),
        }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.shown_at
            .is_some_and(|shown| now.duration_since(shown) < LOADER_TIMEOUT)
    }

    pub fn dismiss(&mut self) -> bool {
        self.shown_at.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_only_sensible_bounds() {
        let bounds = WindowBounds {
            x: Some(10),
            y: Some(20),
            width: 1000,
            height: 700,
        };
        assert_eq!(
            on_close_requested(true, false, bounds),
            CloseAction::Close {
                persist: Some(bounds)
            }
        );

        let tiny = WindowBounds {
            width: 400,
            ..bounds
        };
        assert_eq!(
            on_close_requested(true, false, tiny),
            CloseAction::Close { persist: None }
        );
    }

    #[test]
    fn test_close_without_quit_hides() {
        assert_eq!(
            on_close_requested(false, true, WindowBounds::default()),
            CloseAction::Hide {
                leave_full_screen: true
            }
        );
    }

    #[test]
    fn test_deep_links() {
        let base = "https://music.yandex.ru";
        assert_eq!(
            deep_link_target("yandex-music-app://album/123", base),
            "https://music.yandex.ru/album/123"
        );
        assert_eq!(
            deep_link_target("yandex-music-app:/https://music.yandex.ru/artist/9", base),
            "https://music.yandex.ru/artist/9"
        );
        assert_eq!(
            deep_link_target("https://music.yandex.ru/users/me/playlists/3", "https://music.yandex.ru/"),
            "https://music.yandex.ru/users/me/playlists/3"
        );
    }

    #[test]
    fn test_loader_times_out() {
        let start = Instant::now();
        let mut loader = Loader::show(start);
        assert!(loader.is_visible(start + Duration::from_secs(9)));
        assert!(!loader.is_visible(start + LOADER_TIMEOUT));

        assert!(loader.dismiss());
        assert!(!loader.dismiss());
        assert!(!loader.is_visible(start));
    }

    #[test]
    fn test_default_bounds() {
        let bounds = WindowBounds::default();
        assert_eq!((bounds.width, bounds.height), (1301, 768));
        assert_eq!(background_color(true), "#181818");
        assert_eq!(background_color(false), "#ffffff");
    }
}
