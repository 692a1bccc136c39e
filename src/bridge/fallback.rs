//! Player state reconstructed from what any page exposes: the media session
//! metadata and the `<audio>` element. Used when the player API is missing,
//! and alongside it as a safety net.

use tracing::debug;

use super::notify::{Notification, NotificationSink};
use super::page::PageSource;
use crate::models::{Album, Artist, Controls, Progress, Track};

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackState {
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub progress: Progress,
    pub controls: Controls,
}

/// Reads the page once. Never writes to it.
pub fn sample(page: &impl PageSource) -> FallbackState {
    let metadata = page.media_metadata().unwrap_or_default();
    let audio = page.audio();

    let title = clean_text(metadata.title.as_deref());
    let artist = clean_text(metadata.artist.as_deref());
    let album = clean_text(metadata.album.as_deref());

    let mut duration = audio
        .map(|a| a.duration)
        .filter(|d| d.is_finite())
        .unwrap_or(0.0);
    if duration == 0.0 {
        duration = metadata
            .duration
            .filter(|d| d.is_finite())
            .unwrap_or(0.0);
    }
    let position = audio
        .map(|a| a.current_time)
        .filter(|t| t.is_finite())
        .unwrap_or(0.0);
    let is_playing = audio.is_some_and(|a| a.is_playing());

    let current_track = is_usable_track_meta(&title, &artist).then(|| Track {
        link: format!(
            "/track/fallback-{}",
            hash_code(&format!("{title}|{artist}|{album}"))
        ),
        title,
        artists: vec![Artist { title: artist }],
        album: Some(Album {
            title: album,
            cover: None,
        }),
        duration,
        ..Default::default()
    });

    FallbackState {
        current_track,
        is_playing,
        progress: Progress::new(position, duration),
        controls: Controls::navigable(),
    }
}

fn clean_text(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// Rejects placeholder titles: a bare title must be longer than three
/// characters unless an artist is present.
pub fn is_usable_track_meta(title: &str, artist: &str) -> bool {
    if title.is_empty() {
        return false;
    }
    !artist.is_empty() || title.encode_utf16().count() > 3
}

/// 31-multiplier string hash over UTF-16 units with 32-bit wraparound,
/// returned as an absolute value.
pub fn hash_code(input: &str) -> u32 {
    let hash = input
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32));
    hash.unsigned_abs()
}

/// Remembers what was last reported so unchanged samples stay quiet.
#[derive(Debug, Default)]
pub struct FallbackTracker {
    current_track_key: Option<String>,
    current_playing_state: Option<bool>,
}

impl FallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(&mut self, state: FallbackState, sink: &impl NotificationSink) {
        let track_key = state
            .current_track
            .as_ref()
            .map(Track::key)
            .unwrap_or_default();

        if !track_key.is_empty() && self.current_track_key.as_deref() != Some(track_key.as_str()) {
            debug!("Fallback track changed: {track_key}");
            self.current_track_key = Some(track_key);
            sink.send(Notification::ChangeTrack {
                is_playing: None,
                current_track: state.current_track.clone(),
            });
            sink.send(Notification::ChangePlaylist {
                current_track: state.current_track.clone(),
                playlist: Vec::new(),
            });
        }

        if state.progress.is_finite() {
            sink.send(Notification::ChangeProgress(state.progress));
        }

        if state.current_track.is_some() && self.current_playing_state != Some(state.is_playing) {
            self.current_playing_state = Some(state.is_playing);
            sink.send(Notification::ChangeState {
                is_playing: state.is_playing,
                current_track: state.current_track,
            });
        }
    }
}
