use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The page reports missing values as `null`; read those as the default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Artist lists may contain `null` holes.
fn artist_list<'de, D>(deserializer: D) -> Result<Vec<Artist>, D::Error>
where
    D: Deserializer<'de>,
{
    let artists: Option<Vec<Option<Artist>>> = Option::deserialize(deserializer)?;
    Ok(artists.into_iter().flatten().flatten().collect())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "artist_list")]
    pub artists: Vec<Artist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<Album>,
    #[serde(default, deserialize_with = "nullable")]
    pub duration: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub link: String,
    #[serde(default, deserialize_with = "nullable")]
    pub liked: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub disliked: bool,
    /// Whatever else the page sends (cover, version, ids) goes to the host as is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Track {
    pub fn first_artist(&self) -> &str {
        self.artists.first().map(|a| a.title.as_str()).unwrap_or("")
    }

    pub fn album_title(&self) -> &str {
        self.album.as_ref().map(|a| a.title.as_str()).unwrap_or("")
    }

    /// Identity used to detect track changes: `title|artist|album`.
    /// Empty when the track has no title.
    pub fn key(&self) -> String {
        if self.title.is_empty() {
            return String::new();
        }
        format!("{}|{}|{}", self.title, self.first_artist(), self.album_title())
    }

    pub fn display_name(&self) -> String {
        let artists = self
            .artists
            .iter()
            .map(|a| a.title.as_str())
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if artists.is_empty() {
            self.title.clone()
        } else {
            format!("{artists} - {}", self.title)
        }
    }

    pub fn format_duration(&self) -> String {
        format_seconds(self.duration)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default, deserialize_with = "nullable")]
    pub position: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub duration: f64,
}

impl Progress {
    pub fn new(position: f64, duration: f64) -> Self {
        Self { position, duration }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.duration.is_finite()
    }
}

/// Control availability as reported by the page. Only `next` and `prev` are
/// interpreted; everything else is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<bool>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Controls {
    pub fn navigable() -> Self {
        Self {
            next: Some(true),
            prev: Some(true),
            other: Map::new(),
        }
    }
}

/// Host-side snapshot of what the page last reported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub ready: bool,
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub progress: Progress,
    pub controls: Controls,
    pub playlist: Vec<Track>,
}

impl PlayerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text for the tray tooltip and `status` output.
    pub fn summary(&self) -> String {
        match &self.current_track {
            Some(track) => {
                let state = if self.is_playing { "Playing" } else { "Paused" };
                format!("{state}: {}", track.display_name())
            }
            None => "Not playing".to_string(),
        }
    }
}

pub fn format_seconds(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let minutes = total / 60;
    let seconds = total % 60;
    format!("{minutes}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, artist: &str, album: &str) -> Track {
        Track {
            title: title.to_string(),
            artists: vec![Artist {
                title: artist.to_string(),
            }],
            album: Some(Album {
                title: album.to_string(),
                cover: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_track_key() {
        assert_eq!(track("Song", "Band", "LP").key(), "Song|Band|LP");
        assert_eq!(track("", "Band", "LP").key(), "");

        let bare = Track {
            title: "Solo".to_string(),
            ..Default::default()
        };
        assert_eq!(bare.key(), "Solo||");
    }

    #[test]
    fn test_track_from_page_json() {
        let value = serde_json::json!({
            "title": "Song",
            "artists": [{"title": "Band", "id": 7}],
            "album": {"title": "LP", "cover": "//cover/%%"},
            "duration": 215.5,
            "link": "/album/1/track/2",
            "liked": true
        });
        let parsed: Track = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.first_artist(), "Band");
        assert_eq!(parsed.album_title(), "LP");
        assert!(parsed.liked);
        assert!(!parsed.disliked);
        assert_eq!(parsed.format_duration(), "3:35");
    }

    #[test]
    fn test_track_with_nulls() {
        let value = serde_json::json!({
            "title": "Song",
            "version": null,
            "artists": [null, {"title": null}, {"title": "Band"}],
            "album": {"title": "LP", "cover": null},
            "duration": null,
            "link": null,
            "liked": true,
            "disliked": null
        });
        let parsed: Track = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.artists.len(), 2);
        assert_eq!(parsed.display_name(), "Band - Song");
        assert_eq!(parsed.album.as_ref().unwrap().cover, None);
        assert_eq!(parsed.duration, 0.0);
        assert!(parsed.liked);
        assert!(!parsed.disliked);
        assert_eq!(parsed.extra["version"], Value::Null);

        let progress: Progress =
            serde_json::from_value(serde_json::json!({"position": 3.0, "duration": null})).unwrap();
        assert_eq!(progress, Progress::new(3.0, 0.0));
    }

    #[test]
    fn test_controls_keep_unknown_fields() {
        let value = serde_json::json!({"next": true, "prev": false, "shuffle": true});
        let controls: Controls = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(controls.next, Some(true));
        assert_eq!(controls.prev, Some(false));
        assert_eq!(serde_json::to_value(&controls).unwrap(), value);
    }

    #[test]
    fn test_status_summary() {
        let mut status = PlayerStatus::new();
        assert_eq!(status.summary(), "Not playing");

        status.current_track = Some(track("Song", "Band", "LP"));
        status.is_playing = true;
        assert_eq!(status.summary(), "Playing: Band - Song");
    }
}
