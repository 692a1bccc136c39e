use std::sync::Arc;

use super::api::ExternalApi;

/// Media session metadata as the page publishes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<f64>,
}

/// State of the page's `<audio>` element. Times may be NaN or infinite
/// while the element is loading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSnapshot {
    pub current_time: f64,
    pub duration: f64,
    pub paused: bool,
    pub ended: bool,
}

impl AudioSnapshot {
    pub fn is_playing(&self) -> bool {
        !self.paused && !self.ended
    }
}

/// The loaded web player, seen from inside the page.
pub trait PageSource {
    /// Looks the player API up again. It may appear late or disappear.
    fn external_api(&self) -> Option<Arc<dyn ExternalApi>>;

    fn media_metadata(&self) -> Option<MediaMetadata>;

    fn audio(&self) -> Option<AudioSnapshot>;

    /// Plain location change, used when the API cannot navigate.
    fn load_url(&self, url: &str);

    /// Enables or disables the injected back button.
    fn set_back_enabled(&self, enabled: bool);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakePage {
        pub api: Mutex<Option<Arc<dyn ExternalApi>>>,
        pub metadata: Mutex<Option<MediaMetadata>>,
        pub audio: Mutex<Option<AudioSnapshot>>,
        pub loaded: Mutex<Vec<String>>,
        pub back_enabled: Mutex<Option<bool>>,
        pub lookups: Mutex<usize>,
    }

    impl FakePage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_api(api: Arc<dyn ExternalApi>) -> Self {
            let page = Self::default();
            page.attach(api);
            page
        }

        pub fn attach(&self, api: Arc<dyn ExternalApi>) {
            *self.api.lock().unwrap() = Some(api);
        }

        pub fn set_metadata(&self, title: &str, artist: &str, album: &str) {
            *self.metadata.lock().unwrap() = Some(MediaMetadata {
                title: Some(title.to_string()),
                artist: Some(artist.to_string()),
                album: Some(album.to_string()),
                duration: None,
            });
        }

        pub fn set_audio(&self, current_time: f64, duration: f64, paused: bool) {
            *self.audio.lock().unwrap() = Some(AudioSnapshot {
                current_time,
                duration,
                paused,
                ended: false,
            });
        }
    }

    impl PageSource for FakePage {
        fn external_api(&self) -> Option<Arc<dyn ExternalApi>> {
            *self.lookups.lock().unwrap() += 1;
            self.api.lock().unwrap().clone()
        }

        fn media_metadata(&self) -> Option<MediaMetadata> {
            self.metadata.lock().unwrap().clone()
        }

        fn audio(&self) -> Option<AudioSnapshot> {
            *self.audio.lock().unwrap()
        }

        fn load_url(&self, url: &str) {
            self.loaded.lock().unwrap().push(url.to_string());
        }

        fn set_back_enabled(&self, enabled: bool) {
            *self.back_enabled.lock().unwrap() = Some(enabled);
        }
    }

    impl<P: PageSource> PageSource for Arc<P> {
        fn external_api(&self) -> Option<Arc<dyn ExternalApi>> {
            (**self).external_api()
        }

        fn media_metadata(&self) -> Option<MediaMetadata> {
            (**self).media_metadata()
        }

        fn audio(&self) -> Option<AudioSnapshot> {
            (**self).audio()
        }

        fn load_url(&self, url: &str) {
            (**self).load_url(url)
        }

        fn set_back_enabled(&self, enabled: bool) {
            (**self).set_back_enabled(enabled)
        }
    }
}
