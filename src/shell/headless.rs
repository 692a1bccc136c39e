//! Stand-ins for the windowing layer when the shell runs without a webview
//! attached. They log what a real window would have done.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::hotkeys::GlobalShortcuts;
use super::input::{DomKeyEvent, InjectError, InputEvent, InputInjector};
use super::power::PowerSaveBlocker;
use crate::bridge::api::ExternalApi;
use crate::bridge::page::{AudioSnapshot, MediaMetadata, PageSource};

/// A page that never loaded: no player API, no media session, no audio.
#[derive(Debug, Default)]
pub struct DetachedPage;

impl PageSource for DetachedPage {
    fn external_api(&self) -> Option<Arc<dyn ExternalApi>> {
        None
    }

    fn media_metadata(&self) -> Option<MediaMetadata> {
        None
    }

    fn audio(&self) -> Option<AudioSnapshot> {
        None
    }

    fn load_url(&self, url: &str) {
        info!("Loading {url}");
    }

    fn set_back_enabled(&self, enabled: bool) {
        info!("Back navigation {}", if enabled { "enabled" } else { "disabled" });
    }
}

#[derive(Debug, Default)]
pub struct LogInjector;

impl InputInjector for LogInjector {
    fn send_input_event(&self, event: &InputEvent) -> Result<(), InjectError> {
        info!("Input event: {event:?}");
        Ok(())
    }

    fn dispatch_dom_key(&self, event: &DomKeyEvent) -> Result<(), InjectError> {
        info!("DOM key event: {}", event.code);
        debug!("Executing script: {}", event.script());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct LogBlocker {
    next_id: u32,
}

impl PowerSaveBlocker for LogBlocker {
    fn start(&mut self) -> u32 {
        self.next_id += 1;
        info!("Preventing app suspension ({})", self.next_id);
        self.next_id
    }

    fn stop(&mut self, id: u32) {
        info!("Allowing app suspension ({id})");
    }
}

/// Accepts any accelerator once.
#[derive(Debug, Default)]
pub struct LogShortcuts {
    registered: BTreeSet<String>,
}

impl GlobalShortcuts for LogShortcuts {
    fn register(&mut self, accelerator: &str) -> bool {
        self.registered.insert(accelerator.to_string())
    }

    fn unregister_all(&mut self) {
        self.registered.clear();
    }
}
