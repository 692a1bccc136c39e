//! Synthetic keypresses for the fallback path.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    KeyDown {
        #[serde(rename = "keyCode")]
        key_code: String,
    },
    Char {
        #[serde(rename = "keyCode")]
        key_code: String,
    },
    KeyUp {
        #[serde(rename = "keyCode")]
        key_code: String,
    },
}

/// A `KeyboardEvent` to dispatch on the page's focused element, for pages
/// that ignore webview-level input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomKeyEvent {
    pub key: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_code: Option<u32>,
}

impl DomKeyEvent {
    pub fn for_key(key: &str) -> Self {
        match single_unit(key) {
            Some(unit) => Self {
                key: key.to_lowercase(),
                code: format!("Key{key}"),
                key_code: Some(u32::from(unit)),
            },
            None => Self {
                key: key.to_string(),
                code: key.to_string(),
                key_code: None,
            },
        }
    }

    /// Script that fires keydown and keyup on the focused element.
    pub fn script(&self) -> String {
        let mut init = serde_json::json!({
            "key": self.key,
            "code": self.code,
            "bubbles": true,
            "cancelable": true,
        });
        if let Some(code) = self.key_code {
            init["keyCode"] = code.into();
            init["which"] = code.into();
        }
        format!(
            "(() => {{ const target = document.activeElement || document.body || document; \
             const init = {init}; \
             target.dispatchEvent(new KeyboardEvent(\"keydown\", init)); \
             target.dispatchEvent(new KeyboardEvent(\"keyup\", init)); }})();"
        )
    }
}

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("window is gone")]
    WindowGone,
    #[error("{0}")]
    Failed(String),
}

/// Input delivery into the player window.
pub trait InputInjector {
    fn send_input_event(&self, event: &InputEvent) -> Result<(), InjectError>;

    fn dispatch_dom_key(&self, event: &DomKeyEvent) -> Result<(), InjectError>;
}

/// The key's only UTF-16 code unit, as the page measures a one-character key.
fn single_unit(key: &str) -> Option<u16> {
    let mut units = key.encode_utf16();
    match (units.next(), units.next()) {
        (Some(unit), None) => Some(unit),
        _ => None,
    }
}

/// Trims and upper-cases `raw`; empty keys are rejected.
pub fn normalize_key(raw: &str) -> Option<String> {
    let key = raw.trim().to_uppercase();
    if key.is_empty() { None } else { Some(key) }
}

pub fn key_events(key: &str) -> Vec<InputEvent> {
    let mut events = vec![InputEvent::KeyDown {
        key_code: key.to_string(),
    }];
    if single_unit(key).is_some() {
        events.push(InputEvent::Char {
            key_code: key.to_lowercase(),
        });
    }
    events.push(InputEvent::KeyUp {
        key_code: key.to_string(),
    });
    events
}

/// Types `raw` into the page: webview key events first, then a DOM event.
/// Failures are logged, never returned.
pub fn send_player_hotkey(injector: &impl InputInjector, raw: &str) {
    let Some(key) = normalize_key(raw) else {
        debug!("[playerHotkey] ignoring empty key");
        return;
    };

    let sent = key_events(&key)
        .iter()
        .try_for_each(|event| injector.send_input_event(event));
    if let Err(e) = sent {
        error!("[playerHotkey] failed to send key \"{key}\": {e}");
    }

    if let Err(e) = injector.dispatch_dom_key(&DomKeyEvent::for_key(&key)) {
        error!("[playerHotkey] DOM fallback failed for key \"{key}\": {e}");
    }
}
