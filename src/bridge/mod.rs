//! Page-side half of the shell: resolves host commands against the web
//! player's API and reports player state back to the host.

pub mod api;
pub mod command;
pub mod fallback;
pub mod notify;
pub mod page;

use serde_json::{Value, json};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, error, info, warn};

use crate::models::{Controls, Progress, Track};
use api::{ApiEvent, ExternalApi, Operation, call_external, invoke_external, truthy};
use command::Command;
use fallback::FallbackTracker;
use notify::{Notification, NotificationSink};
use page::PageSource;

pub const EXTERNAL_API_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const EXTERNAL_API_MAX_RETRIES: u32 = 240;
pub const FALLBACK_BRIDGE_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Seconds skipped by `goForward` / `goBackward`.
const SEEK_STEP: f64 = 5.0;
const VOLUME_STEP: f64 = 0.1;
/// Past this position `prev` restarts the track instead of going back.
const PREV_RESTART_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct BridgeOptions {
    pub probe_interval: Duration,
    pub max_probe_retries: u32,
    pub poll_interval: Duration,
    /// Sample page state as a safety net next to (or instead of) the API.
    pub fallback_polling: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            probe_interval: EXTERNAL_API_POLL_INTERVAL,
            max_probe_retries: EXTERNAL_API_MAX_RETRIES,
            poll_interval: FALLBACK_BRIDGE_POLL_INTERVAL,
            fallback_polling: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePhase {
    Uninitialized,
    Probing { retry: u32 },
    EventDriven,
    FallbackOnly,
}

/// Messages from the host to the page side.
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    Command(Command),
    Navigated { can_go_back: bool },
}

impl From<Command> for HostMessage {
    fn from(command: Command) -> Self {
        HostMessage::Command(command)
    }
}

pub struct Bridge<P, S> {
    page: P,
    sink: S,
    options: BridgeOptions,
    phase: BridgePhase,
    external_bridge_initialized: bool,
    fallback_bridge_initialized: bool,
    fallback: FallbackTracker,
    events_tx: UnboundedSender<ApiEvent>,
    events_rx: Option<UnboundedReceiver<ApiEvent>>,
}

impl<P: PageSource, S: NotificationSink> Bridge<P, S> {
    pub fn new(page: P, sink: S, options: BridgeOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            page,
            sink,
            options,
            phase: BridgePhase::Uninitialized,
            external_bridge_initialized: false,
            fallback_bridge_initialized: false,
            fallback: FallbackTracker::new(),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    pub fn phase(&self) -> BridgePhase {
        self.phase
    }

    pub fn is_polling(&self) -> bool {
        self.fallback_bridge_initialized
    }

    // Lifecycle

    /// Starts probing and, with fallback polling on, brings up the fallback
    /// bridge right away. Returns the probe state after the first attempt.
    pub fn start(&mut self) -> BridgePhase {
        if self.phase != BridgePhase::Uninitialized {
            return self.phase;
        }
        self.phase = BridgePhase::Probing { retry: 0 };
        if self.options.fallback_polling {
            self.init_fallback_bridge();
        }
        self.probe()
    }

    /// One probe attempt. Only meaningful while probing.
    pub fn probe(&mut self) -> BridgePhase {
        let BridgePhase::Probing { retry } = self.phase else {
            return self.phase;
        };

        if let Some(api) = self.page.external_api() {
            if api.capabilities().can_register() {
                self.init_external_bridge(api);
                self.phase = BridgePhase::EventDriven;
                return self.phase;
            }
        }

        if retry >= self.options.max_probe_retries {
            warn!("[bridge] externalAPI is unavailable, fallback bridge is enabled");
            if self.options.fallback_polling {
                self.init_fallback_bridge();
            }
            self.phase = BridgePhase::FallbackOnly;
            return self.phase;
        }

        self.phase = BridgePhase::Probing { retry: retry + 1 };
        self.phase
    }

    fn init_external_bridge(&mut self, api: Arc<dyn ExternalApi>) {
        if self.external_bridge_initialized {
            return;
        }
        self.external_bridge_initialized = true;
        info!("[bridge] externalAPI found, attaching");

        if self.options.fallback_polling {
            self.init_fallback_bridge();
        }

        let caps = api.capabilities();
        for event in ApiEvent::ALL {
            if !caps.exposes(event) {
                continue;
            }
            if let Err(e) = api.on(event, self.events_tx.clone()) {
                error!("[bridge] failed to register externalAPI event \"{event}\": {e}");
            }
        }

        let api = Some(api.as_ref());
        self.sink.send(Notification::InitControls {
            current_track: current_track(api),
            controls: controls(api),
        });
    }

    fn init_fallback_bridge(&mut self) {
        if self.fallback_bridge_initialized {
            return;
        }
        self.fallback_bridge_initialized = true;
        debug!("[bridge] fallback bridge started");

        self.sink.send(Notification::PlayerIsReady);

        let initial = fallback::sample(&self.page);
        self.sink.send(Notification::InitControls {
            current_track: initial.current_track.clone(),
            controls: initial.controls.clone(),
        });
        self.sink.send(Notification::ChangeControls {
            current_track: initial.current_track,
            controls: initial.controls,
        });

        self.poll();
    }

    /// One fallback sample. Does nothing until the fallback bridge is up.
    pub fn poll(&mut self) {
        if !self.fallback_bridge_initialized {
            return;
        }
        let state = fallback::sample(&self.page);
        self.fallback.sync(state, &self.sink);
    }

    pub fn handle_api_event(&mut self, event: ApiEvent) {
        let api = self.page.external_api();
        let api = api.as_deref();
        match event {
            ApiEvent::Ready => self.sink.send(Notification::PlayerIsReady),
            ApiEvent::Track => {
                let track = current_track(api);
                self.sink.send(Notification::ChangeTrack {
                    is_playing: Some(is_playing(api)),
                    current_track: track.clone(),
                });
                self.sink.send(Notification::ChangePlaylist {
                    current_track: track,
                    playlist: tracks_list(api),
                });
            }
            ApiEvent::Progress => {
                let progress = progress(api).unwrap_or_default();
                self.sink.send(Notification::ChangeProgress(progress));
            }
            ApiEvent::State => self.sink.send(Notification::ChangeState {
                is_playing: is_playing(api),
                current_track: current_track(api),
            }),
            ApiEvent::Controls => self.sink.send(Notification::ChangeControls {
                current_track: current_track(api),
                controls: controls(api),
            }),
        }
    }

    // Commands

    pub fn handle_message(&mut self, message: HostMessage) {
        match message {
            HostMessage::Command(command) => {
                self.dispatch(&command);
            }
            HostMessage::Navigated { can_go_back } => self.page.set_back_enabled(can_go_back),
        }
    }

    /// Runs `command` and returns whether the player API handled it. When it
    /// did not, the command's fallback key (if any) is sent to the host.
    pub fn dispatch(&mut self, command: &Command) -> bool {
        let api = self.page.external_api();
        let api = api.as_deref();

        let handled = match command {
            Command::SetPosition(position) => {
                return call_external(api, Operation::SetPosition, &[json!(position)]);
            }
            Command::PlayTrack(index) => {
                return call_external(api, Operation::Play, &[json!(index)]);
            }
            Command::Navigate(url) => {
                let handled = call_external(api, Operation::Navigate, &[json!(url)]);
                if !handled {
                    self.page.load_url(url);
                }
                return handled;
            }
            other => resolve(api, other),
        };

        if !handled {
            match command.fallback_key() {
                Some(key) => {
                    debug!("[playerCmd] {command} not handled, sending key {key}");
                    self.sink.send(Notification::PlayerHotkey(key.to_string()));
                }
                None => debug!("[playerCmd] {command} not handled, no fallback key"),
            }
        }
        handled
    }

    // Event loop

    /// Drives the bridge until `messages` closes: probes for the API, samples
    /// the page, handles API events and host messages in arrival order.
    pub async fn run(mut self, mut messages: UnboundedReceiver<HostMessage>) {
        let Some(mut events) = self.events_rx.take() else {
            return;
        };

        self.start();
        let mut next_probe = self.next_probe_deadline(Instant::now());
        let mut sampler = self.sampler();

        loop {
            tokio::select! {
                message = messages.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => break,
                },
                Some(event) = events.recv() => self.handle_api_event(event),
                () = wait_until(next_probe) => {
                    self.probe();
                    next_probe = self.next_probe_deadline(Instant::now());
                }
                () = tick(&mut sampler) => self.poll(),
            }

            if sampler.is_none() {
                sampler = self.sampler();
            }
        }

        debug!("[bridge] host channel closed, stopping");
    }

    fn next_probe_deadline(&self, now: Instant) -> Option<Instant> {
        match self.phase {
            BridgePhase::Probing { .. } => Some(now + self.options.probe_interval),
            _ => None,
        }
    }

    fn sampler(&self) -> Option<Interval> {
        if !self.fallback_bridge_initialized {
            return None;
        }
        let period = self.options.poll_interval;
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(interval)
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

/// Primary path for payload-free commands.
fn resolve(api: Option<&dyn ExternalApi>, command: &Command) -> bool {
    match command {
        Command::Play => call_external(api, Operation::TogglePause, &[json!(false)]),
        Command::Pause => call_external(api, Operation::TogglePause, &[json!(true)]),
        Command::Love => {
            if track_flag(api, "liked") {
                return true;
            }
            call_external(api, Operation::ToggleLike, &[])
        }
        Command::Dislike => {
            if track_flag(api, "disliked") {
                return true;
            }
            call_external(api, Operation::ToggleDislike, &[])
        }
        Command::VolumeDown => step_volume(api, -VOLUME_STEP),
        Command::VolumeUp => step_volume(api, VOLUME_STEP),
        Command::GoBackward => match position(api) {
            Some(position) => call_external(
                api,
                Operation::SetPosition,
                &[json!((position - SEEK_STEP).max(0.0))],
            ),
            None => false,
        },
        Command::GoForward => match position(api) {
            Some(position) => {
                call_external(api, Operation::SetPosition, &[json!(position + SEEK_STEP)])
            }
            None => false,
        },
        Command::Prev => match position(api) {
            Some(position) if position >= PREV_RESTART_THRESHOLD => {
                call_external(api, Operation::SetPosition, &[json!(0.0)])
            }
            _ => call_external(api, Operation::Prev, &[]),
        },
        Command::TogglePause => call_external(api, Operation::TogglePause, &[]),
        Command::Next => call_external(api, Operation::Next, &[]),
        Command::ToggleLike => call_external(api, Operation::ToggleLike, &[]),
        Command::ToggleDislike => call_external(api, Operation::ToggleDislike, &[]),
        Command::ToggleRepeat => call_external(api, Operation::ToggleRepeat, &[]),
        Command::ToggleShuffle => call_external(api, Operation::ToggleShuffle, &[]),
        Command::ToggleMute => call_external(api, Operation::ToggleMute, &[]),
        Command::SetPosition(_) | Command::Navigate(_) | Command::PlayTrack(_) => false,
    }
}

fn step_volume(api: Option<&dyn ExternalApi>, delta: f64) -> bool {
    let Some(volume) = invoke_external(api, Operation::GetVolume, &[]).and_then(|v| v.as_f64())
    else {
        return false;
    };
    call_external(
        api,
        Operation::SetVolume,
        &[json!((volume + delta).clamp(0.0, 1.0))],
    )
}

// State reads

fn current_track(api: Option<&dyn ExternalApi>) -> Option<Track> {
    let value = invoke_external(api, Operation::GetCurrentTrack, &[])?;
    match serde_json::from_value(value) {
        Ok(track) => Some(track),
        Err(e) => {
            debug!("[bridge] unreadable current track: {e}");
            None
        }
    }
}

/// Reads a boolean flag off the raw track so a malformed field elsewhere
/// cannot hide it.
fn track_flag(api: Option<&dyn ExternalApi>, flag: &str) -> bool {
    invoke_external(api, Operation::GetCurrentTrack, &[])
        .and_then(|track| track.get(flag).map(truthy))
        .unwrap_or(false)
}

fn position(api: Option<&dyn ExternalApi>) -> Option<f64> {
    invoke_external(api, Operation::GetProgress, &[])?
        .get("position")
        .and_then(Value::as_f64)
}

fn progress(api: Option<&dyn ExternalApi>) -> Option<Progress> {
    let value = invoke_external(api, Operation::GetProgress, &[])?;
    serde_json::from_value(value).ok()
}

fn controls(api: Option<&dyn ExternalApi>) -> Controls {
    invoke_external(api, Operation::GetControls, &[])
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}

fn tracks_list(api: Option<&dyn ExternalApi>) -> Vec<Track> {
    match invoke_external(api, Operation::GetTracksList, &[]) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(truthy)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn is_playing(api: Option<&dyn ExternalApi>) -> bool {
    invoke_external(api, Operation::IsPlaying, &[]).is_some_and(|v| truthy(&v))
}
