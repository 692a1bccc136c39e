//! The page's in-browser player control surface.
//!
//! Nothing here is guaranteed to exist: the page may expose any subset of the
//! operations and events below, and the set may change between calls. Callers
//! check [`Capabilities`] before invoking and treat every failure as "not
//! handled" rather than as an error to propagate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    GetCurrentTrack,
    GetProgress,
    GetControls,
    GetTracksList,
    GetVolume,
    IsPlaying,
    SetVolume,
    SetPosition,
    ToggleLike,
    ToggleDislike,
    Navigate,
    Prev,
    Play,
    TogglePause,
    Next,
    ToggleRepeat,
    ToggleShuffle,
    ToggleMute,
}

impl Operation {
    pub const ALL: [Operation; 18] = [
        Operation::GetCurrentTrack,
        Operation::GetProgress,
        Operation::GetControls,
        Operation::GetTracksList,
        Operation::GetVolume,
        Operation::IsPlaying,
        Operation::SetVolume,
        Operation::SetPosition,
        Operation::ToggleLike,
        Operation::ToggleDislike,
        Operation::Navigate,
        Operation::Prev,
        Operation::Play,
        Operation::TogglePause,
        Operation::Next,
        Operation::ToggleRepeat,
        Operation::ToggleShuffle,
        Operation::ToggleMute,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::GetCurrentTrack => "getCurrentTrack",
            Operation::GetProgress => "getProgress",
            Operation::GetControls => "getControls",
            Operation::GetTracksList => "getTracksList",
            Operation::GetVolume => "getVolume",
            Operation::IsPlaying => "isPlaying",
            Operation::SetVolume => "setVolume",
            Operation::SetPosition => "setPosition",
            Operation::ToggleLike => "toggleLike",
            Operation::ToggleDislike => "toggleDislike",
            Operation::Navigate => "navigate",
            Operation::Prev => "prev",
            Operation::Play => "play",
            Operation::TogglePause => "togglePause",
            Operation::Next => "next",
            Operation::ToggleRepeat => "toggleRepeat",
            Operation::ToggleShuffle => "toggleShuffle",
            Operation::ToggleMute => "toggleMute",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ApiEvent {
    #[serde(rename = "EVENT_READY")]
    Ready,
    #[serde(rename = "EVENT_TRACK")]
    Track,
    #[serde(rename = "EVENT_PROGRESS")]
    Progress,
    #[serde(rename = "EVENT_STATE")]
    State,
    #[serde(rename = "EVENT_CONTROLS")]
    Controls,
}

impl ApiEvent {
    /// Registration order used when attaching to a page.
    pub const ALL: [ApiEvent; 5] = [
        ApiEvent::Ready,
        ApiEvent::Track,
        ApiEvent::Progress,
        ApiEvent::State,
        ApiEvent::Controls,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ApiEvent::Ready => "EVENT_READY",
            ApiEvent::Track => "EVENT_TRACK",
            ApiEvent::Progress => "EVENT_PROGRESS",
            ApiEvent::State => "EVENT_STATE",
            ApiEvent::Controls => "EVENT_CONTROLS",
        }
    }
}

impl fmt::Display for ApiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the page currently exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    operations: BTreeSet<Operation>,
    events: BTreeSet<ApiEvent>,
    registration: bool,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation and event, with event registration.
    pub fn full() -> Self {
        Self {
            operations: Operation::ALL.into_iter().collect(),
            events: ApiEvent::ALL.into_iter().collect(),
            registration: true,
        }
    }

    pub fn with_operation(mut self, op: Operation) -> Self {
        self.operations.insert(op);
        self
    }

    pub fn with_operations(mut self, ops: impl IntoIterator<Item = Operation>) -> Self {
        self.operations.extend(ops);
        self
    }

    pub fn with_event(mut self, event: ApiEvent) -> Self {
        self.events.insert(event);
        self
    }

    pub fn with_registration(mut self) -> Self {
        self.registration = true;
        self
    }

    pub fn supports(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }

    pub fn exposes(&self, event: ApiEvent) -> bool {
        self.events.contains(&event)
    }

    pub fn can_register(&self) -> bool {
        self.registration
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("externalAPI.{0} is not available")]
    Unsupported(Operation),
    #[error("{0} cannot be subscribed to")]
    UnsupportedEvent(ApiEvent),
    #[error("{0}")]
    Failed(String),
}

pub type EventSender = UnboundedSender<ApiEvent>;

/// The page's player API. Implementations forward to whatever transport
/// reaches the page (a webview script bridge, a test double, ...).
pub trait ExternalApi: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Calls `op` with `args`. `Value::Null` stands in for "returned nothing".
    fn invoke(&self, op: Operation, args: &[Value]) -> Result<Value, ApiError>;

    /// Asks the page to report `event` on `sink` from now on.
    fn on(&self, event: ApiEvent, sink: EventSender) -> Result<(), ApiError>;
}

/// Invokes `op` and returns its result, or `None` when the API is missing,
/// does not expose `op`, fails, or returns nothing.
pub fn invoke_external(api: Option<&dyn ExternalApi>, op: Operation, args: &[Value]) -> Option<Value> {
    let api = api?;
    if !api.capabilities().supports(op) {
        return None;
    }
    match api.invoke(op, args) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            error!("[playerCmd] externalAPI.{op} failed: {e}");
            None
        }
    }
}

/// Invokes `op` for its side effect. `true` means the page accepted the call.
pub fn call_external(api: Option<&dyn ExternalApi>, op: Operation, args: &[Value]) -> bool {
    let Some(api) = api else {
        return false;
    };
    if !api.capabilities().supports(op) {
        return false;
    }
    match api.invoke(op, args) {
        Ok(_) => true,
        Err(e) => {
            error!("[playerCmd] externalAPI.{op} failed: {e}");
            false
        }
    }
}

/// Loose truthiness for values coming back from the page.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scriptable page API for bridge tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeApi {
        pub caps: Mutex<Capabilities>,
        pub returns: Mutex<HashMap<Operation, Value>>,
        pub failing: Mutex<BTreeSet<Operation>>,
        pub calls: Mutex<Vec<(Operation, Vec<Value>)>>,
        pub sinks: Mutex<Vec<(ApiEvent, EventSender)>>,
        pub refuse_events: Mutex<BTreeSet<ApiEvent>>,
    }

    impl FakeApi {
        pub fn new(caps: Capabilities) -> Self {
            Self {
                caps: Mutex::new(caps),
                ..Default::default()
            }
        }

        pub fn returning(self, op: Operation, value: Value) -> Self {
            self.returns.lock().unwrap().insert(op, value);
            self
        }

        pub fn failing(self, op: Operation) -> Self {
            self.failing.lock().unwrap().insert(op);
            self
        }

        pub fn set_return(&self, op: Operation, value: Value) {
            self.returns.lock().unwrap().insert(op, value);
        }

        /// Calls other than state reads.
        pub fn actions(&self) -> Vec<(Operation, Vec<Value>)> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(op, _)| {
                    !matches!(
                        op,
                        Operation::GetCurrentTrack
                            | Operation::GetProgress
                            | Operation::GetControls
                            | Operation::GetTracksList
                            | Operation::GetVolume
                            | Operation::IsPlaying
                    )
                })
                .cloned()
                .collect()
        }

        pub fn emit(&self, event: ApiEvent) {
            for (registered, sink) in self.sinks.lock().unwrap().iter() {
                if *registered == event {
                    let _ = sink.send(event);
                }
            }
        }
    }

    impl ExternalApi for FakeApi {
        fn capabilities(&self) -> Capabilities {
            self.caps.lock().unwrap().clone()
        }

        fn invoke(&self, op: Operation, args: &[Value]) -> Result<Value, ApiError> {
            self.calls.lock().unwrap().push((op, args.to_vec()));
            if self.failing.lock().unwrap().contains(&op) {
                return Err(ApiError::Failed(format!("{op} threw")));
            }
            Ok(self
                .returns
                .lock()
                .unwrap()
                .get(&op)
                .cloned()
                .unwrap_or(Value::Null))
        }

        fn on(&self, event: ApiEvent, sink: EventSender) -> Result<(), ApiError> {
            if self.refuse_events.lock().unwrap().contains(&event) {
                return Err(ApiError::UnsupportedEvent(event));
            }
            self.sinks.lock().unwrap().push((event, sink));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeApi;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_api_is_not_handled() {
        assert!(!call_external(None, Operation::Next, &[]));
        assert_eq!(invoke_external(None, Operation::GetVolume, &[]), None);
    }

    #[test]
    fn test_unsupported_operation_is_not_invoked() {
        let api = FakeApi::new(Capabilities::new().with_operation(Operation::Next));
        assert!(!call_external(Some(&api), Operation::Prev, &[]));
        assert!(call_external(Some(&api), Operation::Next, &[]));
        assert_eq!(api.actions(), vec![(Operation::Next, vec![])]);
    }

    #[test]
    fn test_failure_is_swallowed() {
        let api = FakeApi::new(Capabilities::full()).failing(Operation::GetVolume);
        assert_eq!(invoke_external(Some(&api), Operation::GetVolume, &[]), None);

        let api = FakeApi::new(Capabilities::full()).failing(Operation::Next);
        assert!(!call_external(Some(&api), Operation::Next, &[]));
    }

    #[test]
    fn test_null_result_reads_as_absent() {
        let api = FakeApi::new(Capabilities::full())
            .returning(Operation::GetVolume, json!(0.4));
        assert_eq!(
            invoke_external(Some(&api), Operation::GetVolume, &[]),
            Some(json!(0.4))
        );
        assert_eq!(invoke_external(Some(&api), Operation::GetProgress, &[]), None);
    }

    #[test]
    fn test_truthy() {
        assert!(!truthy(&Value::Null));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("yes")));
        assert!(truthy(&json!({})));
    }
}
