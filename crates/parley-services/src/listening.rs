//! Speech-to-text capture contract.

use std::sync::Mutex;

use tokio::sync::mpsc;

use parley_core::events::{EventHub, ListeningEvent, Subscription};

use crate::lock;

// =============================================================================
// Trait
// =============================================================================

/// Service that captures user speech and publishes recognized text.
///
/// `start` is a request: the service may become active immediately, pass
/// through an initializing phase, or fail silently. Callers poll
/// `is_active` / `is_initializing` to find out.
pub trait ListeningService: Send + Sync {
    /// Request the recognizer to start (or restart).
    fn start(&self);

    /// Stop recognizing.
    fn stop(&self);

    /// Whether the recognizer is running and hearing input.
    fn is_active(&self) -> bool;

    /// Whether a start request is still in progress.
    fn is_initializing(&self) -> bool;

    /// Whether the platform-native recognizer is in use. Native recognizers
    /// manage their own restarts.
    fn use_native_mode(&self) -> bool;

    fn set_use_native_mode(&self, enabled: bool);

    /// Whether recognized input is currently being dropped.
    fn ignore_listening(&self) -> bool;

    fn set_ignore_listening(&self, ignore: bool);

    /// Whether the device offers a native recognizer at all.
    fn native_supported(&self) -> bool {
        false
    }

    /// Register for recognition events.
    fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<ListeningEvent>);
}

// =============================================================================
// Mock implementation
// =============================================================================

/// What a mock recognizer does when asked to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartBehavior {
    /// Become active immediately.
    Activate,
    /// Enter the initializing phase until `finish_initializing` is called.
    Initialize,
    /// Stay inactive.
    Fail,
}

#[derive(Debug)]
struct ListeningState {
    active: bool,
    initializing: bool,
    native_mode: bool,
    native_supported: bool,
    ignore: bool,
    behavior: StartBehavior,
    start_calls: usize,
    stop_calls: usize,
}

/// Mock recognizer for tests and the demo binary.
#[derive(Debug)]
pub struct MockListeningService {
    state: Mutex<ListeningState>,
    hub: EventHub<ListeningEvent>,
}

impl Default for MockListeningService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockListeningService {
    pub fn new() -> Self {
        Self::with_behavior(StartBehavior::Activate)
    }

    pub fn with_behavior(behavior: StartBehavior) -> Self {
        Self {
            state: Mutex::new(ListeningState {
                active: false,
                initializing: false,
                native_mode: false,
                native_supported: false,
                ignore: false,
                behavior,
                start_calls: 0,
                stop_calls: 0,
            }),
            hub: EventHub::new(),
        }
    }

    /// Change how subsequent start requests behave.
    pub fn set_behavior(&self, behavior: StartBehavior) {
        lock(&self.state).behavior = behavior;
    }

    pub fn set_native_supported(&self, supported: bool) {
        lock(&self.state).native_supported = supported;
    }

    /// Complete a pending initialization.
    pub fn finish_initializing(&self) {
        let mut state = lock(&self.state);
        if state.initializing {
            state.initializing = false;
            state.active = true;
        }
    }

    /// Simulate the recognizer dropping out (device lost, session ended).
    pub fn drop_out(&self) {
        let mut state = lock(&self.state);
        state.active = false;
        state.initializing = false;
        tracing::debug!("Mock recognizer dropped out");
    }

    /// Simulate the user saying `text`. Returns whether it was published.
    pub fn hear(&self, text: &str, duration_secs: f32) -> bool {
        {
            let state = lock(&self.state);
            if !state.active || state.ignore {
                return false;
            }
        }
        self.hub.publish(ListeningEvent::Recognized {
            text: text.to_string(),
            duration_secs,
        }) > 0
    }

    pub fn start_calls(&self) -> usize {
        lock(&self.state).start_calls
    }

    pub fn stop_calls(&self) -> usize {
        lock(&self.state).stop_calls
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }
}

impl ListeningService for MockListeningService {
    fn start(&self) {
        let mut state = lock(&self.state);
        state.start_calls += 1;
        match state.behavior {
            StartBehavior::Activate => {
                state.active = true;
                state.initializing = false;
            }
            StartBehavior::Initialize => state.initializing = true,
            StartBehavior::Fail => {}
        }
        tracing::debug!(
            behavior = ?state.behavior,
            attempt = state.start_calls,
            "Mock recognizer start requested"
        );
    }

    fn stop(&self) {
        let mut state = lock(&self.state);
        state.stop_calls += 1;
        state.active = false;
        state.initializing = false;
    }

    fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    fn is_initializing(&self) -> bool {
        lock(&self.state).initializing
    }

    fn use_native_mode(&self) -> bool {
        lock(&self.state).native_mode
    }

    fn set_use_native_mode(&self, enabled: bool) {
        lock(&self.state).native_mode = enabled;
    }

    fn ignore_listening(&self) -> bool {
        lock(&self.state).ignore
    }

    fn set_ignore_listening(&self, ignore: bool) {
        lock(&self.state).ignore = ignore;
    }

    fn native_supported(&self) -> bool {
        lock(&self.state).native_supported
    }

    fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<ListeningEvent>) {
        self.hub.subscribe()
    }
}
