//! Chat backend client contract.

use std::sync::Mutex;

use tokio::sync::mpsc;

use parley_core::events::{BackendEvent, EventHub, Subscription};

use crate::lock;

/// Client for the remote chat service.
///
/// `send_user_text` is fire-and-forget; replies are published as
/// [`BackendEvent`]s whenever the service answers.
pub trait ChatBackend: Send + Sync {
    /// Point the client at a chat service.
    fn configure(&self, url: &str, endpoint: &str);

    fn start(&self);

    fn stop(&self);

    fn send_user_text(&self, text: &str);

    /// Register for reply events.
    fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<BackendEvent>);
}

#[derive(Debug, Default)]
struct BackendState {
    url: String,
    endpoint: String,
    running: bool,
    echo: bool,
    sent: Vec<String>,
    start_calls: usize,
    stop_calls: usize,
}

/// Mock chat backend that records what it was sent.
///
/// Replies are injected with `reply` / `reply_many`. In echo mode each
/// message sent while running is answered with `"You said: <text>"`.
#[derive(Debug, Default)]
pub struct MockChatBackend {
    state: Mutex<BackendState>,
    hub: EventHub<BackendEvent>,
}

impl MockChatBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that answers every message by repeating it.
    pub fn echo() -> Self {
        let backend = Self::new();
        lock(&backend.state).echo = true;
        backend
    }

    /// Publish a single reply.
    pub fn reply(&self, text: &str) {
        self.hub.publish(BackendEvent::Reply(text.to_string()));
    }

    /// Publish a multi-part reply.
    pub fn reply_many(&self, texts: &[&str], tone: &str, timestamp: &str) {
        self.hub.publish(BackendEvent::Replies {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            tone: tone.to_string(),
            timestamp: timestamp.to_string(),
        });
    }

    pub fn sent(&self) -> Vec<String> {
        lock(&self.state).sent.clone()
    }

    pub fn target(&self) -> (String, String) {
        let state = lock(&self.state);
        (state.url.clone(), state.endpoint.clone())
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
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

impl ChatBackend for MockChatBackend {
    fn configure(&self, url: &str, endpoint: &str) {
        let mut state = lock(&self.state);
        state.url = url.to_string();
        state.endpoint = endpoint.to_string();
    }

    fn start(&self) {
        let mut state = lock(&self.state);
        state.running = true;
        state.start_calls += 1;
    }

    fn stop(&self) {
        let mut state = lock(&self.state);
        state.running = false;
        state.stop_calls += 1;
    }

    fn send_user_text(&self, text: &str) {
        let echo = {
            let mut state = lock(&self.state);
            state.sent.push(text.to_string());
            state.echo && state.running
        };
        if echo {
            self.reply(&format!("You said: {}", text));
        }
    }

    fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<BackendEvent>) {
        self.hub.subscribe()
    }
}
