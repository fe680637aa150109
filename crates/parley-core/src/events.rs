use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::types::{AudioClip, Message};

// =============================================================================
// Collaborator events
// =============================================================================

/// Events published by a listening (speech-to-text) service.
#[derive(Clone, Debug, PartialEq)]
pub enum ListeningEvent {
    /// The recognizer produced text for a finished utterance.
    Recognized { text: String, duration_secs: f32 },
}

/// Events published by a synthesis (text-to-speech) service.
#[derive(Clone, Debug, PartialEq)]
pub enum SynthesisEvent {
    /// Audio for a requested message is ready to play.
    AudioReady { message_id: Uuid, clip: AudioClip },
    /// A synthesis request finished without producing audio.
    AudioFailed { message_id: Uuid, reason: String },
    /// Playback of a message's audio has begun.
    PlaybackStarted { message: Message, duration_secs: f32 },
}

/// Events published by a chat backend client.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendEvent {
    /// A single reply with no provenance metadata.
    Reply(String),
    /// A multi-part reply sharing one tone and timestamp.
    Replies {
        texts: Vec<String>,
        tone: String,
        timestamp: String,
    },
}

// =============================================================================
// Host events
// =============================================================================

/// Why the coordinator reported a speaking failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakingFailure {
    /// The listening service could not be (re)started.
    ListeningUnavailable,
    /// A reply never produced audio and was retired.
    AudioFailed,
    /// A reply was resolved but nothing could play it.
    PlaybackUnavailable,
}

/// Events the turn coordinator publishes to the host application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoordinatorEvent {
    /// The user said something.
    UserSpeechText { text: String, duration_secs: f32 },
    /// The agent started speaking (or finished failing to) a reply.
    ChatSpeech { message: Message, duration_secs: f32 },
    /// Something went wrong with speaking or listening.
    SpeakingFailed { reason: SpeakingFailure },
}

impl CoordinatorEvent {
    /// Returns a short name for this event type (useful for logging).
    pub fn event_name(&self) -> &'static str {
        match self {
            CoordinatorEvent::UserSpeechText { .. } => "user_speech_text",
            CoordinatorEvent::ChatSpeech { .. } => "chat_speech",
            CoordinatorEvent::SpeakingFailed { .. } => "speaking_failed",
        }
    }
}

// =============================================================================
// Event hub
// =============================================================================

struct HubInner<E> {
    next_id: u64,
    subscribers: Vec<(u64, mpsc::UnboundedSender<E>)>,
}

/// Fan-out publisher with explicit subscription handles.
///
/// Every subscriber gets its own unbounded channel. Publishing never blocks,
/// which keeps it safe to call from inside a coordinator tick.
pub struct EventHub<E> {
    inner: Arc<Mutex<HubInner<E>>>,
}

impl<E> Clone for EventHub<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }
}

impl<E> std::fmt::Debug for EventHub<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<E: Clone + Send + 'static> EventHub<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    ///
    /// Events are delivered to the returned receiver until the
    /// [`Subscription`] is cancelled or dropped.
    pub fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<E>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = match self.inner.lock() {
            Ok(mut inner) => {
                let id = inner.next_id;
                inner.next_id += 1;
                inner.subscribers.push((id, tx));
                id
            }
            Err(e) => {
                tracing::error!("Event hub mutex poisoned on subscribe: {}", e);
                return (Subscription::detached(), rx);
            }
        };

        let inner = Arc::downgrade(&self.inner);
        let subscription = Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                if let Ok(mut inner) = inner.lock() {
                    inner.subscribers.retain(|(sid, _)| *sid != id);
                }
            }
        });
        (subscription, rx)
    }

    /// Publish an event to every live subscriber. Returns how many received it.
    pub fn publish(&self, event: E) -> usize {
        let Ok(mut inner) = self.inner.lock() else {
            tracing::error!("Event hub mutex poisoned on publish");
            return 0;
        };
        inner
            .subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
        inner.subscribers.len()
    }
}

impl<E> EventHub<E> {
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().map(|i| i.subscribers.len()).unwrap_or(0)
    }
}

/// Handle for a registered event subscriber.
///
/// Dropping the handle unsubscribes. Once `cancel` returns or the handle is
/// dropped, the hub no longer sends to this subscriber.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    fn detached() -> Self {
        Self { unsubscribe: None }
    }

    /// Unsubscribe now.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
