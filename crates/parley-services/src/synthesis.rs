//! Text-to-speech contract and a scriptable mock.

use std::sync::Mutex;

use tokio::sync::mpsc;
use uuid::Uuid;

use parley_core::events::{EventHub, Subscription, SynthesisEvent};
use parley_core::types::{AudioClip, Message};

use crate::lock;

// =============================================================================
// Trait
// =============================================================================

/// Service that turns message text into playable audio and plays it.
///
/// `request_audio` only starts the work; the result arrives later as a
/// [`SynthesisEvent::AudioReady`] or [`SynthesisEvent::AudioFailed`].
pub trait SynthesisService: Send + Sync {
    fn start(&self);

    fn stop(&self);

    /// Whether the service has been started and is usable.
    fn is_active(&self) -> bool;

    /// Whether a synthesis request is outstanding.
    fn is_synthesizing(&self) -> bool;

    /// Whether audio is currently playing.
    fn is_speaking(&self) -> bool;

    /// Whether the recording path is capturing output.
    fn is_recording(&self) -> bool;

    /// Whether live synthesis is disabled in favour of recorded audio.
    fn cached_only(&self) -> bool;

    fn set_cached_only(&self, cached_only: bool);

    fn voice(&self) -> String;

    fn set_voice(&self, voice: &str);

    /// Begin synthesizing audio for `message`.
    ///
    /// Returns `false` if the request could not be started at all.
    fn request_audio(&self, message: &Message) -> bool;

    /// Play a synthesized clip on behalf of `message`. Publishes
    /// [`SynthesisEvent::PlaybackStarted`] once audio is audible.
    fn play_clip(&self, clip: AudioClip, message: &Message);

    /// Synthesize `text` through the recording path, optionally playing it
    /// once recorded.
    fn record_speech(&self, text: &str, play_after_recording: bool);

    /// Register for synthesis and playback events.
    fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<SynthesisEvent>);
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Rough speaking rate used to give mock clips a believable duration.
const MOCK_SECONDS_PER_CHAR: f32 = 0.06;

fn estimate_duration(text: &str) -> f32 {
    (text.chars().count() as f32 * MOCK_SECONDS_PER_CHAR).max(0.5)
}

#[derive(Debug, Default)]
struct SynthesisState {
    active: bool,
    cached_only: bool,
    voice: String,
    reject_requests: bool,
    pending: Option<(Uuid, String)>,
    speaking: bool,
    recording: bool,
    requests: Vec<String>,
    max_concurrent: usize,
    played: Vec<String>,
    recordings: Vec<(String, bool)>,
}

/// Mock synthesis service whose completions are driven by the test.
///
/// Requests are held as pending until `complete_pending`, `fail_pending` or
/// `lose_pending` is called. Playback lasts until `finish_playback`.
#[derive(Debug)]
pub struct MockSynthesisService {
    state: Mutex<SynthesisState>,
    hub: EventHub<SynthesisEvent>,
}

impl Default for MockSynthesisService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSynthesisService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SynthesisState {
                voice: "default".to_string(),
                ..Default::default()
            }),
            hub: EventHub::new(),
        }
    }

    /// Make every subsequent `request_audio` call fail to start.
    pub fn set_reject_requests(&self, reject: bool) {
        lock(&self.state).reject_requests = reject;
    }

    /// Finish the outstanding request successfully.
    pub fn complete_pending(&self) -> bool {
        let Some((message_id, text)) = lock(&self.state).pending.take() else {
            return false;
        };
        let clip = AudioClip::new(text.as_bytes().to_vec(), estimate_duration(&text));
        tracing::debug!(message_id = %message_id, "Mock synthesis completed");
        self.hub
            .publish(SynthesisEvent::AudioReady { message_id, clip });
        true
    }

    /// Finish the outstanding request with an error.
    pub fn fail_pending(&self, reason: &str) -> bool {
        let Some((message_id, _)) = lock(&self.state).pending.take() else {
            return false;
        };
        self.hub.publish(SynthesisEvent::AudioFailed {
            message_id,
            reason: reason.to_string(),
        });
        true
    }

    /// Drop the outstanding request without publishing any completion.
    pub fn lose_pending(&self) -> bool {
        lock(&self.state).pending.take().is_some()
    }

    /// End the current playback.
    pub fn finish_playback(&self) {
        let mut state = lock(&self.state);
        state.speaking = false;
        state.recording = false;
    }

    /// Texts of every accepted synthesis request, in order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// Highest number of requests ever outstanding at once.
    pub fn max_concurrent(&self) -> usize {
        lock(&self.state).max_concurrent
    }

    /// Texts of every clip handed to `play_clip`, in order.
    pub fn played(&self) -> Vec<String> {
        lock(&self.state).played.clone()
    }

    /// Every `record_speech` call as `(text, play_after_recording)`.
    pub fn recordings(&self) -> Vec<(String, bool)> {
        lock(&self.state).recordings.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }
}

impl SynthesisService for MockSynthesisService {
    fn start(&self) {
        lock(&self.state).active = true;
    }

    fn stop(&self) {
        let mut state = lock(&self.state);
        state.active = false;
        state.speaking = false;
        state.recording = false;
    }

    fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    fn is_synthesizing(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    fn is_speaking(&self) -> bool {
        lock(&self.state).speaking
    }

    fn is_recording(&self) -> bool {
        lock(&self.state).recording
    }

    fn cached_only(&self) -> bool {
        lock(&self.state).cached_only
    }

    fn set_cached_only(&self, cached_only: bool) {
        lock(&self.state).cached_only = cached_only;
    }

    fn voice(&self) -> String {
        lock(&self.state).voice.clone()
    }

    fn set_voice(&self, voice: &str) {
        lock(&self.state).voice = voice.to_string();
    }

    fn request_audio(&self, message: &Message) -> bool {
        let mut state = lock(&self.state);
        if !state.active || state.reject_requests {
            return false;
        }
        let outstanding = usize::from(state.pending.is_some()) + 1;
        state.max_concurrent = state.max_concurrent.max(outstanding);
        state.pending = Some((message.id, message.text.clone()));
        state.requests.push(message.text.clone());
        true
    }

    fn play_clip(&self, clip: AudioClip, message: &Message) {
        {
            let mut state = lock(&self.state);
            state.speaking = true;
            state.played.push(message.text.clone());
        }
        self.hub.publish(SynthesisEvent::PlaybackStarted {
            message: message.clone(),
            duration_secs: clip.duration_secs,
        });
    }

    fn record_speech(&self, text: &str, play_after_recording: bool) {
        {
            let mut state = lock(&self.state);
            state.recording = true;
            state
                .recordings
                .push((text.to_string(), play_after_recording));
            if play_after_recording {
                state.speaking = true;
            }
        }
        if play_after_recording {
            self.hub.publish(SynthesisEvent::PlaybackStarted {
                message: Message::new(text, "", ""),
                duration_secs: estimate_duration(text),
            });
        }
    }

    fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<SynthesisEvent>) {
        self.hub.subscribe()
    }
}
