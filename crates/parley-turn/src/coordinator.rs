//! The turn coordinator.
//!
//! Driven by an external fixed-rate tick. Each tick:
//! 1. applies completions that collaborators published since the last tick,
//! 2. keeps the recognizer alive (unless it runs in native mode),
//! 3. tries to resolve every unresolved queued message to playable audio,
//! 4. plays, animates, or retires the queue head if nothing is speaking.
//!
//! Nothing inside a tick blocks. Synthesis is single-flight: at most one
//! request is outstanding at any time.

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use parley_core::config::{ParleyConfig, SessionOptions, TurnConfig};
use parley_core::error::Result;
use parley_core::events::{
    BackendEvent, CoordinatorEvent, EventHub, ListeningEvent, SpeakingFailure, Subscription,
    SynthesisEvent,
};
use parley_core::types::Message;
use parley_services::{
    AnimationSink, ChatBackend, ListeningService, RecordedAudioCache, SynthesisService,
};

use crate::queue::OutgoingQueue;
use crate::retry::{ListeningRetry, RetryOutcome};
use crate::state::CoordinatorState;

// =============================================================================
// Wiring
// =============================================================================

/// The services a coordinator drives, constructed by the host.
#[derive(Clone)]
pub struct Collaborators {
    pub listening: Arc<dyn ListeningService>,
    pub synthesis: Arc<dyn SynthesisService>,
    pub recorded: Arc<dyn RecordedAudioCache>,
    pub backend: Arc<dyn ChatBackend>,
    /// Character to animate for emoji replies. Emoji replies are dropped
    /// silently when absent.
    pub animation: Option<Arc<dyn AnimationSink>>,
}

/// Live subscriptions to collaborator events. Dropping this unsubscribes.
struct Wiring {
    listening: (Subscription, mpsc::UnboundedReceiver<ListeningEvent>),
    synthesis: (Subscription, mpsc::UnboundedReceiver<SynthesisEvent>),
    backend: Option<(Subscription, mpsc::UnboundedReceiver<BackendEvent>)>,
}

// =============================================================================
// Tick reporting
// =============================================================================

/// How the queue head left the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumed {
    /// Emoji reply handed to the animation sink.
    Animated(Uuid),
    /// Reply handed to playback.
    Spoken(Uuid),
    /// Reply retired after its audio failed or there was nothing to play.
    Failed(Uuid),
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// `None` when the coordinator was not running.
    pub retry: Option<RetryOutcome>,
    /// Message a synthesis request was issued for.
    pub requested: Option<Uuid>,
    pub consumed: Option<Consumed>,
}

// =============================================================================
// Coordinator
// =============================================================================

pub struct TurnCoordinator {
    services: Collaborators,
    settings: TurnConfig,
    state: CoordinatorState,
    queue: OutgoingQueue,
    retry: ListeningRetry,
    in_flight: Option<Uuid>,
    ai_enabled: bool,
    wiring: Option<Wiring>,
    events: EventHub<CoordinatorEvent>,
    push_to_talk_off: bool,
    muted: bool,
    record_all_audio: bool,
}

impl std::fmt::Debug for TurnCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnCoordinator")
            .field("state", &self.state)
            .field("queued", &self.queue.len())
            .field("in_flight", &self.in_flight)
            .field("ai_enabled", &self.ai_enabled)
            .field("listen_failures", &self.retry.consecutive_failures())
            .finish()
    }
}

impl TurnCoordinator {
    /// Create a stopped coordinator with default turn settings.
    pub fn new(services: Collaborators) -> Self {
        Self::with_settings(services, TurnConfig::default())
    }

    pub fn with_settings(services: Collaborators, settings: TurnConfig) -> Self {
        Self {
            services,
            settings,
            state: CoordinatorState::Stopped,
            queue: OutgoingQueue::new(),
            retry: ListeningRetry::new(),
            in_flight: None,
            ai_enabled: false,
            wiring: None,
            events: EventHub::new(),
            push_to_talk_off: false,
            muted: false,
            record_all_audio: false,
        }
    }

    /// Create a coordinator and apply the listening and synthesis flags from
    /// `config`.
    pub fn from_config(services: Collaborators, config: &ParleyConfig) -> Self {
        let mut coordinator = Self::with_settings(services, config.turn.clone());
        coordinator.push_to_talk_off = config.listening.push_to_talk_off;
        coordinator.muted = config.listening.muted;
        coordinator.record_all_audio = config.synthesis.record_all;
        coordinator
            .services
            .listening
            .set_use_native_mode(config.listening.use_native_mode);
        coordinator
            .services
            .listening
            .set_ignore_listening(config.listening.ignore_listening);
        coordinator
    }

    /// Register for coordinator events.
    pub fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<CoordinatorEvent>) {
        self.events.subscribe()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Wire up collaborator events and start the services.
    ///
    /// Fails only if the coordinator is not stopped.
    pub fn start(&mut self, options: &SessionOptions) -> Result<()> {
        self.state.transition(CoordinatorState::Starting)?;

        let listening = &self.services.listening;
        let synthesis = &self.services.synthesis;
        let backend = &self.services.backend;

        let listening_sub = listening.subscribe();
        listening.start();

        if let Some(voice) = options.voice_override() {
            synthesis.set_voice(voice);
        }
        synthesis.set_cached_only(options.cached_only_replies);
        let synthesis_sub = synthesis.subscribe();
        synthesis.start();

        let backend_sub = if options.enable_ai {
            if let Some((url, endpoint)) = options.chat_target() {
                backend.configure(url, endpoint);
            }
            let sub = backend.subscribe();
            backend.start();
            Some(sub)
        } else {
            None
        };

        self.wiring = Some(Wiring {
            listening: listening_sub,
            synthesis: synthesis_sub,
            backend: backend_sub,
        });
        self.ai_enabled = options.enable_ai;
        self.in_flight = None;
        self.retry.reset();

        self.state.transition(CoordinatorState::Running)?;
        tracing::info!(
            ai_enabled = options.enable_ai,
            cached_only = options.cached_only_replies,
            voice = %synthesis.voice(),
            "Turn coordinator started"
        );
        Ok(())
    }

    /// Release all event wiring and stop the services. Always succeeds.
    ///
    /// In-flight synthesis and backend requests are not cancelled; their
    /// completions are never delivered because the subscriptions are gone.
    pub fn stop(&mut self) -> bool {
        if self.state == CoordinatorState::Stopped {
            return true;
        }

        drop(self.wiring.take());

        self.services.listening.stop();
        self.services.synthesis.stop();
        if self.ai_enabled {
            self.services.backend.stop();
        }
        self.ai_enabled = false;
        self.in_flight = None;

        if let Err(e) = self.state.transition(CoordinatorState::Stopped) {
            tracing::warn!("Forcing coordinator stop: {}", e);
            self.state = CoordinatorState::Stopped;
        }
        tracing::info!(queued = self.queue.len(), "Turn coordinator stopped");
        true
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    // -------------------------------------------------------------------------
    // Intake
    // -------------------------------------------------------------------------

    /// Forward confirmed user text to the chat backend.
    ///
    /// Blank text, or text submitted while AI is disabled, is ignored.
    pub fn submit_user_text(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if self.ai_enabled {
            tracing::debug!(chars = text.chars().count(), "Forwarding user text");
            self.services.backend.send_user_text(text);
        }
    }

    /// Synthesize `text` through the recording path.
    pub fn record_speech(&self, text: &str, play_after_recording: bool) {
        self.services
            .synthesis
            .record_speech(text, play_after_recording);
    }

    /// Queue a single reply with no provenance metadata.
    pub fn enqueue_reply(&mut self, text: &str) {
        self.queue.push(Message::new(text, "", ""));
    }

    /// Queue a multi-part reply, one message per text, in order.
    pub fn enqueue_replies(&mut self, texts: &[String], tone: &str, timestamp: &str) {
        self.queue.extend(Message::batch(texts, tone, timestamp));
    }

    // -------------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------------

    /// Run one scheduling step. Does nothing unless running.
    pub fn tick(&mut self) -> TickReport {
        if self.state != CoordinatorState::Running {
            return TickReport::default();
        }

        self.drain_events();

        let retry = if self.services.listening.use_native_mode() {
            RetryOutcome::Skipped
        } else {
            self.retry_listening()
        };

        let requested = self.resolve_messages();

        let consumed = if self.services.synthesis.is_speaking() {
            None
        } else {
            self.consume_head()
        };

        TickReport {
            retry: Some(retry),
            requested,
            consumed,
        }
    }

    fn drain_events(&mut self) {
        let Some(wiring) = self.wiring.as_mut() else {
            return;
        };

        let mut heard = Vec::new();
        while let Ok(event) = wiring.listening.1.try_recv() {
            heard.push(event);
        }
        let mut replies = Vec::new();
        if let Some((_, rx)) = wiring.backend.as_mut() {
            while let Ok(event) = rx.try_recv() {
                replies.push(event);
            }
        }
        let mut completions = Vec::new();
        while let Ok(event) = wiring.synthesis.1.try_recv() {
            completions.push(event);
        }

        for event in heard {
            match event {
                ListeningEvent::Recognized {
                    text,
                    duration_secs,
                } => {
                    self.events.publish(CoordinatorEvent::UserSpeechText {
                        text,
                        duration_secs,
                    });
                }
            }
        }

        for event in replies {
            match event {
                BackendEvent::Reply(text) => self.enqueue_reply(&text),
                BackendEvent::Replies {
                    texts,
                    tone,
                    timestamp,
                } => self.enqueue_replies(&texts, &tone, &timestamp),
            }
        }

        for event in completions {
            self.apply_synthesis_event(event);
        }
    }

    fn apply_synthesis_event(&mut self, event: SynthesisEvent) {
        match event {
            SynthesisEvent::AudioReady { message_id, clip } => {
                self.clear_in_flight(message_id);
                match self.queue.find_mut(message_id) {
                    Some(message) if !message.is_failed_audio() => {
                        tracing::debug!(message_id = %message_id, "Synthesized audio attached");
                        message.attach_clip(clip);
                    }
                    _ => {
                        tracing::debug!(message_id = %message_id, "Audio for retired message ignored");
                    }
                }
            }
            SynthesisEvent::AudioFailed { message_id, reason } => {
                self.clear_in_flight(message_id);
                if let Some(message) = self.queue.find_mut(message_id) {
                    let terminal = message.record_audio_failure();
                    tracing::warn!(
                        message_id = %message_id,
                        attempts = message.audio_failure_count,
                        terminal,
                        reason = %reason,
                        "Synthesis failed"
                    );
                }
            }
            SynthesisEvent::PlaybackStarted {
                message,
                duration_secs,
            } => {
                self.events.publish(CoordinatorEvent::ChatSpeech {
                    message,
                    duration_secs,
                });
            }
        }
    }

    fn clear_in_flight(&mut self, message_id: Uuid) {
        if self.in_flight == Some(message_id) {
            self.in_flight = None;
        }
    }

    fn retry_listening(&mut self) -> RetryOutcome {
        let outcome = self.retry.observe(self.services.listening.as_ref());
        if let RetryOutcome::Exhausted { .. } = outcome {
            self.events.publish(CoordinatorEvent::SpeakingFailed {
                reason: SpeakingFailure::ListeningUnavailable,
            });
        }
        outcome
    }

    /// Try to make every unresolved message playable. Returns the message a
    /// synthesis request was issued for, if any.
    fn resolve_messages(&mut self) -> Option<Uuid> {
        let recorded = &self.services.recorded;
        let synthesis = &self.services.synthesis;

        // A request the service dropped without ever reporting back.
        if let Some(id) = self.in_flight {
            if !synthesis.is_synthesizing() {
                self.in_flight = None;
                if let Some(message) = self.queue.find_mut(id) {
                    message.record_audio_failure();
                    tracing::warn!(
                        message_id = %id,
                        attempts = message.audio_failure_count,
                        "Synthesis request lost"
                    );
                }
            }
        }

        let mut requested = None;
        for message in self.queue.iter_mut() {
            if message.has_audio || message.is_failed_audio() {
                continue;
            }

            if recorded.exists(&message.text) {
                message.has_audio = true;
                tracing::debug!(message_id = %message.id, "Resolved from recorded dialog");
                continue;
            }

            if synthesis.cached_only() && !message.is_emoji() {
                tracing::debug!(
                    message_id = %message.id,
                    "No recording in cached-only mode, using fallback phrase"
                );
                message.text = self.settings.fallback_text.clone();
                message.has_audio = true;
                continue;
            }

            if self.in_flight.is_some() || synthesis.is_synthesizing() {
                continue;
            }

            if synthesis.request_audio(message) {
                self.in_flight = Some(message.id);
                requested = Some(message.id);
            } else if !message.is_emoji() {
                tracing::warn!(
                    message_id = %message.id,
                    "Synthesis request rejected, retiring message"
                );
                message.mark_failed();
                break;
            }
        }
        requested
    }

    /// Advance the queue head by at most one message.
    fn consume_head(&mut self) -> Option<Consumed> {
        let head = self.queue.head()?;

        if head.is_emoji() {
            let message = self.queue.pop_head()?;
            match &self.services.animation {
                Some(sink) => sink.play(&message.text),
                None => tracing::debug!(message_id = %message.id, "No animation sink, emoji dropped"),
            }
            return Some(Consumed::Animated(message.id));
        }

        if head.has_audio {
            let message = self.queue.pop_head()?;
            let id = message.id;
            return Some(if self.speak_out_loud(message) {
                Consumed::Spoken(id)
            } else {
                Consumed::Failed(id)
            });
        }

        if head.is_failed_audio() {
            let message = self.queue.pop_head()?;
            let id = message.id;
            tracing::warn!(message_id = %id, "Retiring message without audio");
            self.report_failed_speech(message, SpeakingFailure::AudioFailed);
            return Some(Consumed::Failed(id));
        }

        None
    }

    /// Returns false when there was nothing to play and a failure was reported.
    fn speak_out_loud(&self, mut message: Message) -> bool {
        if message.is_empty() {
            tracing::debug!(message_id = %message.id, "Empty message skipped");
            return true;
        }

        let synthesis = &self.services.synthesis;
        if self.record_all_audio {
            synthesis.record_speech(&message.text, true);
            return true;
        }

        // The recording is checked again here: it may have appeared after
        // the message was resolved to synthesized audio.
        let duration_secs = self.services.recorded.play_if_present(&message);
        if duration_secs > 0.0 {
            self.events.publish(CoordinatorEvent::ChatSpeech {
                message,
                duration_secs,
            });
            return true;
        }

        match message.take_clip() {
            Some(clip) => {
                synthesis.play_clip(clip, &message);
                true
            }
            None => {
                tracing::warn!(message_id = %message.id, "Resolved message has nothing to play");
                self.report_failed_speech(message, SpeakingFailure::PlaybackUnavailable);
                false
            }
        }
    }

    fn report_failed_speech(&self, message: Message, reason: SpeakingFailure) {
        self.events
            .publish(CoordinatorEvent::SpeakingFailed { reason });
        self.events.publish(CoordinatorEvent::ChatSpeech {
            message,
            duration_secs: self.settings.failed_speech_duration_secs,
        });
    }

    // -------------------------------------------------------------------------
    // Status
    // -------------------------------------------------------------------------

    pub fn is_speaking(&self) -> bool {
        self.services.synthesis.is_speaking()
    }

    /// Whether the microphone should currently be considered off.
    pub fn is_listening_disabled(&self) -> bool {
        self.is_speaking()
            || self.push_to_talk_off
            || self.muted
            || self.services.listening.ignore_listening()
    }

    pub fn text_to_speech_active(&self) -> bool {
        self.services.synthesis.is_active()
    }

    pub fn speech_to_text_active(&self) -> bool {
        self.services.listening.is_active()
    }

    pub fn is_recording(&self) -> bool {
        self.services.synthesis.is_recording()
    }

    pub fn native_recognition_supported(&self) -> bool {
        self.services.listening.native_supported()
    }

    pub fn ignore_listening(&self) -> bool {
        self.services.listening.ignore_listening()
    }

    pub fn set_ignore_listening(&self, ignore: bool) {
        self.services.listening.set_ignore_listening(ignore);
    }

    pub fn use_native_mode(&self) -> bool {
        self.services.listening.use_native_mode()
    }

    pub fn set_use_native_mode(&self, enabled: bool) {
        self.services.listening.set_use_native_mode(enabled);
    }

    pub fn push_to_talk_off(&self) -> bool {
        self.push_to_talk_off
    }

    pub fn set_push_to_talk_off(&mut self, off: bool) {
        self.push_to_talk_off = off;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn record_all_audio(&self) -> bool {
        self.record_all_audio
    }

    pub fn set_record_all_audio(&mut self, record_all: bool) {
        self.record_all_audio = record_all;
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai_enabled
    }

    pub fn consecutive_listen_failures(&self) -> u32 {
        self.retry.consecutive_failures()
    }

    pub fn queued(&self) -> impl Iterator<Item = &Message> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Message whose synthesis request is outstanding.
    pub fn in_flight(&self) -> Option<Uuid> {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_services::{
        MockChatBackend, MockListeningService, MockSynthesisService, RecordedDialog,
        RecordedEntry, RecordingAnimationSink,
    };

    struct Harness {
        listening: Arc<MockListeningService>,
        synthesis: Arc<MockSynthesisService>,
        backend: Arc<MockChatBackend>,
        coordinator: TurnCoordinator,
    }

    fn harness(recorded: RecordedDialog) -> Harness {
        let listening = Arc::new(MockListeningService::new());
        let synthesis = Arc::new(MockSynthesisService::new());
        let backend = Arc::new(MockChatBackend::new());
        let coordinator = TurnCoordinator::new(Collaborators {
            listening: listening.clone(),
            synthesis: synthesis.clone(),
            recorded: Arc::new(recorded),
            backend: backend.clone(),
            animation: Some(Arc::new(RecordingAnimationSink::new())),
        });
        Harness {
            listening,
            synthesis,
            backend,
            coordinator,
        }
    }

    fn ai_options() -> SessionOptions {
        SessionOptions {
            enable_ai: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_ignored_while_stopped() {
        let mut h = harness(RecordedDialog::new());
        h.coordinator.enqueue_reply("Hello");
        assert_eq!(h.coordinator.tick(), TickReport::default());
        assert_eq!(h.listening.start_calls(), 0);
        assert!(h.synthesis.requests().is_empty());
    }

    #[test]
    fn test_double_start_is_rejected() {
        let mut h = harness(RecordedDialog::new());
        h.coordinator.start(&ai_options()).unwrap();
        assert!(h.coordinator.start(&ai_options()).is_err());
        assert_eq!(h.coordinator.state(), CoordinatorState::Running);
    }

    #[test]
    fn test_start_applies_options() {
        let mut h = harness(RecordedDialog::new());
        let options = SessionOptions {
            chat_url: "https://chat.example.com".to_string(),
            chat_endpoint: "/talk".to_string(),
            voice: "nova".to_string(),
            cached_only_replies: true,
            enable_ai: true,
        };
        h.coordinator.start(&options).unwrap();

        assert!(h.coordinator.speech_to_text_active());
        assert!(h.coordinator.text_to_speech_active());
        assert_eq!(h.synthesis.voice(), "nova");
        assert!(h.synthesis.cached_only());
        assert!(h.backend.is_running());
        assert_eq!(
            h.backend.target(),
            ("https://chat.example.com".to_string(), "/talk".to_string())
        );
    }

    #[test]
    fn test_start_without_ai_leaves_backend_alone() {
        let mut h = harness(RecordedDialog::new());
        h.coordinator.start(&SessionOptions::default()).unwrap();
        assert_eq!(h.backend.start_calls(), 0);
        assert_eq!(h.backend.subscriber_count(), 0);

        h.coordinator.submit_user_text("hello");
        assert!(h.backend.sent().is_empty());

        assert!(h.coordinator.stop());
        assert_eq!(h.backend.stop_calls(), 0);
    }

    #[test]
    fn test_stop_releases_subscriptions() {
        let mut h = harness(RecordedDialog::new());
        h.coordinator.start(&ai_options()).unwrap();
        assert_eq!(h.listening.subscriber_count(), 1);
        assert_eq!(h.synthesis.subscriber_count(), 1);
        assert_eq!(h.backend.subscriber_count(), 1);
        assert!(h.coordinator.text_to_speech_active());

        assert!(h.coordinator.stop());
        assert_eq!(h.listening.stop_calls(), 1);
        assert!(!h.coordinator.speech_to_text_active());
        assert!(!h.coordinator.text_to_speech_active());
        assert_eq!(h.listening.subscriber_count(), 0);
        assert_eq!(h.synthesis.subscriber_count(), 0);
        assert_eq!(h.backend.subscriber_count(), 0);
        assert_eq!(h.backend.stop_calls(), 1);
        assert_eq!(h.coordinator.state(), CoordinatorState::Stopped);

        // Stopping again still reports success.
        assert!(h.coordinator.stop());
    }

    #[test]
    fn test_blank_user_text_is_ignored() {
        let mut h = harness(RecordedDialog::new());
        h.coordinator.start(&ai_options()).unwrap();
        h.coordinator.submit_user_text("");
        h.coordinator.submit_user_text("   ");
        assert!(h.backend.sent().is_empty());

        h.coordinator.submit_user_text("What's the weather?");
        assert_eq!(h.backend.sent(), vec!["What's the weather?".to_string()]);
    }

    #[test]
    fn test_cached_only_rewrites_to_fallback() {
        let mut h = harness(RecordedDialog::new());
        let options = SessionOptions {
            cached_only_replies: true,
            enable_ai: true,
            ..Default::default()
        };
        h.coordinator.start(&options).unwrap();
        // Keep playback busy so the resolved message stays queued.
        h.synthesis
            .play_clip(parley_core::AudioClip::new(vec![], 1.0), &Message::new("x", "", ""));

        h.coordinator.enqueue_reply("Hello");
        h.coordinator.tick();

        let head = h.coordinator.queued().next().unwrap();
        assert_eq!(head.text, parley_core::config::DEFAULT_FALLBACK_TEXT);
        assert!(head.has_audio);
        assert!(h.synthesis.requests().is_empty());
    }

    #[test]
    fn test_recorded_text_resolves_without_synthesis() {
        let mut recorded = RecordedDialog::new();
        recorded.insert(RecordedEntry {
            text: "Hello!".to_string(),
            file: "hello.wav".to_string(),
            duration_secs: 0.8,
        });
        let mut h = harness(recorded);
        let (_sub, mut events) = h.coordinator.subscribe();
        h.coordinator.start(&ai_options()).unwrap();

        h.coordinator.enqueue_reply("Hello!");
        let report = h.coordinator.tick();

        assert!(report.requested.is_none());
        assert!(matches!(report.consumed, Some(Consumed::Spoken(_))));
        assert!(h.synthesis.requests().is_empty());
        match events.try_recv().unwrap() {
            CoordinatorEvent::ChatSpeech {
                message,
                duration_secs,
            } => {
                assert_eq!(message.text, "Hello!");
                assert_eq!(duration_secs, 0.8);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_rejected_request_stops_resolution_scan() {
        let mut h = harness(RecordedDialog::new());
        h.coordinator.start(&ai_options()).unwrap();
        h.synthesis.set_reject_requests(true);

        h.coordinator.enqueue_reply("one");
        h.coordinator.enqueue_reply("two");
        // Hold playback so nothing is consumed this tick.
        h.synthesis
            .play_clip(parley_core::AudioClip::new(vec![], 1.0), &Message::new("x", "", ""));
        h.coordinator.tick();

        let queued: Vec<&Message> = h.coordinator.queued().collect();
        assert!(queued[0].is_failed_audio());
        assert_eq!(queued[1].audio_failure_count, 0);
    }

    #[test]
    fn test_empty_message_retired_silently() {
        let mut h = harness(RecordedDialog::new());
        let (_sub, mut events) = h.coordinator.subscribe();
        h.coordinator.start(&SessionOptions {
            cached_only_replies: true,
            ..Default::default()
        })
        .unwrap();

        let mut empty = Message::new("   ", "", "");
        empty.has_audio = true;
        h.coordinator.queue.push(empty);
        let report = h.coordinator.tick();

        assert!(matches!(report.consumed, Some(Consumed::Spoken(_))));
        assert!(events.try_recv().is_err());
        assert!(h.synthesis.played().is_empty());
    }

    #[test]
    fn test_resolved_message_without_audio_reports_failure() {
        let mut h = harness(RecordedDialog::new());
        let (_sub, mut events) = h.coordinator.subscribe();
        h.coordinator.start(&SessionOptions {
            cached_only_replies: true,
            ..Default::default()
        })
        .unwrap();

        // Fallback phrase is not in the (empty) recorded dialog.
        h.coordinator.enqueue_reply("Hello");
        let report = h.coordinator.tick();
        assert!(matches!(report.consumed, Some(Consumed::Failed(_))));

        assert_eq!(
            events.try_recv().unwrap(),
            CoordinatorEvent::SpeakingFailed {
                reason: SpeakingFailure::PlaybackUnavailable
            }
        );
        assert!(matches!(
            events.try_recv().unwrap(),
            CoordinatorEvent::ChatSpeech { duration_secs, .. } if duration_secs == 3.0
        ));
    }

    #[test]
    fn test_listening_flags() {
        let mut h = harness(RecordedDialog::new());
        assert!(!h.coordinator.is_listening_disabled());

        assert!(!h.coordinator.native_recognition_supported());
        h.listening.set_native_supported(true);
        assert!(h.coordinator.native_recognition_supported());
        h.listening.set_native_supported(false);

        h.coordinator.set_muted(true);
        assert!(h.coordinator.is_listening_disabled());
        h.coordinator.set_muted(false);

        h.coordinator.set_push_to_talk_off(true);
        assert!(h.coordinator.is_listening_disabled());
        h.coordinator.set_push_to_talk_off(false);

        h.coordinator.set_ignore_listening(true);
        assert!(h.listening.ignore_listening());
        assert!(h.coordinator.is_listening_disabled());
        h.coordinator.set_ignore_listening(false);

        h.synthesis
            .play_clip(parley_core::AudioClip::new(vec![], 1.0), &Message::new("x", "", ""));
        assert!(h.coordinator.is_speaking());
        assert!(h.coordinator.is_listening_disabled());
    }

    #[test]
    fn test_from_config_applies_flags() {
        let listening = Arc::new(MockListeningService::new());
        let mut config = ParleyConfig::default();
        config.listening.push_to_talk_off = true;
        config.listening.use_native_mode = true;
        config.synthesis.record_all = true;
        config.turn.fallback_text = "Say again?".to_string();

        let coordinator = TurnCoordinator::from_config(
            Collaborators {
                listening: listening.clone(),
                synthesis: Arc::new(MockSynthesisService::new()),
                recorded: Arc::new(RecordedDialog::new()),
                backend: Arc::new(MockChatBackend::new()),
                animation: None,
            },
            &config,
        );

        assert!(coordinator.push_to_talk_off());
        assert!(coordinator.record_all_audio());
        assert!(coordinator.use_native_mode());
        assert!(listening.use_native_mode());
        assert!(!coordinator.is_muted());
    }
}
