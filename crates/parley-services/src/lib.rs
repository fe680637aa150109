//! Parley Services crate - collaborator contracts for the turn coordinator.
//!
//! Each external service the coordinator drives (speech-to-text, text-to-speech,
//! recorded dialog, chat backend, character animation) is expressed as a trait
//! with fire-and-forget requests. Completions are published as events through
//! an [`EventHub`](parley_core::EventHub) subscription. Mock implementations
//! allow exercising the coordinator without audio hardware or a network.

pub mod animation;
pub mod backend;
pub mod listening;
pub mod recorded;
pub mod synthesis;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use animation::{AnimationSink, RecordingAnimationSink};
pub use backend::{ChatBackend, MockChatBackend};
pub use listening::{ListeningService, MockListeningService, StartBehavior};
pub use recorded::{RecordedAudioCache, RecordedDialog, RecordedEntry, PLAYED_HISTORY};
pub use synthesis::{MockSynthesisService, SynthesisService};

/// Lock a mock's state, recovering the data if a test thread panicked while
/// holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
