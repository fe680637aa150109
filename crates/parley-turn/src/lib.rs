//! Parley Turn crate - turn-taking coordinator for a conversational voice agent.
//!
//! The `TurnCoordinator` sits between speech recognition, speech synthesis,
//! a remote chat backend and a character animation sink. Replies from the
//! backend are queued as messages, resolved to audio (recorded, synthesized,
//! or a fallback phrase) and then played or animated strictly in arrival
//! order, one per tick. The same tick keeps the recognizer alive and reports
//! when it cannot be restarted.
//!
//! Lifecycle: Stopped -> Starting -> Running -> Stopped.

pub mod coordinator;
pub mod queue;
pub mod retry;
pub mod state;

pub use coordinator::{Collaborators, Consumed, TickReport, TurnCoordinator};
pub use queue::OutgoingQueue;
pub use retry::{ListeningRetry, RetryOutcome, MAX_FAILED_LISTEN_ATTEMPTS};
pub use state::CoordinatorState;
