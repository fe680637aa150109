pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::{ParleyConfig, SessionOptions};
pub use error::{ParleyError, Result};
pub use events::{
    BackendEvent, CoordinatorEvent, EventHub, ListeningEvent, SpeakingFailure, Subscription,
    SynthesisEvent,
};
pub use types::*;
