//! Parley application binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Initialize logging
//! 3. Build the collaborators (in-process mocks plus the recorded dialog)
//! 4. Start the turn coordinator and drive it from a fixed-rate interval
//!
//! The chat backend echoes whatever the simulated user says, which is enough
//! to exercise recognition, queueing, synthesis and playback end to end.

mod cli;

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tokio::time::MissedTickBehavior;

use parley_core::config::ParleyConfig;
use parley_core::events::CoordinatorEvent;
use parley_services::{
    MockChatBackend, MockListeningService, MockSynthesisService, RecordedDialog,
    RecordingAnimationSink,
};
use parley_turn::{Collaborators, TurnCoordinator};

use cli::CliArgs;

/// Rough length of a spoken utterance, for the simulated recognizer.
fn utterance_secs(text: &str) -> f32 {
    text.split_whitespace().count() as f32 * 0.4
}

fn load_recorded_dialog(args: &CliArgs, config: &ParleyConfig) -> RecordedDialog {
    let Some(path) = args.resolve_manifest(config.recorded.manifest.as_deref()) else {
        return RecordedDialog::new();
    };
    match RecordedDialog::load(&path) {
        Ok(dialog) => dialog,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Recorded dialog unavailable");
            RecordedDialog::new()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ParleyConfig::load_or_default(&config_file);
    if args.cached_only {
        config.synthesis.cached_only = true;
    }

    // Tracing. RUST_LOG wins over --log-level, which wins over the config.
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Collaborators.
    let listening = Arc::new(MockListeningService::new());
    let synthesis = Arc::new(MockSynthesisService::new());
    let backend = Arc::new(MockChatBackend::echo());
    let animation = Arc::new(RecordingAnimationSink::new());
    let recorded = Arc::new(load_recorded_dialog(&args, &config));

    let mut coordinator = TurnCoordinator::from_config(
        Collaborators {
            listening: listening.clone(),
            synthesis: synthesis.clone(),
            recorded,
            backend,
            animation: Some(animation.clone()),
        },
        &config,
    );
    let (_subscription, mut events) = coordinator.subscribe();
    coordinator.start(&config.session_options())?;

    // Tick loop.
    let tick_every = Duration::from_millis(config.turn.tick_interval_ms.max(1));
    let mut interval = tokio::time::interval(tick_every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut script = args.say.iter();
    let say_every = args.say_every.max(1);
    let mut playback_ends: Option<Instant> = None;
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                tracing::info!("Interrupted");
                break;
            }
        }
        if args.ticks.is_some_and(|max| ticks >= max) {
            break;
        }

        if ticks % say_every == 0 {
            if let Some(line) = script.next() {
                if !listening.hear(line, utterance_secs(line)) {
                    tracing::debug!(text = %line, "Recognizer not listening, utterance lost");
                }
            }
        }

        let report = coordinator.tick();
        ticks += 1;
        if let Some(consumed) = report.consumed {
            tracing::debug!(?consumed, tick = ticks, "Queue advanced");
        }

        // Synthesis finishes one tick after it was requested.
        synthesis.complete_pending();

        while let Ok(event) = events.try_recv() {
            if args.json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!(error = %e, "Event not serializable"),
                }
            }
            match &event {
                CoordinatorEvent::UserSpeechText { text, duration_secs } => {
                    tracing::info!(text = %text, duration_secs, "User said");
                    coordinator.submit_user_text(text);
                }
                CoordinatorEvent::ChatSpeech {
                    message,
                    duration_secs,
                } => {
                    tracing::info!(
                        message_id = %message.id,
                        text = %message.text,
                        duration_secs,
                        "Agent speaking"
                    );
                    playback_ends =
                        Some(Instant::now() + Duration::from_secs_f32(duration_secs.max(0.0)));
                }
                CoordinatorEvent::SpeakingFailed { reason } => {
                    tracing::warn!(?reason, "Speaking failed");
                }
                other => tracing::debug!(event = other.event_name(), "Unhandled event"),
            }
        }

        if playback_ends.is_some_and(|end| Instant::now() >= end) {
            synthesis.finish_playback();
            playback_ends = None;
        }
    }

    coordinator.stop();
    tracing::info!(
        ticks,
        spoken = synthesis.played().len(),
        animated = animation.played().len(),
        pending = coordinator.queue_len(),
        "Parley shut down"
    );

    Ok(())
}
