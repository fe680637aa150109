//! Character animation sink.

use std::sync::Mutex;

use crate::lock;

/// Plays named character animations for emoji-class replies.
pub trait AnimationSink: Send + Sync {
    fn play(&self, animation_key: &str);
}

/// Animation sink that logs and remembers every key it was asked to play.
#[derive(Debug, Default)]
pub struct RecordingAnimationSink {
    played: Mutex<Vec<String>>,
}

impl RecordingAnimationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<String> {
        lock(&self.played).clone()
    }
}

impl AnimationSink for RecordingAnimationSink {
    fn play(&self, animation_key: &str) {
        tracing::info!(animation = %animation_key, "Playing character animation");
        lock(&self.played).push(animation_key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_keys_in_order() {
        let sink = RecordingAnimationSink::new();
        sink.play("😀");
        sink.play("👋");
        assert_eq!(sink.played(), vec!["😀".to_string(), "👋".to_string()]);
    }
}
