use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParleyError, Result};

/// Default phrase substituted for replies that cannot be synthesized while
/// synthesis is restricted to recorded audio.
pub const DEFAULT_FALLBACK_TEXT: &str = "Try that again. Maybe speak a little clearer.";

/// Top-level configuration for the Parley voice agent.
///
/// Loaded from `~/.parley/config.toml` by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub listening: ListeningConfig,
    #[serde(default)]
    pub turn: TurnConfig,
    #[serde(default)]
    pub recorded: RecordedConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ParleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// The arguments the coordinator is started with.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            chat_url: self.chat.url.clone(),
            chat_endpoint: self.chat.endpoint.clone(),
            voice: self.synthesis.voice.clone(),
            cached_only_replies: self.synthesis.cached_only,
            enable_ai: self.chat.enable_ai,
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Remote chat backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of the chat service. Ignored unless `endpoint` is also set.
    pub url: String,
    /// Endpoint path on the chat service.
    pub endpoint: String,
    /// Whether user text is forwarded to the backend at all.
    pub enable_ai: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            endpoint: String::new(),
            enable_ai: true,
        }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Voice name. Empty keeps the synthesis service's own default.
    pub voice: String,
    /// Restrict replies to recorded audio; live synthesis is disabled.
    pub cached_only: bool,
    /// Route every reply through the recording path instead of live playback.
    pub record_all: bool,
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListeningConfig {
    /// Always-listening mode (no push-to-talk).
    pub push_to_talk_off: bool,
    /// Microphone muted by the user.
    pub muted: bool,
    /// Use the platform's native recognizer, which manages its own restarts.
    pub use_native_mode: bool,
    /// Keep the recognizer running but drop what it hears.
    pub ignore_listening: bool,
}

/// Turn coordinator timing and fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Interval between coordinator ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Nominal duration reported for a reply that failed to produce audio.
    pub failed_speech_duration_secs: f32,
    /// Phrase spoken instead of replies that have no recorded audio in
    /// cached-only mode.
    pub fallback_text: String,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 33,
            failed_speech_duration_secs: 3.0,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
        }
    }
}

/// Recorded dialog settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedConfig {
    /// Path to a JSON manifest of pre-recorded phrases.
    pub manifest: Option<String>,
}

/// Arguments for starting a coordinator session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOptions {
    pub chat_url: String,
    pub chat_endpoint: String,
    pub voice: String,
    pub cached_only_replies: bool,
    pub enable_ai: bool,
}

impl SessionOptions {
    /// Backend endpoint override, present only when both parts are set.
    pub fn chat_target(&self) -> Option<(&str, &str)> {
        if self.chat_url.is_empty() || self.chat_endpoint.is_empty() {
            None
        } else {
            Some((self.chat_url.as_str(), self.chat_endpoint.as_str()))
        }
    }

    /// Voice override, present only when non-empty.
    pub fn voice_override(&self) -> Option<&str> {
        if self.voice.is_empty() {
            None
        } else {
            Some(self.voice.as_str())
        }
    }
}
