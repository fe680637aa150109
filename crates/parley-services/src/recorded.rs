//! Pre-recorded dialog lookup.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use parley_core::error::{ParleyError, Result};
use parley_core::types::Message;

use crate::lock;

/// How many recent plays `RecordedDialog` remembers.
pub const PLAYED_HISTORY: usize = 32;

/// Lookup of pre-recorded audio for known phrases.
pub trait RecordedAudioCache: Send + Sync {
    /// Whether a recording exists for exactly this text.
    fn exists(&self, text: &str) -> bool;

    /// Play the recording for `message` if there is one.
    ///
    /// Returns the playback duration in seconds, or `0.0` when nothing played.
    fn play_if_present(&self, message: &Message) -> f32;
}

/// One recorded phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEntry {
    pub text: String,
    /// Audio file, relative to the manifest.
    pub file: String,
    pub duration_secs: f32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    entries: Vec<RecordedEntry>,
}

/// In-memory recorded dialog, optionally loaded from a JSON manifest:
///
/// ```json
/// { "entries": [ { "text": "Hello!", "file": "hello.wav", "duration_secs": 0.8 } ] }
/// ```
///
/// Lookups ignore leading and trailing whitespace. Only the last
/// [`PLAYED_HISTORY`] plays are kept.
#[derive(Debug, Default)]
pub struct RecordedDialog {
    entries: HashMap<String, RecordedEntry>,
    played: Mutex<VecDeque<String>>,
}

impl RecordedDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&content)?;
        let mut dialog = Self::new();
        for entry in manifest.entries {
            if entry.duration_secs <= 0.0 {
                return Err(ParleyError::RecordedAudio(format!(
                    "entry '{}' has non-positive duration {}",
                    entry.text, entry.duration_secs
                )));
            }
            dialog.insert(entry);
        }
        tracing::info!(
            path = %path.display(),
            entries = dialog.len(),
            "Recorded dialog loaded"
        );
        Ok(dialog)
    }

    pub fn insert(&mut self, entry: RecordedEntry) {
        self.entries.insert(entry.text.trim().to_string(), entry);
    }

    pub fn get(&self, text: &str) -> Option<&RecordedEntry> {
        self.entries.get(text.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recently played texts, oldest first.
    pub fn played(&self) -> Vec<String> {
        lock(&self.played).iter().cloned().collect()
    }
}

impl RecordedAudioCache for RecordedDialog {
    fn exists(&self, text: &str) -> bool {
        self.get(text).is_some()
    }

    fn play_if_present(&self, message: &Message) -> f32 {
        match self.get(&message.text) {
            Some(entry) => {
                tracing::debug!(
                    message_id = %message.id,
                    file = %entry.file,
                    "Playing recorded dialog"
                );
                let mut played = lock(&self.played);
                if played.len() == PLAYED_HISTORY {
                    played.pop_front();
                }
                played.push_back(entry.text.clone());
                entry.duration_secs
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(text: &str, duration_secs: f32) -> RecordedEntry {
        RecordedEntry {
            text: text.to_string(),
            file: format!("{}.wav", text.len()),
            duration_secs,
        }
    }

    #[test]
    fn test_exists_ignores_surrounding_whitespace() {
        let mut dialog = RecordedDialog::new();
        dialog.insert(entry("Hello!", 0.8));
        assert!(dialog.exists("Hello!"));
        assert!(dialog.exists("  Hello!\n"));
        assert!(!dialog.exists("hello!"));
        assert!(!dialog.exists("Goodbye"));
    }

    #[test]
    fn test_play_if_present() {
        let mut dialog = RecordedDialog::new();
        dialog.insert(entry("Hello!", 0.8));

        let hit = Message::new("Hello!", "", "");
        let miss = Message::new("Unknown", "", "");
        assert_eq!(dialog.play_if_present(&hit), 0.8);
        assert_eq!(dialog.play_if_present(&miss), 0.0);
        assert_eq!(dialog.played(), vec!["Hello!".to_string()]);
    }

    #[test]
    fn test_play_history_is_bounded() {
        let mut dialog = RecordedDialog::new();
        dialog.insert(entry("Hello!", 0.8));
        dialog.insert(entry("Bye!", 0.5));
        let hello = Message::new("Hello!", "", "");
        let bye = Message::new("Bye!", "", "");

        for _ in 0..PLAYED_HISTORY * 3 {
            dialog.play_if_present(&hello);
        }
        dialog.play_if_present(&bye);

        let played = dialog.played();
        assert_eq!(played.len(), PLAYED_HISTORY);
        assert_eq!(played.last().unwrap(), "Bye!");
        assert!(played[..PLAYED_HISTORY - 1].iter().all(|t| t == "Hello!"));
    }

    #[test]
    fn test_load_manifest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{ "entries": [
                { "text": "Hello!", "file": "hello.wav", "duration_secs": 0.8 },
                { "text": "Try that again. Maybe speak a little clearer.", "file": "retry.wav", "duration_secs": 2.4 }
            ] }"#,
        )
        .unwrap();

        let dialog = RecordedDialog::load(file.path()).unwrap();
        assert_eq!(dialog.len(), 2);
        assert_eq!(dialog.get("Hello!").unwrap().file, "hello.wav");
        assert!(dialog.exists("Try that again. Maybe speak a little clearer."));
    }

    #[test]
    fn test_load_rejects_non_positive_duration() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "entries": [ { "text": "x", "file": "x.wav", "duration_secs": 0.0 } ] }"#)
            .unwrap();
        let result = RecordedDialog::load(file.path());
        assert!(matches!(result, Err(ParleyError::RecordedAudio(_))));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        let result = RecordedDialog::load(file.path());
        assert!(matches!(result, Err(ParleyError::Serialization(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = RecordedDialog::load(Path::new("/nonexistent/dialog.json"));
        assert!(matches!(result, Err(ParleyError::Io(_))));
    }
}
