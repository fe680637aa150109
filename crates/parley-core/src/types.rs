use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of failed synthesis attempts after which a message is retired
/// through the failure branch.
pub const FAIL_RETRIES_MAX: u32 = 3;

// =============================================================================
// Audio
// =============================================================================

/// Opaque handle to a synthesized, playable audio clip.
///
/// The bytes are whatever the synthesis backend produced (WAV, MP3, ...).
/// A clip is owned by exactly one [`Message`] until playback consumes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub id: Uuid,
    pub bytes: Vec<u8>,
    pub duration_secs: f32,
    pub created_at: DateTime<Utc>,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, duration_secs: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            bytes,
            duration_secs,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Message
// =============================================================================

/// One unit of outgoing speech or animation.
///
/// Messages are created from chat backend replies and mutated in place by
/// the coordinator's resolution loop until they can be played, animated,
/// or retired as failed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    /// Text to speak, or the animation key for emoji-class messages.
    pub text: String,
    is_emoji: bool,
    pub has_audio: bool,
    pub audio_failure_count: u32,
    #[serde(skip)]
    clip: Option<AudioClip>,
    tone: String,
    timestamp: String,
}

impl Message {
    /// Create a message, classifying it as emoji-class from its text.
    pub fn new(
        text: impl Into<String>,
        tone: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let is_emoji = is_emoji_text(&text);
        Self::with_kind(text, is_emoji, tone.into(), timestamp.into())
    }

    /// Create a message with an explicit emoji classification.
    pub fn with_kind(text: String, is_emoji: bool, tone: String, timestamp: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            is_emoji,
            has_audio: false,
            audio_failure_count: 0,
            clip: None,
            tone,
            timestamp,
        }
    }

    /// Build one message per text, preserving order and provenance.
    pub fn batch(texts: &[String], tone: &str, timestamp: &str) -> Vec<Message> {
        texts
            .iter()
            .map(|text| Message::new(text.as_str(), tone, timestamp))
            .collect()
    }

    pub fn is_emoji(&self) -> bool {
        self.is_emoji
    }

    pub fn tone(&self) -> &str {
        &self.tone
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn is_failed_audio(&self) -> bool {
        self.audio_failure_count >= FAIL_RETRIES_MAX
    }

    /// Mark the message as terminally failed.
    pub fn mark_failed(&mut self) {
        self.audio_failure_count = FAIL_RETRIES_MAX;
    }

    /// Record one failed synthesis attempt. Returns `true` once terminal.
    pub fn record_audio_failure(&mut self) -> bool {
        if self.audio_failure_count < FAIL_RETRIES_MAX {
            self.audio_failure_count += 1;
        }
        self.is_failed_audio()
    }

    /// Attach synthesized audio, making the message playable.
    pub fn attach_clip(&mut self, clip: AudioClip) {
        self.clip = Some(clip);
        self.has_audio = true;
    }

    pub fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    /// Hand the clip to playback. The message no longer owns it afterwards.
    pub fn take_clip(&mut self) -> Option<AudioClip> {
        self.clip.take()
    }
}

const VARIATION_SELECTOR_16: char = '\u{FE0F}';
const COMBINING_KEYCAP: char = '\u{20E3}';

/// Returns whether `text` consists only of emoji.
///
/// Symbols that render as text by default (`❤`, `✔`) count only when followed
/// by the emoji variation selector. Keycaps are `[0-9#*]`, an optional
/// selector, then U+20E3. Skin-tone modifiers, tag sequences and zero-width
/// joiners are allowed between emoji. Whitespace-only text is not emoji.
pub fn is_emoji_text(text: &str) -> bool {
    let mut chars = text.trim().chars().peekable();
    let mut saw_emoji = false;
    while let Some(c) = chars.next() {
        if is_keycap_base(c) {
            chars.next_if_eq(&VARIATION_SELECTOR_16);
            if chars.next_if_eq(&COMBINING_KEYCAP).is_none() {
                return false;
            }
            saw_emoji = true;
        } else if has_emoji_presentation(c) {
            saw_emoji = true;
        } else if has_text_presentation(c) {
            if chars.next_if_eq(&VARIATION_SELECTOR_16).is_none() {
                return false;
            }
            saw_emoji = true;
        } else if !is_emoji_joiner(c) {
            return false;
        }
    }
    saw_emoji
}

fn is_keycap_base(c: char) -> bool {
    c.is_ascii_digit() || c == '#' || c == '*'
}

/// Code points that render as emoji on their own.
fn has_emoji_presentation(c: char) -> bool {
    matches!(
        c as u32,
        0x231A..=0x231B
            | 0x23E9..=0x23EC
            | 0x23F0
            | 0x23F3
            | 0x25FD..=0x25FE
            | 0x2614..=0x2615
            | 0x2648..=0x2653
            | 0x267F
            | 0x2693
            | 0x26A1
            | 0x26AA..=0x26AB
            | 0x26BD..=0x26BE
            | 0x26C4..=0x26C5
            | 0x26CE
            | 0x26D4
            | 0x26EA
            | 0x26F2..=0x26F3
            | 0x26F5
            | 0x26FA
            | 0x26FD
            | 0x2705
            | 0x270A..=0x270B
            | 0x2728
            | 0x274C
            | 0x274E
            | 0x2753..=0x2755
            | 0x2757
            | 0x2795..=0x2797
            | 0x27B0
            | 0x27BF
            | 0x2B1B..=0x2B1C
            | 0x2B50
            | 0x2B55
            | 0x1F004
            | 0x1F0CF
            | 0x1F18E
            | 0x1F191..=0x1F19A
            | 0x1F1E6..=0x1F1FF // regional indicators
            | 0x1F201
            | 0x1F21A
            | 0x1F22F
            | 0x1F232..=0x1F236
            | 0x1F238..=0x1F23A
            | 0x1F250..=0x1F251
            | 0x1F300..=0x1F64F // includes skin-tone modifiers
            | 0x1F680..=0x1F6FF
            | 0x1F7E0..=0x1F7EB
            | 0x1F90C..=0x1F9FF
            | 0x1FA70..=0x1FAFF
    )
}

/// Symbols that are emoji only with U+FE0F.
fn has_text_presentation(c: char) -> bool {
    matches!(
        c as u32,
        0x00A9
            | 0x00AE
            | 0x203C
            | 0x2049
            | 0x2122
            | 0x2139
            | 0x2194..=0x21AA
            | 0x2300..=0x23FF
            | 0x24C2
            | 0x25AA..=0x25FE
            | 0x2600..=0x27BF
            | 0x2934..=0x2935
            | 0x2B05..=0x2B55
            | 0x3030
            | 0x303D
            | 0x3297
            | 0x3299
            | 0x1F000..=0x1F2FF
    )
}

fn is_emoji_joiner(c: char) -> bool {
    matches!(
        c as u32,
        0x200D // zero-width joiner
            | 0xFE0E..=0xFE0F
            | 0xE0020..=0xE007F // tag sequences
    ) || c.is_whitespace()
}
