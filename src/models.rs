//! Data models for conversations, messages and their annotations
//!
//! These are the records persisted as JSON blobs in the key-value store.
//! Field names serialize in camelCase so the stored documents keep the shape
//! the mobile client writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::utils::{format_duration, truncate_preview};

/// Kind of message, stored under the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text message
    Text,
    /// Voice message backed by an audio file
    Audio,
}

impl MessageKind {
    /// Lowercase name as stored on disk
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
        }
    }
}

/// A chat thread between the current user and one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Conversation identifier
    pub id: String,
    /// Identifier of the other participant
    pub participant_id: String,
    /// Display name of the other participant
    pub participant_name: String,
    /// Avatar URI for the participant
    #[serde(default)]
    pub participant_avatar: Option<String>,
    /// Preview of the most recent message
    #[serde(default)]
    pub last_message: Option<String>,
    /// Time of the most recent message
    #[serde(default)]
    pub last_message_time: Option<DateTime<Utc>>,
    /// Kind of the most recent message
    #[serde(default)]
    pub last_message_type: Option<MessageKind>,
    /// True when every incoming message has been seen
    #[serde(default = "default_true")]
    pub is_read: bool,
    /// Number of incoming messages not yet seen
    #[serde(default)]
    pub unread_count: u32,
    /// When the conversation was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

const fn default_true() -> bool {
    true
}

impl Conversation {
    /// Create an empty conversation with a participant
    #[must_use]
    pub fn new(participant_name: &str, participant_avatar: Option<String>) -> Self {
        Self {
            id: new_id(),
            participant_id: new_id(),
            participant_name: participant_name.to_string(),
            participant_avatar,
            last_message: None,
            last_message_time: None,
            last_message_type: None,
            is_read: true,
            unread_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Point the preview fields at `message`
    pub fn apply_preview(&mut self, message: &Message) {
        self.last_message = Some(message.preview());
        self.last_message_time = Some(message.timestamp);
        self.last_message_type = Some(message.kind());
    }

    /// Reset the preview fields after the last message is gone
    pub fn clear_preview(&mut self) {
        self.last_message = None;
        self.last_message_time = None;
        self.last_message_type = None;
    }

    /// Record an incoming message the user has not seen yet
    pub fn mark_unread(&mut self) {
        self.is_read = false;
        self.unread_count = self.unread_count.saturating_add(1);
    }

    /// Mark every message in the conversation as seen
    pub fn mark_read(&mut self) {
        self.is_read = true;
        self.unread_count = 0;
    }
}

/// Payload of a voice message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioContent {
    /// Path of the audio file inside the managed audio directory
    pub audio_uri: String,
    /// Duration in milliseconds
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    /// Normalized amplitudes in `[0.0, 1.0]`
    #[serde(default)]
    pub waveform: Vec<f32>,
    /// Normalized tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Transcript, once the message has been transcribed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

/// Type-specific message fields, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    /// Text message
    Text {
        /// Message body
        text: String,
    },
    /// Voice message
    Audio(AudioContent),
}

/// A message within a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message identifier
    pub id: String,
    /// Owning conversation
    pub conversation_id: String,
    /// Sender identifier
    pub sender_id: String,
    /// Sender display name
    pub sender_name: String,
    /// Time the message was sent
    pub timestamp: DateTime<Utc>,
    /// Text or audio payload
    #[serde(flatten)]
    pub content: MessageContent,
}

impl Message {
    /// Kind of this message
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self.content {
            MessageContent::Text { .. } => MessageKind::Text,
            MessageContent::Audio(_) => MessageKind::Audio,
        }
    }

    /// Audio payload, if this is a voice message
    #[must_use]
    pub const fn audio(&self) -> Option<&AudioContent> {
        match &self.content {
            MessageContent::Audio(audio) => Some(audio),
            MessageContent::Text { .. } => None,
        }
    }

    /// Mutable audio payload, if this is a voice message
    pub fn audio_mut(&mut self) -> Option<&mut AudioContent> {
        match &mut self.content {
            MessageContent::Audio(audio) => Some(audio),
            MessageContent::Text { .. } => None,
        }
    }

    /// Text shown in the conversation list for this message
    #[must_use]
    pub fn preview(&self) -> String {
        match &self.content {
            MessageContent::Text { text } => truncate_preview(text, PREVIEW_MAX_CHARS),
            MessageContent::Audio(audio) => {
                format!("🎤 Voice message ({})", format_duration(audio.duration_ms))
            }
        }
    }
}

/// Maximum characters of a text message shown as a conversation preview
pub const PREVIEW_MAX_CHARS: usize = 50;

/// Lenient on-disk form of a message.
///
/// Older documents may lack `type` or the list fields; [`StoredMessage::repair`]
/// turns them into a [`Message`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    id: String,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<MessageKind>,
    #[serde(default)]
    sender_id: Option<String>,
    #[serde(default)]
    sender_name: Option<String>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    audio_uri: Option<String>,
    #[serde(default, rename = "duration")]
    duration_ms: Option<u64>,
    #[serde(default)]
    waveform: Option<Vec<f32>>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    transcript: Option<String>,
}

/// Outcome of repairing one stored message
#[derive(Debug)]
pub enum Repaired {
    /// The document was already well formed
    Intact(Message),
    /// Missing fields were filled in
    Fixed(Message),
    /// Neither text nor audio could be recovered
    Unrecoverable(String),
}

impl StoredMessage {
    /// Decode one raw stored message and repair it.
    ///
    /// A document that does not decode at all (unknown `type`, no `id`) is
    /// unrecoverable; it never fails the surrounding collection.
    #[must_use]
    pub fn repair_value(value: serde_json::Value, conversation_id: &str) -> Repaired {
        let id = value
            .get("id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        match serde_json::from_value::<Self>(value) {
            Ok(stored) => stored.repair(conversation_id),
            Err(e) => {
                debug!(conversation_id, message_id = %id, error = %e, "Stored message does not decode");
                Repaired::Unrecoverable(id)
            }
        }
    }

    /// Rebuild a [`Message`], inferring a missing `type` from the payload
    #[must_use]
    pub fn repair(self, conversation_id: &str) -> Repaired {
        let mut fixed = self.kind.is_none()
            || self.conversation_id.is_none()
            || self.sender_id.is_none()
            || self.timestamp.is_none();

        let kind = match self.kind {
            Some(kind) => kind,
            None if self.audio_uri.is_some() => MessageKind::Audio,
            None if self.text.is_some() => MessageKind::Text,
            None => return Repaired::Unrecoverable(self.id),
        };

        let content = match kind {
            MessageKind::Text => match self.text {
                Some(text) => MessageContent::Text { text },
                None => return Repaired::Unrecoverable(self.id),
            },
            MessageKind::Audio => {
                let Some(audio_uri) = self.audio_uri else {
                    return Repaired::Unrecoverable(self.id);
                };
                fixed |= self.waveform.is_none() || self.tags.is_none() || self.duration_ms.is_none();
                MessageContent::Audio(AudioContent {
                    audio_uri,
                    duration_ms: self.duration_ms.unwrap_or_default(),
                    waveform: self.waveform.unwrap_or_default(),
                    tags: self.tags.unwrap_or_default(),
                    transcript: self.transcript,
                })
            }
        };

        let message = Message {
            id: self.id,
            conversation_id: self.conversation_id.unwrap_or_else(|| conversation_id.to_string()),
            sender_id: self.sender_id.unwrap_or_default(),
            sender_name: self.sender_name.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            content,
        };

        if fixed {
            Repaired::Fixed(message)
        } else {
            Repaired::Intact(message)
        }
    }
}

/// An emoji reaction anchored to a position in a voice message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    /// Reaction identifier
    pub id: String,
    /// Voice message this reaction belongs to
    pub message_id: String,
    /// Reacting user
    pub user_id: String,
    /// Reacting user's display name
    pub user_name: String,
    /// Emoji
    pub emoji: String,
    /// Offset into the audio in milliseconds
    #[serde(rename = "timestamp")]
    pub position_ms: u64,
    /// When the reaction was added
    pub created_at: DateTime<Utc>,
}

/// A text reply anchored to a position in a voice message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    /// Reply identifier
    pub id: String,
    /// Voice message this reply belongs to
    pub message_id: String,
    /// Replying user
    pub user_id: String,
    /// Replying user's display name
    pub user_name: String,
    /// Reply body
    pub text: String,
    /// Offset into the audio in milliseconds
    #[serde(rename = "timestamp")]
    pub position_ms: u64,
    /// When the reply was added
    pub created_at: DateTime<Utc>,
}

/// Request to store a freshly recorded voice message
#[derive(Debug, Clone, Default)]
pub struct NewAudioMessage {
    /// Recording produced by the recorder, outside the audio directory
    pub source_path: std::path::PathBuf,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Waveform captured while recording; generated when absent
    pub waveform: Option<Vec<f32>>,
    /// Tags as typed by the user
    pub tags: Vec<String>,
}

/// A person taking part in the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// User identifier
    pub id: String,
    /// Display name
    pub name: String,
}

/// Output format for exported conversations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// Plain text format
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::error::ChatStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(crate::error::ChatStoreError::InvalidInput(format!(
                "unknown export format: {other}"
            ))),
        }
    }
}

/// Generate a fresh record identifier
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
