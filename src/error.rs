//! Error types for the voice-chat-store library.
//!
//! Every fallible store operation returns [`Result`], which carries a
//! [`ChatStoreError`]. Lower-level failures (sled, I/O, JSON) convert into it
//! through `From` so call sites can use `?` directly.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing the chat store.
#[derive(Error, Debug)]
pub enum ChatStoreError {
    /// Key-value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Conversation not found
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// Message not found
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Operation requires a voice message
    #[error("Message {0} is not a voice message")]
    NotAudioMessage(String),

    /// Audio file referenced by a message or request does not exist
    #[error("Audio file missing: {}", .0.display())]
    AudioFileMissing(PathBuf),

    /// Rejected user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

impl ChatStoreError {
    /// Short, stable label used for metrics and structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::ConversationNotFound(_) => "conversation_not_found",
            Self::MessageNotFound(_) => "message_not_found",
            Self::NotAudioMessage(_) => "not_audio_message",
            Self::AudioFileMissing(_) => "audio_file_missing",
            Self::InvalidInput(_) => "invalid_input",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Csv(_) => "csv",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for Result with `ChatStoreError`
pub type Result<T> = std::result::Result<T, ChatStoreError>;

impl From<anyhow::Error> for ChatStoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<sled::Error> for ChatStoreError {
    fn from(err: sled::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sled_error_maps_to_storage() {
        let err: ChatStoreError = sled::Error::Unsupported("nope".to_string()).into();
        assert_eq!(err.kind(), "storage");
        assert!(err.to_string().starts_with("Storage error"));
    }

    #[test]
    fn test_audio_missing_message_includes_path() {
        let err = ChatStoreError::AudioFileMissing(PathBuf::from("/tmp/voice_1.m4a"));
        assert_eq!(err.to_string(), "Audio file missing: /tmp/voice_1.m4a");
    }
}
