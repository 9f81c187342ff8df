use std::path::Path;

use crate::error::{ChatStoreError, Result};

/// Longest text message or reply accepted
pub const MAX_TEXT_CHARS: usize = 4000;
/// Longest participant name accepted
pub const MAX_NAME_CHARS: usize = 100;
/// Longest voice message accepted (10 minutes)
pub const MAX_AUDIO_DURATION_MS: u64 = 10 * 60 * 1000;

fn invalid(msg: impl Into<String>) -> ChatStoreError {
    ChatStoreError::InvalidInput(msg.into())
}

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate participant name
    pub fn validate_participant_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(invalid("Participant name cannot be empty"));
        }

        if name.chars().count() > MAX_NAME_CHARS {
            return Err(invalid(format!("Participant name too long (max {MAX_NAME_CHARS} characters)")));
        }

        // Names end up in previews and exports on a single line
        if name.contains('\0') || name.contains('\r') || name.contains('\n') {
            return Err(invalid("Participant name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate a text message or reply body, returning the sanitized text
    pub fn validate_text(text: &str) -> Result<String> {
        let sanitized = Self::sanitize_text(text);
        if sanitized.is_empty() {
            return Err(invalid("Message text cannot be empty"));
        }

        if sanitized.chars().count() > MAX_TEXT_CHARS {
            return Err(invalid(format!("Message text too long (max {MAX_TEXT_CHARS} characters)")));
        }

        Ok(sanitized)
    }

    /// Validate a reaction emoji
    pub fn validate_emoji(emoji: &str) -> Result<()> {
        if emoji.is_empty() {
            return Err(invalid("Reaction emoji cannot be empty"));
        }

        // Flags and skin-tone sequences span several code points
        if emoji.chars().count() > 8 {
            return Err(invalid("Reaction must be a single emoji"));
        }

        if emoji.chars().any(|c| c.is_whitespace() || c.is_control() || c.is_ascii_alphanumeric()) {
            return Err(invalid("Reaction must be a single emoji"));
        }

        Ok(())
    }

    /// Validate a recording duration
    pub fn validate_audio_duration(duration_ms: u64) -> Result<()> {
        if duration_ms == 0 {
            return Err(invalid("Voice message duration must be greater than 0"));
        }

        if duration_ms > MAX_AUDIO_DURATION_MS {
            return Err(invalid(format!(
                "Voice message too long (max {} minutes)",
                MAX_AUDIO_DURATION_MS / 60_000
            )));
        }

        Ok(())
    }

    /// Validate that `position_ms` falls inside a voice message
    pub fn validate_position(position_ms: u64, duration_ms: u64) -> Result<()> {
        if position_ms > duration_ms {
            return Err(invalid(format!(
                "Position {position_ms}ms is past the end of the voice message ({duration_ms}ms)"
            )));
        }

        Ok(())
    }

    /// Validate waveform amplitudes
    pub fn validate_waveform(waveform: &[f32]) -> Result<()> {
        if waveform.iter().any(|v| !v.is_finite() || !(0.0..=1.0).contains(v)) {
            return Err(invalid("Waveform amplitudes must be between 0.0 and 1.0"));
        }

        Ok(())
    }

    /// Validate a recording path handed over by the recorder.
    ///
    /// Only the path itself is checked; whether the file exists is decided by
    /// [`crate::audio::AudioStorage::import_recording`].
    pub fn validate_recording_path(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(invalid("Recording path cannot be empty"));
        }

        if path.file_name().is_none() {
            return Err(invalid(format!("Recording path has no file name: {}", path.display())));
        }

        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>()
            .trim()
            .to_string()
    }
}
