//! Integration tests for validation.rs

use std::path::Path;

use voice_chat_store::validation::{InputValidator, MAX_AUDIO_DURATION_MS, MAX_NAME_CHARS, MAX_TEXT_CHARS};
use voice_chat_store::ChatStoreError;

#[test]
fn test_validate_participant_name_valid() {
    assert!(InputValidator::validate_participant_name("Emma Wilson").is_ok());
    assert!(InputValidator::validate_participant_name("José Ñúñez").is_ok());
}

#[test]
fn test_validate_participant_name_empty() {
    assert!(InputValidator::validate_participant_name("").is_err());
    assert!(InputValidator::validate_participant_name("   ").is_err());
}

#[test]
fn test_validate_participant_name_length() {
    let name = "a".repeat(MAX_NAME_CHARS);
    assert!(InputValidator::validate_participant_name(&name).is_ok());

    let long_name = "a".repeat(MAX_NAME_CHARS + 1);
    assert!(InputValidator::validate_participant_name(&long_name).is_err());
}

#[test]
fn test_validate_participant_name_control_chars() {
    assert!(InputValidator::validate_participant_name("Emma\0Wilson").is_err());
    assert!(InputValidator::validate_participant_name("Emma\nWilson").is_err());
    assert!(InputValidator::validate_participant_name("Emma\rWilson").is_err());
}

#[test]
fn test_validate_text_trims() {
    assert_eq!(InputValidator::validate_text("  hello  ").unwrap(), "hello");
    assert_eq!(InputValidator::validate_text("line one\nline two").unwrap(), "line one\nline two");
}

#[test]
fn test_validate_text_empty_after_sanitizing() {
    let err = InputValidator::validate_text("\u{7}\u{8}  ").unwrap_err();
    assert!(matches!(err, ChatStoreError::InvalidInput(_)));
}

#[test]
fn test_validate_text_length() {
    assert!(InputValidator::validate_text(&"x".repeat(MAX_TEXT_CHARS)).is_ok());
    assert!(InputValidator::validate_text(&"x".repeat(MAX_TEXT_CHARS + 1)).is_err());
    // Counted in characters, not bytes
    assert!(InputValidator::validate_text(&"é".repeat(MAX_TEXT_CHARS)).is_ok());
}

#[test]
fn test_validate_emoji() {
    for emoji in ["👍", "❤️", "😂", "🇫🇷", "👍🏽"] {
        assert!(InputValidator::validate_emoji(emoji).is_ok(), "{emoji} should be accepted");
    }
    for bad in ["", "ok", "👍 👍", "a👍"] {
        assert!(InputValidator::validate_emoji(bad).is_err(), "{bad:?} should be rejected");
    }
}

#[test]
fn test_validate_audio_duration() {
    assert!(InputValidator::validate_audio_duration(1).is_ok());
    assert!(InputValidator::validate_audio_duration(MAX_AUDIO_DURATION_MS).is_ok());
    assert!(InputValidator::validate_audio_duration(0).is_err());
    assert!(InputValidator::validate_audio_duration(MAX_AUDIO_DURATION_MS + 1).is_err());
}

#[test]
fn test_validate_position() {
    assert!(InputValidator::validate_position(0, 0).is_ok());
    assert!(InputValidator::validate_position(1_500, 3_000).is_ok());
    assert!(InputValidator::validate_position(3_001, 3_000).is_err());
}

#[test]
fn test_validate_waveform() {
    assert!(InputValidator::validate_waveform(&[]).is_ok());
    assert!(InputValidator::validate_waveform(&[0.0, 0.5, 1.0]).is_ok());
    assert!(InputValidator::validate_waveform(&[-0.1]).is_err());
    assert!(InputValidator::validate_waveform(&[1.01]).is_err());
    assert!(InputValidator::validate_waveform(&[f32::NAN]).is_err());
}

#[test]
fn test_validate_recording_path() {
    assert!(InputValidator::validate_recording_path(Path::new("/tmp/memo.m4a")).is_ok());
    // Existence is checked when the file is imported, not here
    assert!(InputValidator::validate_recording_path(Path::new("/no/such/dir/memo.m4a")).is_ok());

    let empty = InputValidator::validate_recording_path(Path::new("")).unwrap_err();
    assert!(matches!(empty, ChatStoreError::InvalidInput(_)));

    let no_name = InputValidator::validate_recording_path(Path::new("/")).unwrap_err();
    assert!(matches!(no_name, ChatStoreError::InvalidInput(_)));
}

#[test]
fn test_sanitize_text_keeps_tabs_and_newlines() {
    assert_eq!(InputValidator::sanitize_text("a\tb\nc\u{0}"), "a\tb\nc");
}
