//! Voice Chat Store - local persistence for a voice-messaging chat app
//!
//! Stores conversations, text and voice messages, and timestamped reactions
//! and replies on voice messages. Each collection is a JSON document in an
//! embedded key-value store; recordings live in a managed audio directory.
//!
//! # Features
//!
//! - Conversation list with previews and unread counts
//! - Voice messages with waveforms, tags and mock transcription
//! - Reactions and replies anchored to a position in the audio
//! - Repair of legacy message documents on read
//! - Export to multiple formats (TXT, CSV, JSON)
//! - Simulated network latency

/// Companion audio files
pub mod audio;
/// Configuration management
pub mod config;
/// Error types
pub mod error;
/// Conversation export
pub mod export;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Chat data-access layer
pub mod service;
/// Key-value storage
pub mod store;
/// Tag normalization
pub mod tags;
/// Mock transcription
pub mod transcription;
/// Formatting helpers
pub mod utils;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use error::{ChatStoreError, Result};
pub use models::{Conversation, Message, MessageContent, MessageKind, NewAudioMessage, OutputFormat, Reaction, Reply};
pub use service::{ChatService, StoreStats};
pub use store::{KeyValueStore, SledStore};
