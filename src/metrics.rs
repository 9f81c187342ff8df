use std::time::Duration;

use anyhow::Result;
use metrics::{counter, gauge, histogram};

/// Metric names emitted by the chat store
pub struct StoreMetrics {
    // Store operation metrics
    pub operations_total: &'static str,
    pub operation_duration: &'static str,

    // Message metrics
    pub messages_sent_total: &'static str,
    pub messages_received_total: &'static str,
    pub messages_deleted_total: &'static str,
    pub messages_repaired_total: &'static str,

    // Annotation metrics
    pub reactions_total: &'static str,
    pub replies_total: &'static str,

    // Audio metrics
    pub audio_bytes_imported: &'static str,
    pub audio_files_removed_total: &'static str,
    pub transcriptions_total: &'static str,

    // Gauges
    pub conversations: &'static str,

    // Error metrics
    pub errors_total: &'static str,
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self {
            operations_total: "voice_chat_operations_total",
            operation_duration: "voice_chat_operation_duration_seconds",

            messages_sent_total: "voice_chat_messages_sent_total",
            messages_received_total: "voice_chat_messages_received_total",
            messages_deleted_total: "voice_chat_messages_deleted_total",
            messages_repaired_total: "voice_chat_messages_repaired_total",

            reactions_total: "voice_chat_reactions_total",
            replies_total: "voice_chat_replies_total",

            audio_bytes_imported: "voice_chat_audio_bytes_imported",
            audio_files_removed_total: "voice_chat_audio_files_removed_total",
            transcriptions_total: "voice_chat_transcriptions_total",

            conversations: "voice_chat_conversations",

            errors_total: "voice_chat_errors_total",
        }
    }
}

impl StoreMetrics {
    /// Install a no-op global recorder.
    ///
    /// Fails if a recorder is already installed.
    pub fn init() -> Result<()> {
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| anyhow::anyhow!("Failed to initialize metrics recorder: {}", e))?;

        Ok(())
    }

    /// Record one store operation
    pub fn record_operation(&self, operation: &'static str, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };

        counter!(self.operations_total, "operation" => operation, "status" => status).increment(1);
        histogram!(self.operation_duration, "operation" => operation).record(duration.as_secs_f64());
    }

    /// Record a sent message
    pub fn record_message_sent(&self, kind: &'static str) {
        counter!(self.messages_sent_total, "type" => kind).increment(1);
    }

    /// Record an incoming message
    pub fn record_message_received(&self) {
        counter!(self.messages_received_total).increment(1);
    }

    /// Record a deleted message
    pub fn record_message_deleted(&self) {
        counter!(self.messages_deleted_total).increment(1);
    }

    /// Record stored messages fixed up on read
    pub fn record_messages_repaired(&self, count: usize) {
        counter!(self.messages_repaired_total).increment(count as u64);
    }

    /// Record a new reaction or reply
    pub fn record_annotation(&self, is_reply: bool) {
        if is_reply {
            counter!(self.replies_total).increment(1);
        } else {
            counter!(self.reactions_total).increment(1);
        }
    }

    /// Record an imported recording
    pub fn record_audio_imported(&self, bytes: u64) {
        counter!(self.audio_bytes_imported).increment(bytes);
    }

    /// Record audio files removed from disk
    pub fn record_audio_removed(&self, count: usize) {
        counter!(self.audio_files_removed_total).increment(count as u64);
    }

    /// Record a transcription
    pub fn record_transcription(&self) {
        counter!(self.transcriptions_total).increment(1);
    }

    /// Update the number of stored conversations
    #[allow(clippy::cast_precision_loss)]
    pub fn set_conversations(&self, count: usize) {
        gauge!(self.conversations).set(count as f64);
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &'static str, operation: &'static str) {
        counter!(self.errors_total, "type" => error_type, "operation" => operation).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_names() {
        let metrics = StoreMetrics::default();
        assert_eq!(metrics.operations_total, "voice_chat_operations_total");
        assert!(metrics.errors_total.starts_with("voice_chat_"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let metrics = StoreMetrics::default();
        metrics.record_operation("get_messages", Duration::from_millis(5), true);
        metrics.record_error("storage", "get_messages");
        metrics.set_conversations(3);
    }
}
