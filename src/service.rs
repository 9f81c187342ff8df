//! The chat data-access layer.
//!
//! [`ChatService`] plays the part of a backend for the mobile client. Each
//! collection lives as one JSON document in a [`KeyValueStore`]; every
//! operation loads the documents it needs, scans them, and writes the changed
//! ones back. Writes that touch more than one document go through
//! [`KeyValueStore::set_items`] so they land together, and read-modify-write
//! cycles are serialized by an async mutex.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::audio::{generate_waveform, AudioStorage, DEFAULT_WAVEFORM_BARS};
use crate::config::AppConfig;
use crate::error::{ChatStoreError, Result};
use crate::export;
use crate::logging::OperationTimer;
use crate::metrics::StoreMetrics;
use crate::models::{
    new_id, AudioContent, Conversation, Message, MessageContent, NewAudioMessage, OutputFormat, Participant,
    Reaction, Repaired, Reply, StoredMessage,
};
use crate::store::{keys, KeyValueStore, SledStore};
use crate::tags::{extract_hashtags, merge_tags, normalize_tag};
use crate::transcription::{MockTranscriber, Transcript};
use crate::validation::InputValidator;

type MessageMap = BTreeMap<String, Vec<Message>>;
type ReactionMap = BTreeMap<String, Vec<Reaction>>;
type ReplyMap = BTreeMap<String, Vec<Reply>>;

/// Counts across the whole store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Stored conversations
    pub conversations: usize,
    /// Stored messages of either kind
    pub messages: usize,
    /// Stored voice messages
    pub voice_messages: usize,
    /// Reactions across all voice messages
    pub reactions: usize,
    /// Replies across all voice messages
    pub replies: usize,
    /// Files in the audio directory
    pub audio_files: usize,
}

/// Local stand-in for the chat backend
pub struct ChatService {
    store: Box<dyn KeyValueStore>,
    audio: AudioStorage,
    transcriber: MockTranscriber,
    current_user: Participant,
    latency: Duration,
    seed_sample_data: bool,
    write_lock: Mutex<()>,
    metrics: StoreMetrics,
}

impl ChatService {
    /// Build a service over an existing store
    #[must_use]
    pub fn new(store: Box<dyn KeyValueStore>, audio: AudioStorage, config: &AppConfig) -> Self {
        Self {
            store,
            audio,
            transcriber: MockTranscriber::new(config.transcription_delay()),
            current_user: Participant {
                id: config.user.id.clone(),
                name: config.user.name.clone(),
            },
            latency: config.latency(),
            seed_sample_data: config.storage.seed_sample_data,
            write_lock: Mutex::new(()),
            metrics: StoreMetrics::default(),
        }
    }

    /// Open the sled store and audio directory named in `config`
    pub fn open(config: &AppConfig) -> Result<Self> {
        let store = SledStore::open(&config.data_dir())?;
        Ok(Self::new(Box::new(store), AudioStorage::new(config.audio_dir()), config))
    }

    /// The managed audio directory
    #[must_use]
    pub const fn audio_storage(&self) -> &AudioStorage {
        &self.audio
    }

    /// Prepare the audio directory and seed sample data into an empty store.
    ///
    /// Returns the number of conversations seeded.
    pub async fn initialize(&self) -> Result<usize> {
        self.track("initialize", async {
            self.audio.ensure_dir().await?;

            let _guard = self.write_lock.lock().await;
            let conversations: Vec<Conversation> = self.load(keys::CONVERSATIONS).await?;
            if !conversations.is_empty() || !self.seed_sample_data {
                self.metrics.set_conversations(conversations.len());
                return Ok(0);
            }

            let (conversations, messages) = self.sample_data();
            let seeded = conversations.len();
            self.store
                .set_items(vec![
                    encode(keys::CONVERSATIONS, &conversations)?,
                    encode(keys::MESSAGES, &messages)?,
                ])
                .await?;

            self.metrics.set_conversations(seeded);
            info!(conversations = seeded, "Seeded sample conversations");
            Ok(seeded)
        })
        .await
    }

    /// All conversations, most recent activity first
    pub async fn get_conversations(&self) -> Result<Vec<Conversation>> {
        self.track("get_conversations", async {
            let mut conversations: Vec<Conversation> = self.load(keys::CONVERSATIONS).await?;
            // None sorts below Some, so empty conversations end up last
            conversations.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
            Ok(conversations)
        })
        .await
    }

    /// One conversation by id
    pub async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        self.track("get_conversation", async {
            let conversations: Vec<Conversation> = self.load(keys::CONVERSATIONS).await?;
            Ok(conversations.into_iter().find(|c| c.id == conversation_id))
        })
        .await
    }

    /// Find the conversation with `participant_name`, creating it if needed
    pub async fn get_or_create_conversation(
        &self,
        participant_name: &str,
        participant_avatar: Option<String>,
    ) -> Result<Conversation> {
        self.track("get_or_create_conversation", async {
            InputValidator::validate_participant_name(participant_name)?;
            let participant_name = participant_name.trim();

            let _guard = self.write_lock.lock().await;
            let mut conversations: Vec<Conversation> = self.load(keys::CONVERSATIONS).await?;
            if let Some(existing) = conversations.iter().find(|c| c.participant_name == participant_name) {
                return Ok(existing.clone());
            }

            let conversation = Conversation::new(participant_name, participant_avatar);
            conversations.push(conversation.clone());
            self.store
                .set_item(keys::CONVERSATIONS, serde_json::to_string(&conversations)?)
                .await?;

            self.metrics.set_conversations(conversations.len());
            info!(conversation_id = %conversation.id, participant = participant_name, "Created conversation");
            Ok(conversation)
        })
        .await
    }

    /// Messages of a conversation in send order
    pub async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.track("get_messages", async {
            let _guard = self.write_lock.lock().await;
            let (mut messages, repaired) = self.load_messages().await?;
            if repaired > 0 {
                self.store
                    .set_item(keys::MESSAGES, serde_json::to_string(&messages)?)
                    .await?;
                info!(repaired, "Wrote back repaired messages");
            }
            Ok(messages.remove(conversation_id).unwrap_or_default())
        })
        .await
    }

    /// Send a text message as the current user
    pub async fn send_text_message(&self, conversation_id: &str, text: &str) -> Result<Message> {
        self.track("send_text_message", async {
            let text = InputValidator::validate_text(text)?;
            let sender = self.current_user.clone();

            let _guard = self.write_lock.lock().await;
            let message = self
                .append_message(conversation_id, &sender, MessageContent::Text { text }, false)
                .await?;

            self.metrics.record_message_sent(message.kind().as_str());
            Ok(message)
        })
        .await
    }

    /// Store a recording as a voice message from the current user
    pub async fn send_audio_message(&self, conversation_id: &str, recording: NewAudioMessage) -> Result<Message> {
        self.track("send_audio_message", async {
            InputValidator::validate_audio_duration(recording.duration_ms)?;
            InputValidator::validate_recording_path(&recording.source_path)?;
            if let Some(waveform) = &recording.waveform {
                InputValidator::validate_waveform(waveform)?;
            }

            let _guard = self.write_lock.lock().await;
            let conversations: Vec<Conversation> = self.load(keys::CONVERSATIONS).await?;
            if !conversations.iter().any(|c| c.id == conversation_id) {
                return Err(ChatStoreError::ConversationNotFound(conversation_id.to_string()));
            }

            let audio_path = self.audio.import_recording(&recording.source_path).await?;
            let audio_uri = audio_path.to_string_lossy().into_owned();

            let mut tags = Vec::new();
            merge_tags(&mut tags, &recording.tags);
            let content = MessageContent::Audio(AudioContent {
                audio_uri: audio_uri.clone(),
                duration_ms: recording.duration_ms,
                waveform: recording
                    .waveform
                    .unwrap_or_else(|| generate_waveform(DEFAULT_WAVEFORM_BARS)),
                tags,
                transcript: None,
            });

            let sender = self.current_user.clone();
            match self.append_message(conversation_id, &sender, content, false).await {
                Ok(message) => {
                    if let Ok(bytes) = self.audio.file_size(&audio_uri).await {
                        self.metrics.record_audio_imported(bytes);
                    }
                    self.metrics.record_message_sent(message.kind().as_str());
                    Ok(message)
                }
                Err(e) => {
                    // Don't leave an unreferenced copy behind
                    if let Err(cleanup) = self.audio.delete(&audio_uri).await {
                        warn!(audio_uri = %audio_uri, error = %cleanup, "Failed to remove imported recording");
                    }
                    Err(e)
                }
            }
        })
        .await
    }

    /// Record a text message from the conversation's participant
    pub async fn receive_text_message(&self, conversation_id: &str, text: &str) -> Result<Message> {
        self.track("receive_text_message", async {
            let text = InputValidator::validate_text(text)?;

            let _guard = self.write_lock.lock().await;
            let conversations: Vec<Conversation> = self.load(keys::CONVERSATIONS).await?;
            let sender = conversations
                .iter()
                .find(|c| c.id == conversation_id)
                .map(|c| Participant {
                    id: c.participant_id.clone(),
                    name: c.participant_name.clone(),
                })
                .ok_or_else(|| ChatStoreError::ConversationNotFound(conversation_id.to_string()))?;

            let message = self
                .append_message(conversation_id, &sender, MessageContent::Text { text }, true)
                .await?;

            self.metrics.record_message_received();
            Ok(message)
        })
        .await
    }

    /// Clear the unread state of a conversation
    pub async fn mark_as_read(&self, conversation_id: &str) -> Result<Conversation> {
        self.track("mark_as_read", async {
            let _guard = self.write_lock.lock().await;
            let mut conversations: Vec<Conversation> = self.load(keys::CONVERSATIONS).await?;
            let conversation = find_conversation_mut(&mut conversations, conversation_id)?;
            conversation.mark_read();
            let updated = conversation.clone();

            self.store
                .set_item(keys::CONVERSATIONS, serde_json::to_string(&conversations)?)
                .await?;
            Ok(updated)
        })
        .await
    }

    /// Delete a message with its reactions, replies and audio file
    pub async fn delete_message(&self, conversation_id: &str, message_id: &str) -> Result<Message> {
        self.track("delete_message", async {
            let _guard = self.write_lock.lock().await;
            let mut conversations: Vec<Conversation> = self.load(keys::CONVERSATIONS).await?;
            let (mut messages, _) = self.load_messages().await?;
            let mut reactions: ReactionMap = self.load(keys::REACTIONS).await?;
            let mut replies: ReplyMap = self.load(keys::REPLIES).await?;

            let conversation = find_conversation_mut(&mut conversations, conversation_id)?;
            let thread = messages.entry(conversation_id.to_string()).or_default();
            let index = thread
                .iter()
                .position(|m| m.id == message_id)
                .ok_or_else(|| ChatStoreError::MessageNotFound(message_id.to_string()))?;
            let removed = thread.remove(index);

            match thread.last() {
                Some(last) => conversation.apply_preview(last),
                None => conversation.clear_preview(),
            }
            let dropped_reactions = reactions.remove(message_id).map_or(0, |r| r.len());
            let dropped_replies = replies.remove(message_id).map_or(0, |r| r.len());

            self.store
                .set_items(vec![
                    encode(keys::CONVERSATIONS, &conversations)?,
                    encode(keys::MESSAGES, &messages)?,
                    encode(keys::REACTIONS, &reactions)?,
                    encode(keys::REPLIES, &replies)?,
                ])
                .await?;

            // The records are gone; a leftover file is only wasted space
            if let Some(audio) = removed.audio() {
                match self.audio.delete(&audio.audio_uri).await {
                    Ok(true) => self.metrics.record_audio_removed(1),
                    Ok(false) => {}
                    Err(e) => warn!(audio_uri = %audio.audio_uri, error = %e, "Failed to delete audio file"),
                }
            }

            self.metrics.record_message_deleted();
            info!(
                conversation_id,
                message_id,
                dropped_reactions,
                dropped_replies,
                "Deleted message"
            );
            Ok(removed)
        })
        .await
    }

    /// React to a voice message at `position_ms`
    pub async fn add_reaction(&self, message_id: &str, emoji: &str, position_ms: u64) -> Result<Reaction> {
        self.track("add_reaction", async {
            InputValidator::validate_emoji(emoji)?;

            let _guard = self.write_lock.lock().await;
            self.check_position(message_id, position_ms).await?;

            let reaction = Reaction {
                id: new_id(),
                message_id: message_id.to_string(),
                user_id: self.current_user.id.clone(),
                user_name: self.current_user.name.clone(),
                emoji: emoji.to_string(),
                position_ms,
                created_at: Utc::now(),
            };

            let mut reactions: ReactionMap = self.load(keys::REACTIONS).await?;
            reactions.entry(message_id.to_string()).or_default().push(reaction.clone());
            self.store
                .set_item(keys::REACTIONS, serde_json::to_string(&reactions)?)
                .await?;

            self.metrics.record_annotation(false);
            debug!(message_id, emoji, position_ms, "Added reaction");
            Ok(reaction)
        })
        .await
    }

    /// Reactions on a message in the order they were added
    pub async fn get_reactions(&self, message_id: &str) -> Result<Vec<Reaction>> {
        self.track("get_reactions", async {
            let mut reactions: ReactionMap = self.load(keys::REACTIONS).await?;
            Ok(reactions.remove(message_id).unwrap_or_default())
        })
        .await
    }

    /// Remove one reaction. Returns `false` when it did not exist.
    pub async fn remove_reaction(&self, message_id: &str, reaction_id: &str) -> Result<bool> {
        self.track("remove_reaction", async {
            let _guard = self.write_lock.lock().await;
            let mut reactions: ReactionMap = self.load(keys::REACTIONS).await?;
            let Some(list) = reactions.get_mut(message_id) else {
                return Ok(false);
            };

            let before = list.len();
            list.retain(|r| r.id != reaction_id);
            if list.len() == before {
                return Ok(false);
            }
            if list.is_empty() {
                reactions.remove(message_id);
            }

            self.store
                .set_item(keys::REACTIONS, serde_json::to_string(&reactions)?)
                .await?;
            Ok(true)
        })
        .await
    }

    /// Reply to a voice message at `position_ms`
    pub async fn add_reply(&self, message_id: &str, text: &str, position_ms: u64) -> Result<Reply> {
        self.track("add_reply", async {
            let text = InputValidator::validate_text(text)?;

            let _guard = self.write_lock.lock().await;
            self.check_position(message_id, position_ms).await?;

            let reply = Reply {
                id: new_id(),
                message_id: message_id.to_string(),
                user_id: self.current_user.id.clone(),
                user_name: self.current_user.name.clone(),
                text,
                position_ms,
                created_at: Utc::now(),
            };

            let mut replies: ReplyMap = self.load(keys::REPLIES).await?;
            replies.entry(message_id.to_string()).or_default().push(reply.clone());
            self.store
                .set_item(keys::REPLIES, serde_json::to_string(&replies)?)
                .await?;

            self.metrics.record_annotation(true);
            debug!(message_id, position_ms, "Added reply");
            Ok(reply)
        })
        .await
    }

    /// Replies on a message in the order they were added
    pub async fn get_replies(&self, message_id: &str) -> Result<Vec<Reply>> {
        self.track("get_replies", async {
            let mut replies: ReplyMap = self.load(keys::REPLIES).await?;
            Ok(replies.remove(message_id).unwrap_or_default())
        })
        .await
    }

    /// Add one tag to a voice message, returning the updated tag list
    pub async fn add_tag(&self, conversation_id: &str, message_id: &str, tag: &str) -> Result<Vec<String>> {
        self.track("add_tag", async {
            let tag = normalize_tag(tag).ok_or_else(|| invalid_tag(tag))?;
            self.update_voice_message(conversation_id, message_id, |audio| {
                merge_tags(&mut audio.tags, [tag.as_str()]);
                audio.tags.clone()
            })
            .await
        })
        .await
    }

    /// Remove one tag from a voice message, returning the updated tag list
    pub async fn remove_tag(&self, conversation_id: &str, message_id: &str, tag: &str) -> Result<Vec<String>> {
        self.track("remove_tag", async {
            let tag = normalize_tag(tag).ok_or_else(|| invalid_tag(tag))?;
            self.update_voice_message(conversation_id, message_id, |audio| {
                audio.tags.retain(|t| *t != tag);
                audio.tags.clone()
            })
            .await
        })
        .await
    }

    /// Replace the tags of a voice message
    pub async fn set_tags(&self, conversation_id: &str, message_id: &str, tags: &[String]) -> Result<Vec<String>> {
        self.track("set_tags", async {
            if let Some(bad) = tags.iter().find(|t| normalize_tag(t).is_none()) {
                return Err(invalid_tag(bad));
            }
            self.update_voice_message(conversation_id, message_id, |audio| {
                audio.tags.clear();
                merge_tags(&mut audio.tags, tags);
                audio.tags.clone()
            })
            .await
        })
        .await
    }

    /// Every voice message carrying `tag`, oldest first
    pub async fn messages_with_tag(&self, tag: &str) -> Result<Vec<Message>> {
        self.track("messages_with_tag", async {
            let tag = normalize_tag(tag).ok_or_else(|| invalid_tag(tag))?;
            let (messages, _) = self.load_messages().await?;

            let mut tagged: Vec<Message> = messages
                .into_values()
                .flatten()
                .filter(|m| m.audio().is_some_and(|a| a.tags.contains(&tag)))
                .collect();
            tagged.sort_by_key(|m| m.timestamp);
            Ok(tagged)
        })
        .await
    }

    /// Transcribe a voice message and store the transcript on it
    pub async fn transcribe_message(&self, conversation_id: &str, message_id: &str) -> Result<Transcript> {
        self.track("transcribe_message", async {
            let (messages, _) = self.load_messages().await?;
            let message = messages
                .get(conversation_id)
                .and_then(|thread| thread.iter().find(|m| m.id == message_id))
                .ok_or_else(|| ChatStoreError::MessageNotFound(message_id.to_string()))?;
            if message.audio().is_none() {
                return Err(ChatStoreError::NotAudioMessage(message_id.to_string()));
            }

            // Not holding the write lock while the transcriber waits
            let transcript = self.transcriber.transcribe(message).await;
            let hashtags = extract_hashtags(&transcript.text);
            let text = transcript.text.clone();
            self.update_voice_message(conversation_id, message_id, move |audio| {
                audio.transcript = Some(text);
                merge_tags(&mut audio.tags, &hashtags);
            })
            .await?;

            self.metrics.record_transcription();
            Ok(transcript)
        })
        .await
    }

    /// Delete audio files no stored message points at
    pub async fn prune_orphaned_audio(&self) -> Result<Vec<PathBuf>> {
        self.track("prune_orphaned_audio", async {
            let _guard = self.write_lock.lock().await;
            let (messages, _) = self.load_messages().await?;
            let referenced = messages
                .values()
                .flatten()
                .filter_map(Message::audio)
                .map(|a| a.audio_uri.as_str());

            let removed = self.audio.prune_orphans(referenced).await?;
            self.metrics.record_audio_removed(removed.len());
            Ok(removed)
        })
        .await
    }

    /// Write a conversation transcript into `output_dir`
    pub async fn export_conversation(
        &self,
        conversation_id: &str,
        format: OutputFormat,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        self.track("export_conversation", async {
            let conversations: Vec<Conversation> = self.load(keys::CONVERSATIONS).await?;
            let conversation = conversations
                .into_iter()
                .find(|c| c.id == conversation_id)
                .ok_or_else(|| ChatStoreError::ConversationNotFound(conversation_id.to_string()))?;
            let (mut messages, _) = self.load_messages().await?;
            let thread = messages.remove(conversation_id).unwrap_or_default();

            let path = export::write_conversation(&conversation, &thread, format, output_dir)?;
            info!(conversation_id, path = %path.display(), messages = thread.len(), "Exported conversation");
            Ok(path)
        })
        .await
    }

    /// Counts across the whole store
    pub async fn stats(&self) -> Result<StoreStats> {
        self.track("stats", async {
            let conversations: Vec<Conversation> = self.load(keys::CONVERSATIONS).await?;
            let (messages, _) = self.load_messages().await?;
            let reactions: ReactionMap = self.load(keys::REACTIONS).await?;
            let replies: ReplyMap = self.load(keys::REPLIES).await?;

            let all = messages.values().flatten();
            Ok(StoreStats {
                conversations: conversations.len(),
                messages: messages.values().map(Vec::len).sum(),
                voice_messages: all.filter(|m| m.audio().is_some()).count(),
                reactions: reactions.values().map(Vec::len).sum(),
                replies: replies.values().map(Vec::len).sum(),
                audio_files: self.audio.list_files().await?.len(),
            })
        })
        .await
    }

    /// Remove every stored record and audio file
    pub async fn clear_all(&self) -> Result<()> {
        self.track("clear_all", async {
            let _guard = self.write_lock.lock().await;
            for key in keys::ALL {
                self.store.remove_item(key).await?;
            }
            let removed = self.audio.clear().await?;

            self.metrics.record_audio_removed(removed);
            self.metrics.set_conversations(0);
            warn!(audio_files = removed, "Cleared all chat data");
            Ok(())
        })
        .await
    }

    /// Wait out the simulated latency, run `operation`, and record the outcome
    async fn track<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let timer = OperationTimer::new(operation);
        let result = fut.await;
        self.metrics.record_operation(operation, timer.elapsed(), result.is_ok());
        if let Err(e) = &result {
            self.metrics.record_error(e.kind(), operation);
            warn!(operation, error = %e, "Store operation failed");
        }
        result
    }

    async fn load<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.store.get_item(key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(T::default()),
        }
    }

    /// Load every message, repairing legacy documents on the way.
    ///
    /// Returns the messages and how many needed fixing or were dropped.
    async fn load_messages(&self) -> Result<(MessageMap, usize)> {
        let stored: BTreeMap<String, serde_json::Value> = self.load(keys::MESSAGES).await?;

        let mut repaired = 0;
        let mut messages = MessageMap::new();
        for (conversation_id, thread) in stored {
            let serde_json::Value::Array(thread) = thread else {
                repaired += 1;
                warn!(conversation_id = %conversation_id, "Dropping message thread that is not a list");
                continue;
            };

            let mut kept = Vec::with_capacity(thread.len());
            for value in thread {
                match StoredMessage::repair_value(value, &conversation_id) {
                    Repaired::Intact(message) => kept.push(message),
                    Repaired::Fixed(message) => {
                        repaired += 1;
                        kept.push(message);
                    }
                    Repaired::Unrecoverable(id) => {
                        repaired += 1;
                        warn!(conversation_id = %conversation_id, message_id = %id, "Dropping unreadable message");
                    }
                }
            }
            messages.insert(conversation_id, kept);
        }

        if repaired > 0 {
            self.metrics.record_messages_repaired(repaired);
        }
        Ok((messages, repaired))
    }

    /// Append a message and update the conversation preview in one write.
    /// Caller holds the write lock.
    async fn append_message(
        &self,
        conversation_id: &str,
        sender: &Participant,
        content: MessageContent,
        incoming: bool,
    ) -> Result<Message> {
        let mut conversations: Vec<Conversation> = self.load(keys::CONVERSATIONS).await?;
        let (mut messages, _) = self.load_messages().await?;

        let conversation = find_conversation_mut(&mut conversations, conversation_id)?;
        let message = Message {
            id: new_id(),
            conversation_id: conversation_id.to_string(),
            sender_id: sender.id.clone(),
            sender_name: sender.name.clone(),
            timestamp: Utc::now(),
            content,
        };

        conversation.apply_preview(&message);
        if incoming {
            conversation.mark_unread();
        }
        messages
            .entry(conversation_id.to_string())
            .or_default()
            .push(message.clone());

        self.store
            .set_items(vec![
                encode(keys::CONVERSATIONS, &conversations)?,
                encode(keys::MESSAGES, &messages)?,
            ])
            .await?;

        debug!(conversation_id, message_id = %message.id, kind = message.kind().as_str(), "Appended message");
        Ok(message)
    }

    /// Apply `update` to a voice message and persist it
    async fn update_voice_message<R>(
        &self,
        conversation_id: &str,
        message_id: &str,
        update: impl FnOnce(&mut AudioContent) -> R,
    ) -> Result<R> {
        let _guard = self.write_lock.lock().await;
        let (mut messages, _) = self.load_messages().await?;

        let message = messages
            .get_mut(conversation_id)
            .and_then(|thread| thread.iter_mut().find(|m| m.id == message_id))
            .ok_or_else(|| ChatStoreError::MessageNotFound(message_id.to_string()))?;
        let audio = message
            .audio_mut()
            .ok_or_else(|| ChatStoreError::NotAudioMessage(message_id.to_string()))?;
        let result = update(audio);

        self.store
            .set_item(keys::MESSAGES, serde_json::to_string(&messages)?)
            .await?;
        Ok(result)
    }

    /// Check that `position_ms` lies inside the voice message `message_id`
    async fn check_position(&self, message_id: &str, position_ms: u64) -> Result<()> {
        let (messages, _) = self.load_messages().await?;
        let message = messages
            .values()
            .flatten()
            .find(|m| m.id == message_id)
            .ok_or_else(|| ChatStoreError::MessageNotFound(message_id.to_string()))?;
        let audio = message
            .audio()
            .ok_or_else(|| ChatStoreError::NotAudioMessage(message_id.to_string()))?;

        InputValidator::validate_position(position_ms, audio.duration_ms)
    }

    fn sample_data(&self) -> (Vec<Conversation>, MessageMap) {
        let samples: [(&str, &str, &[(bool, &str)]); 3] = [
            (
                "Emma Wilson",
                "https://i.pravatar.cc/150?img=1",
                &[
                    (false, "Hey! Are we still on for coffee tomorrow?"),
                    (true, "Yes! 10am at the usual place?"),
                    (false, "Perfect, see you there ☕"),
                ],
            ),
            (
                "James Chen",
                "https://i.pravatar.cc/150?img=3",
                &[
                    (true, "Did you get a chance to look at the slides?"),
                    (false, "Going through them now, sending notes as a voice memo soon"),
                ],
            ),
            (
                "Sofia Martinez",
                "https://i.pravatar.cc/150?img=5",
                &[(false, "Welcome to voice chat! Hold the mic button to record.")],
            ),
        ];

        let now = Utc::now();
        let mut conversations = Vec::new();
        let mut messages = MessageMap::new();

        for (hours_ago, (name, avatar, lines)) in (1_i64..).zip(samples) {
            let mut conversation = Conversation::new(name, Some(avatar.to_string()));
            conversation.created_at = now - ChronoDuration::hours(hours_ago * 24);
            let mut thread = Vec::new();

            for (minute, (from_me, text)) in (0_i64..).zip(lines.iter().copied()) {
                let sender = if from_me {
                    self.current_user.clone()
                } else {
                    Participant {
                        id: conversation.participant_id.clone(),
                        name: conversation.participant_name.clone(),
                    }
                };
                let message = Message {
                    id: new_id(),
                    conversation_id: conversation.id.clone(),
                    sender_id: sender.id,
                    sender_name: sender.name,
                    timestamp: now - ChronoDuration::hours(hours_ago) + ChronoDuration::minutes(minute),
                    content: MessageContent::Text { text: text.to_string() },
                };
                conversation.apply_preview(&message);
                if !from_me {
                    conversation.mark_unread();
                }
                thread.push(message);
            }

            messages.insert(conversation.id.clone(), thread);
            conversations.push(conversation);
        }

        (conversations, messages)
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<(String, String)> {
    Ok((key.to_string(), serde_json::to_string(value)?))
}

fn find_conversation_mut<'a>(
    conversations: &'a mut [Conversation],
    conversation_id: &str,
) -> Result<&'a mut Conversation> {
    conversations
        .iter_mut()
        .find(|c| c.id == conversation_id)
        .ok_or_else(|| ChatStoreError::ConversationNotFound(conversation_id.to_string()))
}

fn invalid_tag(tag: &str) -> ChatStoreError {
    ChatStoreError::InvalidInput(format!("invalid tag: {tag:?}"))
}
