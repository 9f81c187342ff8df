//! Conversation export.
//!
//! Writes one conversation to a single file in TXT, CSV or JSON. Voice
//! messages are rendered by their duration, tags and transcript, since the
//! audio itself stays in the audio directory.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::error::Result;
use crate::models::{Conversation, Message, MessageContent, OutputFormat};
use crate::utils::format_duration;

const TIMESTAMP_FORMAT: &str = "%b %d, %Y %r";

/// Write `messages` of `conversation` into `output_dir`.
///
/// The file is named after the participant and the format's extension.
/// Returns the path of the written file.
pub fn write_conversation(
    conversation: &Conversation,
    messages: &[Message],
    format: OutputFormat,
    output_dir: &Path,
) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    let file_path = output_dir.join(format!(
        "{}.{}",
        file_stem(&conversation.participant_name),
        format.extension()
    ));

    match format {
        OutputFormat::Txt => write_txt_file(messages, &file_path)?,
        OutputFormat::Csv => write_csv_file(messages, &file_path)?,
        OutputFormat::Json => write_json_file(conversation, messages, &file_path)?,
    }

    Ok(file_path)
}

/// One-line rendering of a message body
#[must_use]
pub fn render_body(message: &Message) -> String {
    match &message.content {
        MessageContent::Text { text } => text.clone(),
        MessageContent::Audio(audio) => {
            let mut body = format!("[voice {}]", format_duration(audio.duration_ms));
            if !audio.tags.is_empty() {
                body.push(' ');
                body.push_str(
                    &audio
                        .tags
                        .iter()
                        .map(|t| format!("#{t}"))
                        .collect::<Vec<_>>()
                        .join(" "),
                );
            }
            if let Some(transcript) = &audio.transcript {
                body.push_str(&format!(" \"{transcript}\""));
            }
            body
        }
    }
}

fn file_stem(participant_name: &str) -> String {
    let stem: String = participant_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if stem.trim_matches('_').is_empty() {
        "conversation".to_string()
    } else {
        stem
    }
}

/// Write messages to a text file.
///
/// Format: `sender, timestamp, body\n\n` (blank line between messages)
fn write_txt_file(messages: &[Message], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);

    for message in messages {
        writeln!(
            writer,
            "{}, {}, {}",
            message.sender_name,
            message.timestamp.format(TIMESTAMP_FORMAT),
            render_body(message)
        )?;
        writeln!(writer)?; // Add blank line between messages
    }

    writer.flush()?;
    Ok(())
}

/// Write messages to a CSV file.
///
/// Includes header row: `ID, Sender, Datetime, Type, Message`
fn write_csv_file(messages: &[Message], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["ID", "Sender", "Datetime", "Type", "Message"])?;

    for (i, message) in messages.iter().enumerate() {
        let id = (i + 1).to_string();
        let sent_at = message.timestamp.format(TIMESTAMP_FORMAT).to_string();
        let body = render_body(message);
        writer.write_record([
            id.as_str(),
            message.sender_name.as_str(),
            sent_at.as_str(),
            message.kind().as_str(),
            body.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the conversation and its messages to a JSON file.
fn write_json_file(conversation: &Conversation, messages: &[Message], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let writer = BufWriter::new(file);

    let document = serde_json::json!({
        "conversation": conversation,
        "messages": messages,
    });

    serde_json::to_writer_pretty(writer, &document)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_sanitizes_names() {
        assert_eq!(file_stem("Emma Wilson"), "emma_wilson");
        assert_eq!(file_stem("../.."), "conversation");
    }
}
