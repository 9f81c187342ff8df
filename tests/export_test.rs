use chrono::{TimeZone, Utc};
use tempfile::tempdir;
use voice_chat_store::export::{render_body, write_conversation};
use voice_chat_store::models::AudioContent;
use voice_chat_store::{Conversation, Message, MessageContent, OutputFormat};

fn sample_thread() -> (Conversation, Vec<Message>) {
    let conversation = Conversation::new("Phil", None);
    let text = Message {
        id: "m1".to_string(),
        conversation_id: conversation.id.clone(),
        sender_id: conversation.participant_id.clone(),
        sender_name: "Phil".to_string(),
        timestamp: Utc.with_ymd_and_hms(2025, 1, 20, 12, 21, 19).unwrap(),
        content: MessageContent::Text {
            text: "Hey, are you coming, Jess?".to_string(),
        },
    };
    let voice = Message {
        id: "m2".to_string(),
        conversation_id: conversation.id.clone(),
        sender_id: "current-user".to_string(),
        sender_name: "Jess".to_string(),
        timestamp: Utc.with_ymd_and_hms(2025, 1, 20, 12, 22, 28).unwrap(),
        content: MessageContent::Audio(AudioContent {
            audio_uri: "/data/audio/voice_1.m4a".to_string(),
            duration_ms: 75_000,
            waveform: vec![0.3, 0.7],
            tags: vec!["plans".to_string()],
            transcript: Some("On my way".to_string()),
        }),
    };
    (conversation, vec![text, voice])
}

#[test]
fn test_render_body() {
    let (_, messages) = sample_thread();
    assert_eq!(render_body(&messages[0]), "Hey, are you coming, Jess?");
    assert_eq!(render_body(&messages[1]), "[voice 1:15] #plans \"On my way\"");
}

#[test]
fn test_export_txt() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let (conversation, messages) = sample_thread();

    let path = write_conversation(&conversation, &messages, OutputFormat::Txt, temp_dir.path()).unwrap();
    assert_eq!(path, temp_dir.path().join("phil.txt"));

    let content = std::fs::read_to_string(&path).unwrap();
    let expected = "Phil, Jan 20, 2025 12:21:19 PM, Hey, are you coming, Jess?\n\n\
                    Jess, Jan 20, 2025 12:22:28 PM, [voice 1:15] #plans \"On my way\"\n\n";
    assert_eq!(content, expected);
}

#[test]
fn test_export_csv() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let (conversation, messages) = sample_thread();

    let path = write_conversation(&conversation, &messages, OutputFormat::Csv, temp_dir.path()).unwrap();
    let mut reader = csv::Reader::from_path(&path).unwrap();

    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers, vec!["ID", "Sender", "Datetime", "Type", "Message"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "1");
    assert_eq!(&rows[0][3], "text");
    assert_eq!(&rows[0][4], "Hey, are you coming, Jess?");
    assert_eq!(&rows[1][1], "Jess");
    assert_eq!(&rows[1][3], "audio");
}

#[test]
fn test_export_json() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let (conversation, messages) = sample_thread();

    let path = write_conversation(&conversation, &messages, OutputFormat::Json, temp_dir.path()).unwrap();
    let document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(document["conversation"]["participantName"], "Phil");
    assert_eq!(document["messages"][0]["type"], "text");
    assert_eq!(document["messages"][1]["type"], "audio");
    assert_eq!(document["messages"][1]["duration"], 75_000);
    assert_eq!(document["messages"][1]["tags"][0], "plans");
}

#[test]
fn test_export_empty_conversation() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_dir = temp_dir.path().join("nested").join("out");
    let conversation = Conversation::new("Nobody", None);

    let path = write_conversation(&conversation, &[], OutputFormat::Txt, &output_dir).unwrap();
    assert!(path.exists());
    assert_eq!(std::fs::read_to_string(path).unwrap(), "");
}

#[test]
fn test_output_format_parsing() {
    assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
    assert_eq!("TXT".parse::<OutputFormat>().unwrap(), OutputFormat::Txt);
    assert_eq!(OutputFormat::Json.extension(), "json");
    assert!("pdf".parse::<OutputFormat>().is_err());
}
