#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use voice_chat_store::config::AppConfig;
use voice_chat_store::export::render_body;
use voice_chat_store::logging::{init_logging, OperationTimer};
use voice_chat_store::metrics::StoreMetrics;
use voice_chat_store::utils::format_duration;
use voice_chat_store::{ChatService, Conversation, Message, NewAudioMessage, OutputFormat};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Skip the simulated network delay
    #[arg(long, global = true)]
    no_latency: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List conversations, most recent first
    Conversations,
    /// Start (or find) a conversation with a participant
    NewConversation {
        /// Participant display name
        #[arg(short, long)]
        name: String,

        /// Avatar URI
        #[arg(short, long)]
        avatar: Option<String>,
    },
    /// Show the messages of a conversation
    Messages {
        /// Conversation id
        #[arg(short, long)]
        conversation: String,
    },
    /// Send a text message
    SendText {
        #[arg(short, long)]
        conversation: String,

        /// Message text
        text: String,
    },
    /// Send a recording as a voice message
    SendAudio {
        #[arg(short, long)]
        conversation: String,

        /// Recording to import
        #[arg(short, long)]
        file: PathBuf,

        /// Duration in milliseconds
        #[arg(short, long)]
        duration_ms: u64,

        /// Tags (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,
    },
    /// Simulate an incoming text message from the participant
    Receive {
        #[arg(short, long)]
        conversation: String,

        /// Message text
        text: String,
    },
    /// Mark a conversation as read
    MarkRead {
        #[arg(short, long)]
        conversation: String,
    },
    /// Delete a message with its reactions, replies and audio
    Delete {
        #[arg(short, long)]
        conversation: String,

        #[arg(short, long)]
        message: String,
    },
    /// React to a voice message at a position
    React {
        #[arg(short, long)]
        message: String,

        #[arg(short, long)]
        emoji: String,

        /// Position in milliseconds
        #[arg(short, long, default_value = "0")]
        at_ms: u64,
    },
    /// Reply to a voice message at a position
    Reply {
        #[arg(short, long)]
        message: String,

        /// Position in milliseconds
        #[arg(short, long, default_value = "0")]
        at_ms: u64,

        /// Reply text
        text: String,
    },
    /// Show reactions and replies on a voice message
    Annotations {
        #[arg(short, long)]
        message: String,
    },
    /// Add or remove a tag on a voice message
    Tag {
        #[arg(short, long)]
        conversation: String,

        #[arg(short, long)]
        message: String,

        /// Tag to add
        #[arg(short, long)]
        add: Option<String>,

        /// Tag to remove
        #[arg(short, long)]
        remove: Option<String>,
    },
    /// List voice messages with a tag
    Tagged {
        /// Tag to search for
        tag: String,
    },
    /// Transcribe a voice message
    Transcribe {
        #[arg(short, long)]
        conversation: String,

        #[arg(short, long)]
        message: String,
    },
    /// Export a conversation
    Export {
        #[arg(short, long)]
        conversation: String,

        /// Output format (txt, csv or json)
        #[arg(short, long, default_value = "txt")]
        format: String,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,
    },
    /// Show store statistics
    Stats,
    /// Delete audio files no message references
    PruneAudio,
    /// Delete all conversations, messages and audio
    Clear {
        /// Required to actually clear
        #[arg(long)]
        yes: bool,
    },
    /// Print a starter YAML configuration
    PrintConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let mut config = AppConfig::load()?;

    // Initialize logging
    let log_file = config.logging.file_path.as_ref().map(PathBuf::from);
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        log_file.as_deref(),
        config.logging.format == "json",
    )?;
    StoreMetrics::init()?;

    // Parse command line arguments
    let cli = Cli::parse();
    if cli.no_latency {
        config.network.simulated_latency_ms = 0;
    }

    if matches!(cli.command, Commands::PrintConfig) {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    info!(data_dir = %config.data_dir().display(), "Starting voice-chat-store");
    let service = ChatService::open(&config).context("Failed to open chat store")?;
    service.initialize().await?;

    let timer = OperationTimer::new("command");
    run(&service, cli.command).await?;
    timer.finish();
    Ok(())
}

async fn run(service: &ChatService, command: Commands) -> Result<()> {
    match command {
        Commands::Conversations => {
            for conversation in service.get_conversations().await? {
                print_conversation(&conversation);
            }
        }
        Commands::NewConversation { name, avatar } => {
            let conversation = service.get_or_create_conversation(&name, avatar).await?;
            print_conversation(&conversation);
        }
        Commands::Messages { conversation } => {
            for message in service.get_messages(&conversation).await? {
                print_message(&message);
            }
        }
        Commands::SendText { conversation, text } => {
            let message = service.send_text_message(&conversation, &text).await?;
            print_message(&message);
        }
        Commands::SendAudio {
            conversation,
            file,
            duration_ms,
            tag,
        } => {
            let recording = NewAudioMessage {
                source_path: file,
                duration_ms,
                waveform: None,
                tags: tag,
            };
            let message = service.send_audio_message(&conversation, recording).await?;
            print_message(&message);
        }
        Commands::Receive { conversation, text } => {
            let message = service.receive_text_message(&conversation, &text).await?;
            print_message(&message);
        }
        Commands::MarkRead { conversation } => {
            let conversation = service.mark_as_read(&conversation).await?;
            print_conversation(&conversation);
        }
        Commands::Delete { conversation, message } => {
            let removed = service.delete_message(&conversation, &message).await?;
            println!("Deleted {}", removed.id);
        }
        Commands::React { message, emoji, at_ms } => {
            let reaction = service.add_reaction(&message, &emoji, at_ms).await?;
            println!("{} at {} ({})", reaction.emoji, format_duration(reaction.position_ms), reaction.id);
        }
        Commands::Reply { message, at_ms, text } => {
            let reply = service.add_reply(&message, &text, at_ms).await?;
            println!("{} at {}: {}", reply.user_name, format_duration(reply.position_ms), reply.text);
        }
        Commands::Annotations { message } => {
            for reaction in service.get_reactions(&message).await? {
                println!("{} {} {}", format_duration(reaction.position_ms), reaction.emoji, reaction.user_name);
            }
            for reply in service.get_replies(&message).await? {
                println!("{} {}: {}", format_duration(reply.position_ms), reply.user_name, reply.text);
            }
        }
        Commands::Tag {
            conversation,
            message,
            add,
            remove,
        } => {
            let mut tags = None;
            if let Some(tag) = add {
                tags = Some(service.add_tag(&conversation, &message, &tag).await?);
            }
            if let Some(tag) = remove {
                tags = Some(service.remove_tag(&conversation, &message, &tag).await?);
            }
            match tags {
                Some(tags) => println!("{}", tags.join(", ")),
                None => warn!("Nothing to do: pass --add or --remove"),
            }
        }
        Commands::Tagged { tag } => {
            for message in service.messages_with_tag(&tag).await? {
                print_message(&message);
            }
        }
        Commands::Transcribe { conversation, message } => {
            let transcript = service.transcribe_message(&conversation, &message).await?;
            println!(
                "{} [{} {:.0}%]",
                transcript.text,
                transcript.language.as_deref().unwrap_or("unknown"),
                transcript.confidence * 100.0
            );
        }
        Commands::Export {
            conversation,
            format,
            output_dir,
        } => {
            let format: OutputFormat = format.parse()?;
            let path = service.export_conversation(&conversation, format, &output_dir).await?;
            println!("{}", path.display());
        }
        Commands::Stats => {
            println!("{}", serde_json::to_string_pretty(&service.stats().await?)?);
        }
        Commands::PruneAudio => {
            let removed = service.prune_orphaned_audio().await?;
            println!("Removed {} orphaned audio files", removed.len());
        }
        Commands::Clear { yes } => {
            if yes {
                service.clear_all().await?;
                println!("Cleared");
            } else {
                warn!("Refusing to clear without --yes");
            }
        }
        Commands::PrintConfig => {}
    }

    Ok(())
}

fn print_conversation(conversation: &Conversation) {
    let unread = if conversation.unread_count > 0 {
        format!(" ({} unread)", conversation.unread_count)
    } else {
        String::new()
    };
    println!(
        "{}  {}{}  {}",
        conversation.id,
        conversation.participant_name,
        unread,
        conversation.last_message.as_deref().unwrap_or("No messages yet")
    );
}

fn print_message(message: &Message) {
    println!(
        "{}  {}  {}: {}",
        message.id,
        message.timestamp.format("%b %d %H:%M"),
        message.sender_name,
        render_body(message)
    );
}
