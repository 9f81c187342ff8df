//! Mock speech-to-text for voice messages.
//!
//! There is no recognizer behind this: after a configurable delay it returns
//! one of a few canned phrases. The phrase is chosen from a seed derived from
//! the message id, so a message always transcribes to the same text.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Message;

const PHRASES: &[&str] = &[
    "Hey, just checking in. Call me back when you get a chance.",
    "I'm running about ten minutes late, save me a seat. #plans",
    "Did you see the game last night? That ending was unbelievable!",
    "Can you pick up some groceries on the way home? We need milk and eggs. #errands",
    "Great news, the project got approved! Let's celebrate this weekend. #work",
    "Happy birthday! Hope you have an amazing day.",
    "Remember to bring the documents for tomorrow's meeting. #work #reminder",
    "I found that recipe you asked about, I'll send it over tonight.",
];

/// Result of transcribing a voice message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Recognized text
    pub text: String,
    /// ISO 639-3 code of the detected language
    pub language: Option<String>,
    /// Recognizer confidence in `[0.0, 1.0]`
    pub confidence: f32,
}

/// Canned-phrase transcriber
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    delay: Duration,
}

impl MockTranscriber {
    /// Transcriber that waits `delay` before answering
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Produce a transcript for `message`
    pub async fn transcribe(&self, message: &Message) -> Transcript {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut rng = StdRng::seed_from_u64(seed_for(&message.id));
        let text = PHRASES.choose(&mut rng).copied().unwrap_or_default().to_string();
        let confidence = rng.gen_range(0.80_f32..0.99);
        let language = whatlang::detect(&text).map(|info| info.lang().code().to_string());

        debug!(message_id = %message.id, confidence, "Transcribed voice message");
        Transcript {
            text,
            language,
            confidence,
        }
    }
}

/// 64-bit FNV-1a of the message id, stable across Rust releases
fn seed_for(id: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    id.bytes()
        .fold(OFFSET_BASIS, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}
