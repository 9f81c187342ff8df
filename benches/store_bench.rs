use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;
use voice_chat_store::audio::AudioStorage;
use voice_chat_store::config::AppConfig;
use voice_chat_store::tags::normalize_tag;
use voice_chat_store::{ChatService, SledStore};

fn quiet_service(audio_dir: &std::path::Path) -> ChatService {
    let mut config = AppConfig::default();
    config.network.simulated_latency_ms = 0;
    config.transcription.delay_ms = 0;
    config.storage.seed_sample_data = false;

    let store = SledStore::temporary().expect("temporary store");
    ChatService::new(Box::new(store), AudioStorage::new(audio_dir), &config)
}

fn bench_messages(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let dir = tempfile::tempdir().expect("temp dir");
    let service = quiet_service(dir.path());

    let conversation = rt
        .block_on(service.get_or_create_conversation("Bench", None))
        .expect("conversation");
    for i in 0..200 {
        rt.block_on(service.send_text_message(&conversation.id, &format!("message {i}")))
            .expect("seed message");
    }

    c.bench_function("send_text_message", |b| {
        b.iter(|| {
            rt.block_on(service.send_text_message(&conversation.id, black_box("hello there")))
                .expect("send")
        });
    });

    c.bench_function("get_messages", |b| {
        b.iter(|| {
            rt.block_on(service.get_messages(black_box(&conversation.id)))
                .expect("load")
        });
    });
}

fn bench_tags(c: &mut Criterion) {
    c.bench_function("normalize_tag", |b| {
        b.iter(|| normalize_tag(black_box("  #Road Trip Café ")));
    });
}

criterion_group!(benches, bench_messages, bench_tags);
criterion_main!(benches);
