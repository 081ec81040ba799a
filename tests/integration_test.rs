// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! End-to-end tests: config file → bot → conversation → typed stream, with
//! scripted responders and a virtual clock.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use wave_bot::mock::{FailingResponder, ScriptedResponder};
use wave_bot::{
    Bot, BotState, Conversation, FileStore, IdeaWorkshop, KeyValueStore, KnowledgeBase, ResponderRequest, Role,
    IDEA_TEXT_KEY, MUTATED_IDEA_KEY,
};
use wave_config::{ChatMode, FramingConfig, Granularity, Persona};
use wave_stream::{CancellationToken, Chunk, ManualClock, StreamOutcome, StreamSimulator, StreamingOptions};

fn quiet() -> FramingConfig {
    FramingConfig { starter_probability: 0.0, connector_probability: 0.0, ..Default::default() }
}

fn virtual_bot(persona: Persona, responder: Option<Arc<dyn wave_bot::Responder>>) -> (Bot, ManualClock) {
    let clock = ManualClock::new();
    let mut builder = Bot::builder(KnowledgeBase::builtin(persona).unwrap())
        .clock(Arc::new(clock.clone()))
        .framing(quiet())
        .seed(3)
        .timeout(Duration::from_millis(100));
    if let Some(r) = responder {
        builder = builder.responder(r);
    }
    (builder.build().unwrap(), clock)
}

#[test]
fn config_file_drives_bot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wave.toml");
    std::fs::write(
        &path,
        r#"
[bot]
persona = "support"
seed = 9
history_window = 2

[bot.framing]
starter_probability = 0.0
connector_probability = 0.0

[streaming]
granularity = "word"
min_delay_ms = 5
max_delay_ms = 10

[responder]
chat_mode = "idea"
"#,
    )
    .unwrap();

    let config = wave_config::load(Some(&path)).unwrap();
    let bot = Bot::from_config(&config).unwrap();
    assert_eq!(bot.knowledge().name(), "support");
    assert_eq!(bot.mode(), ChatMode::Idea);
    assert_eq!(bot.streaming_options().granularity, Granularity::Word);
    assert_eq!(bot.streaming_options().min_delay, Duration::from_millis(5));
    assert_eq!(bot.generate_response("pricing"), bot.canonical_response("pricing"));
    assert!(bot.canonical_response("pricing").contains("Pro Plan"));
}

#[tokio::test]
async fn offline_turn_streams_canned_answer() {
    let (bot, clock) = virtual_bot(Persona::Landing, None);
    let bot = Arc::new(bot);
    let mut conversation = Conversation::new(bot.clone());

    let mut updates = Vec::new();
    let (message, outcome) = conversation
        .submit("What is Wave AI?", |m, done| updates.push((m.content.clone(), done)), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.is_completed());
    assert_eq!(message.content, bot.canonical_response("What is Wave AI?"));
    assert_eq!(updates.last().unwrap(), &(message.content.clone(), true));
    assert_eq!(updates.iter().filter(|(_, done)| *done).count(), 1);
    assert!(updates.windows(2).all(|w| w[1].0.starts_with(&w[0].0)));
    assert!(clock.elapsed() > Duration::ZERO);
    assert_eq!(bot.state(), BotState::Idle);

    let roles: Vec<Role> = conversation.history().messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
}

#[tokio::test]
async fn network_turns_forward_history_and_persist() {
    let scripted = Arc::new(ScriptedResponder::new(vec![
        Ok("First network answer".into()),
        Ok("Second network answer".into()),
    ]));
    let (bot, _) = virtual_bot(Persona::Support, Some(scripted.clone()));
    let bot = Arc::new(bot);
    let mut conversation = Conversation::new(bot.clone());
    conversation.switch_mode(ChatMode::Idea);

    let cancel = CancellationToken::new();
    let (first, _) = conversation.submit("hello", |_, _| {}, &cancel).await.unwrap();
    assert_eq!(first.content, "First network answer");
    let (second, _) = conversation.submit("tell me more", |_, _| {}, &cancel).await.unwrap();
    assert_eq!(second.content, "Second network answer");

    let requests = scripted.requests();
    match &requests[1] {
        ResponderRequest::Chat { message, mode, history } => {
            assert_eq!(message, "tell me more");
            assert_eq!(*mode, ChatMode::Idea);
            let contents: Vec<&str> = history.iter().map(|t| t.content.as_str()).collect();
            assert_eq!(contents, vec!["hello", "First network answer"]);
        }
        other => panic!("unexpected request {other:?}"),
    }

    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state").join("store.json"));
    conversation.save(&store).unwrap();

    let mut restored = Conversation::new(bot);
    assert!(restored.restore(&store).unwrap());
    assert_eq!(restored.mode(), ChatMode::Idea);
    assert_eq!(restored.history().len(), 4);
    assert_eq!(restored.history().last().unwrap().content, "Second network answer");
}

#[tokio::test]
async fn failing_network_falls_back_mid_conversation() {
    let (bot, _) = virtual_bot(Persona::Landing, Some(Arc::new(FailingResponder::default())));
    let bot = Arc::new(bot);
    let mut conversation = Conversation::new(bot.clone());
    let (message, outcome) = conversation
        .submit("how much does it cost", |_, _| {}, &CancellationToken::new())
        .await
        .unwrap();
    assert!(outcome.is_completed());
    assert_eq!(message.content, bot.canonical_response("how much does it cost"));
}

#[tokio::test]
async fn dropped_receiver_stops_the_stream() {
    let simulator = StreamSimulator::with_clock(Arc::new(ManualClock::new())).seeded(1);
    let options = StreamingOptions::new(Duration::from_millis(1), Duration::from_millis(2));
    let (tx, mut rx) = mpsc::unbounded_channel::<Chunk>();

    let reader = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(chunk) = rx.recv().await {
            seen.push(chunk);
            if seen.len() == 3 {
                break;
            }
        }
        seen
    });

    let outcome = simulator
        .stream_to_channel("one two three four five six seven", tx, &options, &CancellationToken::new())
        .await
        .unwrap();
    let seen = reader.await.unwrap();

    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|c| !c.is_complete));
    match outcome {
        StreamOutcome::Cancelled { revealed } => assert!(revealed.starts_with(&seen[2].text)),
        StreamOutcome::Completed { .. } => panic!("stream should stop once the receiver is gone"),
    }
}

#[tokio::test]
async fn workshop_round_trip_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path().join("store.json")));
    store.set(IDEA_TEXT_KEY, "dog bakery").unwrap();

    let mut first = IdeaWorkshop::new(store.clone())
        .with_responder(Arc::new(ScriptedResponder::once("Dog bakery with subscriptions")))
        .seeded(4);
    first.load_idea().unwrap();
    assert_eq!(first.enhance().await, "Dog bakery with subscriptions");
    first.build().unwrap();

    let mut second = IdeaWorkshop::new(store.clone()).seeded(4);
    second.load_idea().unwrap();
    assert_eq!(second.load_mutation().unwrap().as_deref(), Some("Dog bakery with subscriptions"));
    let rethought = second.rethink().await;
    assert_ne!(rethought, "Dog bakery with subscriptions");
    assert!(rethought.to_lowercase().contains("dog bakery"), "{rethought}");
    second.build().unwrap();

    assert_eq!(store.get(MUTATED_IDEA_KEY).unwrap(), Some(rethought));
    assert_eq!(store.get(IDEA_TEXT_KEY).unwrap().as_deref(), Some("dog bakery"));
}
