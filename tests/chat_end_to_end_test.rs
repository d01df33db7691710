//! End-to-end tests: chat session -> HTTP transport -> relay -> fake provider

use std::sync::Arc;

use relaychat::client::{
    ChatSession, ChatStatus, HttpRelayTransport, MemoryPromptStore, SettingsPanel,
    GENERIC_ERROR_MESSAGE,
};
use relaychat::providers::{FakeProvider, Message, Role};

mod common;

use common::{fake_state, RunningRelay, CHAT_MODEL};

#[tokio::test]
async fn test_conversation_round_trip_with_universal_prompt() {
    let (state, provider) = fake_state(FakeProvider::replying(["Wetin", " dey", " happen?"]));
    let relay = RunningRelay::start(state).await;

    let mut settings = SettingsPanel::load(Arc::new(MemoryPromptStore::new())).unwrap();
    settings.edit("Respond in pidgin English.").unwrap();
    settings.save().unwrap();

    let transport = HttpRelayTransport::new(&relay.base_url).unwrap();
    let mut session = ChatSession::new();
    let mut streamed = String::new();

    session
        .submit(
            "hello",
            Some(settings.prompt().as_str()),
            &transport,
            |fragment| streamed.push_str(fragment),
        )
        .await
        .unwrap();

    assert_eq!(streamed, "Wetin dey happen?");
    assert_eq!(session.status(), ChatStatus::Idle);
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[1].role, Role::Assistant);
    assert_eq!(session.messages()[1].content, "Wetin dey happen?");

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, CHAT_MODEL);
    assert_eq!(calls[0].messages.len(), 2);
    assert_eq!(calls[0].messages[0], Message::system("Respond in pidgin English."));
    assert_eq!(calls[0].messages[1].role, Role::User);
    assert_eq!(calls[0].messages[1].content, "hello");

    relay.stop().await;
}

#[tokio::test]
async fn test_second_turn_sends_history() {
    let (state, provider) = fake_state(FakeProvider::replying(["ok"]));
    let relay = RunningRelay::start(state).await;
    let transport = HttpRelayTransport::new(&relay.base_url).unwrap();
    let mut session = ChatSession::new();

    session.submit("one", None, &transport, |_| {}).await.unwrap();
    session.submit("two", None, &transport, |_| {}).await.unwrap();

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    let contents: Vec<&str> = calls[1]
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, vec!["one", "ok", "two"]);

    relay.stop().await;
}

#[tokio::test]
async fn test_provider_failure_surfaces_generic_error() {
    let (state, _provider) = fake_state(FakeProvider::failing("upstream exploded"));
    let relay = RunningRelay::start(state).await;
    let transport = HttpRelayTransport::new(&relay.base_url).unwrap();
    let mut session = ChatSession::new();

    let result = session.submit("hello", None, &transport, |_| {}).await;

    assert!(result.is_err());
    assert_eq!(session.status(), ChatStatus::Error);
    assert_eq!(session.error(), Some(GENERIC_ERROR_MESSAGE));
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].content, "hello");

    relay.stop().await;
}

#[tokio::test]
async fn test_whitespace_input_makes_no_request() {
    let (state, provider) = fake_state(FakeProvider::replying(["unused"]));
    let relay = RunningRelay::start(state).await;
    let transport = HttpRelayTransport::new(&relay.base_url).unwrap();
    let mut session = ChatSession::new();

    assert!(session.submit("   ", None, &transport, |_| {}).await.is_err());

    assert_eq!(session.error(), Some("Please enter a message."));
    assert!(session.messages().is_empty());
    assert!(provider.calls().is_empty());

    relay.stop().await;
}

#[tokio::test]
async fn test_mid_stream_failure_keeps_partial_reply() {
    let (state, _provider) = fake_state(FakeProvider::failing_mid_stream(
        ["half an ans"],
        "stream reset",
    ));
    let relay = RunningRelay::start(state).await;
    let transport = HttpRelayTransport::new(&relay.base_url).unwrap();
    let mut session = ChatSession::new();

    let result = session.submit("hello", None, &transport, |_| {}).await;

    assert!(result.is_ok());
    assert_eq!(session.status(), ChatStatus::Idle);
    assert!(session.error().is_none());
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[1].content, "half an ans");

    relay.stop().await;
}
