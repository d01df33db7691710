//! In-process fake provider for relay unit and integration tests
//!
//! [`FakeProvider`] replays a scripted response instead of calling a model
//! API, and records every call so tests can assert on the exact message list
//! the relay forwarded.
//!
//! # Example
//!
//! ```
//! use relaychat::providers::{FakeProvider, Message, Provider};
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let provider = FakeProvider::replying(["Hel", "lo"]);
//! let stream = provider.stream_chat("test-model", &[Message::user("hi")]).await.unwrap();
//! let text: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
//! assert_eq!(text.concat(), "Hello");
//!
//! let calls = provider.calls();
//! assert_eq!(calls[0].model, "test-model");
//! # }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{RelayError, Result};
use crate::providers::{Message, Provider, TextStream};

/// A single recorded `stream_chat` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Model identifier the caller asked for
    pub model: String,
    /// Messages the caller forwarded, in order
    pub messages: Vec<Message>,
}

/// Scripted behaviour of a [`FakeProvider`]
#[derive(Debug, Clone)]
enum Script {
    /// Stream these fragments, then end
    Reply(Vec<String>),
    /// Fail before any fragment is produced
    FailOnStart(String),
    /// Stream these fragments, then fail
    FailMidStream(Vec<String>, String),
}

/// In-process fake provider
#[derive(Debug, Clone)]
pub struct FakeProvider {
    script: Script,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeProvider {
    /// A provider that streams `fragments` and ends successfully
    pub fn replying<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_script(Script::Reply(
            fragments.into_iter().map(Into::into).collect(),
        ))
    }

    /// A provider whose call fails before streaming starts
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_script(Script::FailOnStart(message.into()))
    }

    /// A provider that streams `fragments` and then fails
    pub fn failing_mid_stream<I, S>(fragments: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_script(Script::FailMidStream(
            fragments.into_iter().map(Into::into).collect(),
            message.into(),
        ))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of every call received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for FakeProvider {
    async fn stream_chat(&self, model: &str, messages: &[Message]) -> Result<TextStream> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                model: model.to_string(),
                messages: messages.to_vec(),
            });
        }

        let items: Vec<Result<String>> = match &self.script {
            Script::Reply(fragments) => fragments.iter().cloned().map(Ok).collect(),
            Script::FailOnStart(message) => {
                return Err(RelayError::Provider(message.clone()).into());
            }
            Script::FailMidStream(fragments, message) => fragments
                .iter()
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(
                    RelayError::Provider(message.clone()).into()
                )))
                .collect(),
        };

        let stream: TextStream = Box::pin(futures::stream::iter(items));
        Ok(stream)
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_replying_streams_fragments_and_records_call() {
        let provider = FakeProvider::replying(["a", "b"]);
        let stream = provider
            .stream_chat("m", &[Message::user("hi")])
            .await
            .unwrap();
        let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
        assert_eq!(fragments, vec!["a", "b"]);
        assert_eq!(
            provider.calls(),
            vec![RecordedCall {
                model: "m".to_string(),
                messages: vec![Message::user("hi")],
            }]
        );
    }

    #[tokio::test]
    async fn test_failing_errors_on_start() {
        let provider = FakeProvider::failing("boom");
        assert!(provider.stream_chat("m", &[]).await.is_err());
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_mid_stream_yields_error_last() {
        let provider = FakeProvider::failing_mid_stream(["partial"], "cut");
        let items: Vec<Result<String>> = provider.stream_chat("m", &[]).await.unwrap().collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(items[1].is_err());
    }
}
