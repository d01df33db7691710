//! Transport between the chat session and a relay
//!
//! [`ChatTransport`] hides how a request reaches the relay so the session
//! state machine can be driven by an in-process fake in tests.
//! [`HttpRelayTransport`] posts to `{relay_url}/api/chat` and decodes the
//! data stream body into text fragments.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

use crate::error::{RelayError, Result};
use crate::server::ChatRequest;
use crate::stream_protocol::{DataStreamDecoder, StreamPart};

/// Lazy, finite stream of assistant text fragments
///
/// Consumed once; an `Err` item ends the reply.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Sends a chat request and streams back the reply
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends `request`
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be reached or rejects the request
    async fn send(&self, request: &ChatRequest) -> Result<FragmentStream>;
}

/// HTTP transport against a running relay
#[derive(Debug, Clone)]
pub struct HttpRelayTransport {
    client: reqwest::Client,
    chat_url: String,
}

impl HttpRelayTransport {
    /// Creates a transport for the relay at `relay_url`
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Config` if `relay_url` is not a valid URL
    ///
    /// # Examples
    ///
    /// ```
    /// use relaychat::client::HttpRelayTransport;
    ///
    /// let transport = HttpRelayTransport::new("http://127.0.0.1:3000/").unwrap();
    /// assert_eq!(transport.chat_url(), "http://127.0.0.1:3000/api/chat");
    /// assert!(HttpRelayTransport::new("not a url").is_err());
    /// ```
    pub fn new(relay_url: &str) -> Result<Self> {
        url::Url::parse(relay_url)
            .map_err(|e| RelayError::Config(format!("Invalid relay URL {}: {}", relay_url, e)))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(RelayError::Http)?;

        Ok(Self {
            client,
            chat_url: format!("{}/api/chat", relay_url.trim_end_matches('/')),
        })
    }

    /// Full URL of the chat route
    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }
}

#[async_trait]
impl ChatTransport for HttpRelayTransport {
    async fn send(&self, request: &ChatRequest) -> Result<FragmentStream> {
        tracing::debug!(
            url = %self.chat_url,
            message_count = request.messages.len(),
            "Posting chat request"
        );

        let response = self
            .client
            .post(&self.chat_url)
            .json(request)
            .send()
            .await
            .map_err(RelayError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Stream(format!(
                "relay returned status {}: {}",
                status.as_u16(),
                body
            ))
            .into());
        }

        let fragments: FragmentStream = Box::pin(decode_fragments(response.bytes_stream()));
        Ok(fragments)
    }
}

fn decode_fragments(
    bytes: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
) -> impl Stream<Item = Result<String>> + Send {
    async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = DataStreamDecoder::new();
        let mut finished = false;
        let mut body_done = false;

        while !body_done {
            let parts = match bytes.next().await {
                Some(Ok(chunk)) => decoder.push(&chunk),
                Some(Err(e)) => {
                    yield Err(anyhow::Error::from(RelayError::Http(e)));
                    return;
                }
                None => {
                    body_done = true;
                    decoder.finish().map(|part| part.into_iter().collect())
                }
            };

            let parts = match parts {
                Ok(parts) => parts,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for part in parts {
                match part {
                    StreamPart::Text(text) => {
                        if !text.is_empty() {
                            yield Ok(text);
                        }
                    }
                    StreamPart::Error(message) => {
                        yield Err(anyhow::Error::from(RelayError::Stream(message)));
                        return;
                    }
                    StreamPart::FinishMessage { .. } => finished = true,
                    _ => {}
                }
            }
        }

        if !finished {
            tracing::debug!("Relay stream ended without a finish part");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Message;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest {
            messages: vec![Message::user("hi").with_id("m1")],
            universal_prompt: Some("Be brief.".to_string()),
        }
    }

    async fn collect(stream: FragmentStream) -> Vec<Result<String>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_send_decodes_text_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(serde_json::json!({
                "messages": [{"id": "m1", "role": "user", "content": "hi"}],
                "universalPrompt": "Be brief."
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "f:{\"messageId\":\"msg-1\"}\n0:\"Hel\"\n0:\"lo\"\ne:{\"finishReason\":\"stop\",\"isContinued\":false}\nd:{\"finishReason\":\"stop\"}\n",
            ))
            .mount(&server)
            .await;

        let transport = HttpRelayTransport::new(&server.uri()).unwrap();
        let items = collect(transport.send(&request()).await.unwrap()).await;
        let text: Vec<String> = items.into_iter().map(|item| item.unwrap()).collect();
        assert_eq!(text, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[tokio::test]
    async fn test_send_reports_error_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("0:\"partial\"\n3:\"An error occurred.\"\n0:\"ignored\"\n"),
            )
            .mount(&server)
            .await;

        let transport = HttpRelayTransport::new(&server.uri()).unwrap();
        let items = collect(transport.send(&request()).await.unwrap()).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(items[1]
            .as_ref()
            .unwrap_err()
            .to_string()
            .contains("An error occurred."));
    }

    #[tokio::test]
    async fn test_send_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let transport = HttpRelayTransport::new(&server.uri()).unwrap();
        let err = match transport.send(&request()).await {
            Ok(_) => panic!("expected an error status to fail"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_send_without_finish_part_ends_quietly() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("0:\"cut\"\n"))
            .mount(&server)
            .await;

        let transport = HttpRelayTransport::new(&server.uri()).unwrap();
        let items = collect(transport.send(&request()).await.unwrap()).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "cut");
    }
}
