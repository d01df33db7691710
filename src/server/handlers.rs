//! Relay route handlers.
//!
//! `POST /api/chat` validates the request body, prepends the universal
//! prompt when one is given, and relays the provider stream. `GET /api/ping`
//! relays a fixed prompt through the ping model.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderName};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{log_route_error, ApiError};
use super::{AppState, ChatRequest};
use crate::providers::{Message, TextStream};
use crate::stream_protocol::{
    StreamPart, DATA_STREAM_CONTENT_TYPE, DATA_STREAM_HEADER, DATA_STREAM_VERSION,
    FINISH_REASON_STOP,
};

/// Prompt sent by the ping route
pub const PING_PROMPT: &str = "Say hello";

const CHAT_ROUTE: &str = "/api/chat";
const PING_ROUTE: &str = "/api/ping";

/// `POST /api/chat`
pub async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let request = parse_chat_request(&body)?;
    let messages = compose_messages(request.messages, request.universal_prompt.as_deref());

    debug!(
        model = %state.chat_model,
        message_count = messages.len(),
        "Relaying chat request"
    );

    relay(&state, CHAT_ROUTE, &state.chat_model, &messages).await
}

/// `GET /api/ping`
pub async fn ping(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    debug!(model = %state.ping_model, "Relaying ping");
    relay(
        &state,
        PING_ROUTE,
        &state.ping_model,
        &[Message::user(PING_PROMPT)],
    )
    .await
}

/// Validate a raw chat request body
///
/// `messages` must be an array of `{role, content}` objects; `universalPrompt`
/// may be missing, null, or a string.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` describing the first shape problem found
pub fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::invalid_request("body must be valid JSON"))?;

    let items = match value.get("messages") {
        Some(Value::Array(items)) => items,
        _ => return Err(ApiError::invalid_request("'messages' must be an array")),
    };

    let messages = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Message>(item.clone()).map_err(|_| {
                ApiError::invalid_request(format!("malformed message at index {}", index))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let universal_prompt = match value.get("universalPrompt") {
        None | Some(Value::Null) => None,
        Some(Value::String(prompt)) => Some(prompt.clone()),
        Some(_) => {
            return Err(ApiError::invalid_request(
                "'universalPrompt' must be a string",
            ))
        }
    };

    Ok(ChatRequest {
        messages,
        universal_prompt,
    })
}

/// Build the list forwarded to the provider
///
/// A non-empty universal prompt becomes exactly one leading system message;
/// otherwise the messages pass through untouched.
///
/// # Examples
///
/// ```
/// use relaychat::providers::{Message, Role};
/// use relaychat::server::handlers::compose_messages;
///
/// let out = compose_messages(vec![Message::user("hi")], Some("Be brief."));
/// assert_eq!(out[0], Message::system("Be brief."));
/// assert_eq!(out[1], Message::user("hi"));
///
/// let out = compose_messages(vec![Message::user("hi")], Some(""));
/// assert_eq!(out, vec![Message::user("hi")]);
/// ```
pub fn compose_messages(messages: Vec<Message>, universal_prompt: Option<&str>) -> Vec<Message> {
    match universal_prompt {
        Some(prompt) if !prompt.is_empty() => {
            let mut composed = Vec::with_capacity(messages.len() + 1);
            composed.push(Message::system(prompt));
            composed.extend(messages);
            composed
        }
        _ => messages,
    }
}

async fn relay(
    state: &AppState,
    route: &'static str,
    model: &str,
    messages: &[Message],
) -> Result<Response, ApiError> {
    let fragments = state
        .provider
        .stream_chat(model, messages)
        .await
        .map_err(|e| ApiError::internal(route, e))?;

    info!(route, provider = state.provider.name(), model, "Provider stream started");
    Ok(data_stream_response(route, fragments))
}

/// Encode a provider stream as a data stream response
///
/// A provider error after the response has started is logged and the body
/// ends without the finish part.
fn data_stream_response(route: &'static str, fragments: TextStream) -> Response {
    let message_id = format!("msg-{}", Uuid::new_v4().simple());

    let body = async_stream::stream! {
        yield Ok::<Bytes, Infallible>(Bytes::from(
            StreamPart::StartStep { message_id }.encode(),
        ));

        let mut fragments = fragments;
        let mut fragment_count = 0usize;
        while let Some(item) = fragments.next().await {
            match item {
                Ok(text) => {
                    fragment_count += 1;
                    yield Ok(Bytes::from(StreamPart::Text(text).encode()));
                }
                Err(e) => {
                    log_route_error(route, &e);
                    return;
                }
            }
        }

        debug!(route, fragment_count, "Provider stream completed");
        yield Ok(Bytes::from(
            StreamPart::FinishStep {
                finish_reason: FINISH_REASON_STOP.to_string(),
                is_continued: false,
            }
            .encode(),
        ));
        yield Ok(Bytes::from(
            StreamPart::FinishMessage {
                finish_reason: FINISH_REASON_STOP.to_string(),
            }
            .encode(),
        ));
    };

    (
        [
            (header::CONTENT_TYPE, DATA_STREAM_CONTENT_TYPE),
            (HeaderName::from_static(DATA_STREAM_HEADER), DATA_STREAM_VERSION),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Role;

    fn bad_request_message(result: Result<ChatRequest, ApiError>) -> String {
        match result {
            Err(ApiError::BadRequest(message)) => message,
            other => panic!("expected BadRequest, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_parse_valid_request() {
        let request = parse_chat_request(
            br#"{"messages":[{"id":"a","role":"user","content":"hi"}],"universalPrompt":"Be brief."}"#,
        )
        .unwrap();
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(request.universal_prompt.as_deref(), Some("Be brief."));
    }

    #[test]
    fn test_parse_rejects_non_array_messages() {
        for body in [
            r#"{}"#,
            r#"{"messages":null}"#,
            r#"{"messages":{"role":"user"}}"#,
            r#"{"messages":"not-an-array"}"#,
            r#"{"messages":42}"#,
            r#"[]"#,
        ] {
            let message = bad_request_message(parse_chat_request(body.as_bytes()));
            assert!(message.contains("Invalid request"), "body {}", body);
            assert!(message.contains("'messages' must be an array"), "body {}", body);
        }
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let message = bad_request_message(parse_chat_request(b"{not json"));
        assert_eq!(message, "Invalid request: body must be valid JSON");
    }

    #[test]
    fn test_parse_rejects_malformed_message() {
        let message = bad_request_message(parse_chat_request(
            br#"{"messages":[{"role":"user","content":"ok"},{"role":"robot","content":"x"}]}"#,
        ));
        assert_eq!(message, "Invalid request: malformed message at index 1");
    }

    #[test]
    fn test_parse_rejects_non_string_prompt() {
        let message = bad_request_message(parse_chat_request(
            br#"{"messages":[],"universalPrompt":5}"#,
        ));
        assert!(message.contains("'universalPrompt' must be a string"));
    }

    #[test]
    fn test_parse_null_prompt_is_absent() {
        let request =
            parse_chat_request(br#"{"messages":[],"universalPrompt":null}"#).unwrap();
        assert!(request.universal_prompt.is_none());
    }

    #[test]
    fn test_compose_without_prompt_is_identity() {
        let messages = vec![Message::user("a"), Message::assistant("b")];
        assert_eq!(compose_messages(messages.clone(), None), messages);
        assert_eq!(compose_messages(messages.clone(), Some("")), messages);
    }

    #[test]
    fn test_compose_with_prompt_prepends_one_system_message() {
        let messages = vec![Message::user("a"), Message::assistant("b"), Message::user("c")];
        let composed = compose_messages(messages.clone(), Some("Respond in pidgin English."));
        assert_eq!(composed.len(), messages.len() + 1);
        assert_eq!(composed[0], Message::system("Respond in pidgin English."));
        assert_eq!(&composed[1..], &messages[..]);
        assert_eq!(
            composed.iter().filter(|m| m.role == Role::System).count(),
            1
        );
    }

    #[test]
    fn test_compose_keeps_whitespace_prompt() {
        let composed = compose_messages(vec![Message::user("a")], Some(" "));
        assert_eq!(composed[0], Message::system(" "));
    }
}
