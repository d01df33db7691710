//! Data stream protocol shared by the relay and the chat client
//!
//! The relay answers a chat request with a `text/plain` body made of
//! newline-terminated parts, each written as `TYPE:JSON`:
//!
//! ```text
//! f:{"messageId":"msg-5c1d..."}
//! 0:"Hello"
//! 0:", world"
//! e:{"finishReason":"stop","isContinued":false}
//! d:{"finishReason":"stop"}
//! ```
//!
//! `0` parts carry text fragments, `3` parts carry an error message, and
//! the closing `d` part marks a completed message. A body that ends without
//! `d` was cut short. Part types the decoder does not know are preserved as
//! [`StreamPart::Other`] so callers can skip them.

use serde_json::{json, Value};

use crate::error::{RelayError, Result};

/// Response header announcing the protocol
pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";

/// Protocol version sent in [`DATA_STREAM_HEADER`]
pub const DATA_STREAM_VERSION: &str = "v1";

/// Content type of a data stream body
pub const DATA_STREAM_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Finish reason written when the provider stream ends normally
pub const FINISH_REASON_STOP: &str = "stop";

/// One line of the data stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPart {
    /// `f` - start of a generation step
    StartStep {
        /// Id of the assistant message being produced
        message_id: String,
    },
    /// `0` - text fragment
    Text(String),
    /// `3` - error reported by the relay
    Error(String),
    /// `e` - end of a generation step
    FinishStep {
        /// Why the step ended
        finish_reason: String,
        /// Whether another step continues the same message
        is_continued: bool,
    },
    /// `d` - end of the message
    FinishMessage {
        /// Why the message ended
        finish_reason: String,
    },
    /// Any other part type
    Other {
        /// Part type code
        code: String,
        /// Raw JSON payload
        value: Value,
    },
}

impl StreamPart {
    /// Serialize to a single newline-terminated line
    ///
    /// # Examples
    ///
    /// ```
    /// use relaychat::stream_protocol::StreamPart;
    ///
    /// let line = StreamPart::Text("say \"hi\"\n".to_string()).encode();
    /// assert_eq!(line, "0:\"say \\\"hi\\\"\\n\"\n");
    /// ```
    pub fn encode(&self) -> String {
        let (code, value) = match self {
            Self::StartStep { message_id } => ("f", json!({ "messageId": message_id })),
            Self::Text(text) => ("0", json!(text)),
            Self::Error(message) => ("3", json!(message)),
            Self::FinishStep {
                finish_reason,
                is_continued,
            } => (
                "e",
                json!({ "finishReason": finish_reason, "isContinued": is_continued }),
            ),
            Self::FinishMessage { finish_reason } => {
                ("d", json!({ "finishReason": finish_reason }))
            }
            Self::Other { code, value } => (code.as_str(), value.clone()),
        };
        format!("{}:{}\n", code, value)
    }

    /// Parse a single line without its terminating newline
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Stream` if the line has no type prefix or the
    /// payload is not JSON of the expected shape
    pub fn parse_line(line: &str) -> Result<Self> {
        let (code, payload) = line
            .split_once(':')
            .ok_or_else(|| RelayError::Stream(format!("missing part type in line: {}", line)))?;

        let value: Value = serde_json::from_str(payload)
            .map_err(|e| RelayError::Stream(format!("invalid {} part payload: {}", code, e)))?;

        let part = match code {
            "0" => Self::Text(expect_str(code, &value)?.to_string()),
            "3" => Self::Error(
                value
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
            ),
            "f" => Self::StartStep {
                message_id: field_str(&value, "messageId").unwrap_or_default(),
            },
            "e" => Self::FinishStep {
                finish_reason: field_str(&value, "finishReason").unwrap_or_default(),
                is_continued: value
                    .get("isContinued")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            "d" => Self::FinishMessage {
                finish_reason: field_str(&value, "finishReason").unwrap_or_default(),
            },
            other => Self::Other {
                code: other.to_string(),
                value,
            },
        };

        Ok(part)
    }
}

fn expect_str<'a>(code: &str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        RelayError::Stream(format!("{} part payload must be a JSON string", code)).into()
    })
}

fn field_str(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Incremental decoder for data stream bodies
///
/// Network chunks may split a line anywhere; bytes are buffered until a
/// full line is available. Blank lines are skipped.
#[derive(Debug, Default)]
pub struct DataStreamDecoder {
    buffer: Vec<u8>,
}

impl DataStreamDecoder {
    /// Creates an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every part it completes
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Stream` for lines that are not valid UTF-8 or
    /// not valid parts
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<StreamPart>> {
        self.buffer.extend_from_slice(chunk);

        let mut parts = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(part) = parse_raw_line(&line[..line.len() - 1])? {
                parts.push(part);
            }
        }
        Ok(parts)
    }

    /// Decodes whatever remains after the body ended
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Stream` if the trailing bytes are not a valid part
    pub fn finish(&mut self) -> Result<Option<StreamPart>> {
        let rest = std::mem::take(&mut self.buffer);
        parse_raw_line(&rest)
    }
}

fn parse_raw_line(raw: &[u8]) -> Result<Option<StreamPart>> {
    let line = std::str::from_utf8(raw)
        .map_err(|e| RelayError::Stream(format!("invalid UTF-8 in data stream: {}", e)))?;
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return Ok(None);
    }
    StreamPart::parse_line(line).map(Some)
}
