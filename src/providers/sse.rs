//! Server-sent events decoding for provider streams
//!
//! Providers that stream over `text/event-stream` hand their response body
//! to [`sse_data_stream`], which yields the `data:` payload of every event.
//!
//! Field processing:
//!
//! - `data:` -- accumulated; multiple lines in one event are joined with `\n`.
//! - `event: ping` -- the whole event is discarded.
//! - `id:`, `retry:` and comment lines (starting with `:`) are ignored.
//!
//! Lines may be terminated by `\n` or `\r\n`, and network chunks may split a
//! line anywhere, including inside a multi-byte UTF-8 sequence.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

use crate::error::{RelayError, Result};

/// Incremental SSE decoder
///
/// Feed raw body chunks with [`SseDecoder::push`]; complete event payloads
/// are returned as soon as their terminating blank line arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
    event_type: Option<String>,
}

impl SseDecoder {
    /// Creates an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every event payload it completes
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Stream` if a complete line is not valid UTF-8
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = decode_line(line)?;
            if let Some(data) = self.process_line(&line) {
                events.push(data);
            }
        }

        Ok(events)
    }

    /// Flushes a trailing event that was not followed by a blank line
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Stream` if the leftover bytes are not valid UTF-8
    pub fn finish(&mut self) -> Result<Option<String>> {
        if !self.buffer.is_empty() {
            let mut line = std::mem::take(&mut self.buffer);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = decode_line(line)?;
            if let Some(data) = self.process_line(&line) {
                return Ok(Some(data));
            }
        }
        Ok(self.dispatch())
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data_lines.push(value.to_string()),
            "event" => self.event_type = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        let event_type = self.event_type.take();
        if self.data_lines.is_empty() {
            return None;
        }
        let data = self.data_lines.join("\n");
        self.data_lines.clear();

        if event_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("ping"))
        {
            return None;
        }
        Some(data)
    }
}

fn decode_line(line: Vec<u8>) -> Result<String> {
    String::from_utf8(line)
        .map_err(|e| RelayError::Stream(format!("invalid UTF-8 in event stream: {}", e)).into())
}

/// Turns a raw `text/event-stream` body into a stream of event payloads
///
/// A transport error or undecodable line ends the stream with an `Err` item.
pub fn sse_data_stream(
    byte_stream: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
) -> BoxStream<'static, Result<String>> {
    Box::pin(async_stream::stream! {
        let mut decoder = SseDecoder::new();
        let mut byte_stream = Box::pin(byte_stream);

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(anyhow::Error::from(RelayError::Stream(format!(
                        "failed to read event stream: {}",
                        e
                    ))));
                    return;
                }
            };

            match decoder.push(&chunk) {
                Ok(events) => {
                    for data in events {
                        yield Ok(data);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        match decoder.finish() {
            Ok(Some(data)) => yield Ok(data),
            Ok(None) => {}
            Err(e) => yield Err(e),
        }
    })
}
