//! Chat session state machine
//!
//! A [`ChatSession`] owns the conversation and moves through
//! `Idle -> Submitted -> Streaming -> Idle` for each submission, or to
//! `Error` when the relay fails. Messages already shown are never rolled
//! back and nothing is retried.

use futures::StreamExt;
use uuid::Uuid;

use super::transport::ChatTransport;
use crate::error::{RelayError, Result};
use crate::providers::{Message, Role};
use crate::server::ChatRequest;

/// Shown when a submission fails for any reason after validation
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Where a session is in the request lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStatus {
    /// Ready for input
    Idle,
    /// Request sent, no fragment received yet
    Submitted,
    /// Fragments are arriving
    Streaming,
    /// The last submission failed
    Error,
}

impl ChatStatus {
    /// Whether a request is in flight
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Submitted | Self::Streaming)
    }
}

/// Conversation plus request status
#[derive(Debug)]
pub struct ChatSession {
    messages: Vec<Message>,
    status: ChatStatus,
    error: Option<String>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            status: ChatStatus::Idle,
            error: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    /// User-facing error currently displayed, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Dismisses the displayed error; called whenever the input is edited
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Submits `input` and streams the reply into the conversation
    ///
    /// `on_update` is called with each fragment as it is appended. The
    /// assistant message is created when the first fragment arrives.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::EmptyInput` for whitespace-only input and
    /// `RelayError::Busy` while a request is in flight; neither touches the
    /// conversation or the network. Transport and relay failures are
    /// returned after the session moved to [`ChatStatus::Error`]. Dropping
    /// the future before it completes leaves the session `Idle` with any
    /// partial reply kept.
    pub async fn submit<T, F>(
        &mut self,
        input: &str,
        universal_prompt: Option<&str>,
        transport: &T,
        mut on_update: F,
    ) -> Result<()>
    where
        T: ChatTransport + ?Sized,
        F: FnMut(&str),
    {
        if input.trim().is_empty() {
            self.error = Some(RelayError::EmptyInput.to_string());
            return Err(RelayError::EmptyInput.into());
        }
        if self.status.is_busy() {
            return Err(RelayError::Busy.into());
        }

        self.error = None;
        self.messages
            .push(Message::user(input).with_id(Uuid::new_v4().to_string()));
        self.status = ChatStatus::Submitted;

        let request = ChatRequest {
            messages: self.messages.clone(),
            universal_prompt: universal_prompt.map(str::to_string),
        };

        let mut in_flight = InFlight { session: self };
        let result = in_flight
            .session
            .stream_reply(&request, transport, &mut on_update)
            .await;

        match result {
            Ok(()) => {
                in_flight.session.status = ChatStatus::Idle;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Chat error");
                in_flight.session.status = ChatStatus::Error;
                in_flight.session.error = Some(GENERIC_ERROR_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    async fn stream_reply<T, F>(
        &mut self,
        request: &ChatRequest,
        transport: &T,
        on_update: &mut F,
    ) -> Result<()>
    where
        T: ChatTransport + ?Sized,
        F: FnMut(&str),
    {
        let mut fragments = transport.send(request).await?;
        let mut reply_index = None;

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            let index = match reply_index {
                Some(index) => index,
                None => {
                    self.messages.push(
                        Message::new(Role::Assistant, String::new())
                            .with_id(Uuid::new_v4().to_string()),
                    );
                    self.status = ChatStatus::Streaming;
                    let index = self.messages.len() - 1;
                    reply_index = Some(index);
                    index
                }
            };

            self.messages[index].content.push_str(&fragment);
            on_update(&fragment);
        }

        Ok(())
    }
}

/// Returns a session to `Idle` if its submission is dropped mid-flight
struct InFlight<'a> {
    session: &'a mut ChatSession,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.session.status.is_busy() {
            tracing::debug!("Submission dropped before completion");
            self.session.status = ChatStatus::Idle;
        }
    }
}
