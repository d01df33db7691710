//! Base provider trait and common types for relaychat
//!
//! This module defines the [`Provider`] capability that every model backend
//! implements, along with the message types shared by the relay and the
//! chat client.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instruction
    System,
    /// Message typed by the user
    User,
    /// Message produced by the model
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// Message structure for conversation
///
/// The `id` is an opaque identifier assigned by the chat client. Messages
/// composed on the relay side (such as the universal prompt) carry no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque identifier of the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Role of the message sender
    pub role: Role,
    /// Text content of the message
    pub content: String,
}

impl Message {
    /// Creates a new message with the given role and no id
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use relaychat::providers::{Message, Role};
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, Role::User);
    /// assert!(msg.id.is_none());
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use relaychat::providers::{Message, Role};
    ///
    /// let msg = Message::system("Respond in pidgin English.");
    /// assert_eq!(msg.role, Role::System);
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Attaches an id, returning the message for chaining
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Lazy, finite stream of text fragments produced by a provider
///
/// The stream can be consumed once. An `Err` item means the provider failed
/// mid-stream; nothing after it is meaningful.
pub type TextStream = BoxStream<'static, Result<String>>;

/// Model provider capability
///
/// Given a model identifier and an ordered message list, a provider returns
/// a streamed sequence of text fragments. Implementations must report
/// connection, status, and request-building failures from `stream_chat`
/// itself, so callers can answer with an error before any output is sent.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Starts a streamed completion
    ///
    /// # Arguments
    ///
    /// * `model` - Provider model identifier
    /// * `messages` - Conversation to complete, oldest first
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Provider` or `RelayError::ProviderStatus` when
    /// the completion cannot be started
    async fn stream_chat(&self, model: &str, messages: &[Message]) -> Result<TextStream>;

    /// Short provider name used in logs
    fn name(&self) -> &str;
}
