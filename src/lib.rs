//! relaychat - streaming chat relay library
//!
//! This library provides a minimal relay between a chat client and a hosted
//! language model, plus the terminal client that talks to it.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `server`: `POST /api/chat` and `GET /api/ping` relay routes
//! - `providers`: Model provider abstraction and the Gemini implementation
//! - `stream_protocol`: Data stream encoding shared by relay and client
//! - `client`: Chat session state machine, relay transport, universal prompt settings
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use relaychat::server::{AppState, RelayServer};
//! use relaychat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let state = Arc::new(AppState::from_config(&config)?);
//!     RelayServer::new(config.server.bind_addr(), state).run().await
//! }
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod providers;
pub mod server;
pub mod stream_protocol;

// Re-export commonly used types
pub use client::{ChatSession, ChatStatus, SettingsPanel, UniversalPrompt};
pub use config::Config;
pub use error::{RelayError, Result};
pub use providers::{Message, Provider, Role};
