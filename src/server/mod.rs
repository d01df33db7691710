//! Relay HTTP server
//!
//! Exposes `POST /api/chat` and `GET /api/ping`, forwarding conversations to
//! the configured model provider and streaming the answer back in the data
//! stream format.

pub mod error;
pub mod handlers;
pub mod router;

pub use error::{ApiError, INTERNAL_SERVER_ERROR_BODY};
pub use router::build_router;

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::providers::{create_provider, Message, Provider};

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<Message>,

    /// Instruction prepended as a system message when non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universal_prompt: Option<String>,
}

/// State shared by every route
pub struct AppState {
    /// Provider all requests are relayed to
    pub provider: Arc<dyn Provider>,
    /// Model used by the chat route
    pub chat_model: String,
    /// Model used by the ping route
    pub ping_model: String,
}

impl AppState {
    /// Creates state around an existing provider
    pub fn new(
        provider: Arc<dyn Provider>,
        chat_model: impl Into<String>,
        ping_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            chat_model: chat_model.into(),
            ping_model: ping_model.into(),
        }
    }

    /// Builds the configured provider and model selection
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot be created, for example when no
    /// API key is available
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = create_provider(&config.provider.provider_type, &config.provider)?;
        Ok(Self {
            provider: Arc::from(provider),
            chat_model: config.provider.gemini.chat_model.clone(),
            ping_model: config.provider.gemini.ping_model.clone(),
        })
    }
}

/// Serve the relay on an already bound listener until `shutdown` resolves
///
/// # Errors
///
/// Returns error if the server fails while accepting connections
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(RelayError::Io)?;
    Ok(())
}

/// Relay server bound to the configured address
pub struct RelayServer {
    bind_addr: String,
    state: Arc<AppState>,
}

impl RelayServer {
    pub fn new(bind_addr: impl Into<String>, state: Arc<AppState>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            state,
        }
    }

    /// Run until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be bound or serving fails
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.bind_addr).await.map_err(|e| {
            RelayError::Config(format!("Failed to bind {}: {}", self.bind_addr, e))
        })?;
        info!(
            addr = %self.bind_addr,
            provider = self.state.provider.name(),
            chat_model = %self.state.chat_model,
            "Relay listening"
        );

        serve(listener, self.state.clone(), async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Relay shutting down");
        })
        .await
    }
}
