//! Chat client
//!
//! Drives a conversation against a relay: the [`ChatSession`] state machine,
//! the [`ChatTransport`] it sends through, and the universal prompt
//! settings with their persistent store.

pub mod prompt_store;
pub mod session;
pub mod settings;
pub mod transport;

pub use prompt_store::{FilePromptStore, MemoryPromptStore, PromptStore};
pub use session::{ChatSession, ChatStatus, GENERIC_ERROR_MESSAGE};
pub use settings::{SettingsPanel, UniversalPrompt};
pub use transport::{ChatTransport, FragmentStream, HttpRelayTransport};

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;

/// Prompt store selected by the client configuration
///
/// # Errors
///
/// Returns error if no path is configured and the platform config
/// directory cannot be determined
pub fn prompt_store_from_config(config: &ClientConfig) -> Result<Arc<dyn PromptStore>> {
    let store = match &config.prompt_store {
        Some(path) => FilePromptStore::new(path),
        None => FilePromptStore::at_default_location()?,
    };
    tracing::debug!(path = %store.path().display(), "Using prompt store");
    Ok(Arc::new(store))
}
