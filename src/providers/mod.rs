//! Provider module for relaychat
//!
//! This module contains the model provider abstraction, the Gemini
//! implementation, the SSE decoder it streams through, and an in-process
//! fake for tests.

pub mod base;
pub mod fake;
pub mod gemini;
pub mod sse;

pub use base::{Message, Provider, Role, TextStream};
pub use fake::{FakeProvider, RecordedCall};
pub use gemini::GeminiProvider;

use crate::config::ProviderConfig;
use crate::error::{RelayError, Result};

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `provider_type` - Type of provider ("gemini")
/// * `config` - Provider configuration
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
///
/// # Examples
///
/// ```
/// use relaychat::config::ProviderConfig;
/// use relaychat::providers::create_provider;
///
/// let result = create_provider("carrier-pigeon", &ProviderConfig::default());
/// assert!(result.is_err());
/// ```
pub fn create_provider(provider_type: &str, config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match provider_type {
        "gemini" => Ok(Box::new(GeminiProvider::new(config.gemini.clone())?)),
        _ => Err(RelayError::Provider(format!("Unknown provider type: {}", provider_type)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;

    #[test]
    fn test_create_provider_invalid_type() {
        let result = create_provider("invalid", &ProviderConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_create_provider_gemini_with_key() {
        let config = ProviderConfig {
            provider_type: "gemini".to_string(),
            gemini: GeminiConfig {
                api_key: Some("test-key".to_string()),
                ..GeminiConfig::default()
            },
        };
        let provider = create_provider("gemini", &config).unwrap();
        assert_eq!(provider.name(), "gemini");
    }
}
