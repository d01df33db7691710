//! Universal prompt settings
//!
//! [`SettingsPanel`] owns the current [`UniversalPrompt`] and writes every
//! change through to a [`PromptStore`].

use std::fmt;
use std::sync::Arc;

use super::prompt_store::PromptStore;
use crate::error::Result;

/// Instruction prepended to every conversation when non-empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniversalPrompt(String);

impl UniversalPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the prompt is active
    ///
    /// # Examples
    ///
    /// ```
    /// use relaychat::client::UniversalPrompt;
    ///
    /// assert!(!UniversalPrompt::default().is_set());
    /// assert!(UniversalPrompt::new("Be brief.").is_set());
    /// ```
    pub fn is_set(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for UniversalPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Editor for the universal prompt
pub struct SettingsPanel {
    prompt: UniversalPrompt,
    open: bool,
    store: Arc<dyn PromptStore>,
}

impl SettingsPanel {
    /// Loads the stored prompt once; a missing value starts empty
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read
    pub fn load(store: Arc<dyn PromptStore>) -> Result<Self> {
        let prompt = store.load()?.map(UniversalPrompt::new).unwrap_or_default();
        Ok(Self {
            prompt,
            open: false,
            store,
        })
    }

    pub fn prompt(&self) -> &UniversalPrompt {
        &self.prompt
    }

    /// Drives the "prompt active" indicator
    pub fn is_set(&self) -> bool {
        self.prompt.is_set()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Replaces the prompt and persists it immediately
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written
    pub fn edit(&mut self, text: impl Into<String>) -> Result<()> {
        self.prompt = UniversalPrompt::new(text);
        self.store.save(self.prompt.as_str())
    }

    /// Empties the prompt, persists, and closes the panel
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written
    pub fn clear(&mut self) -> Result<()> {
        self.prompt = UniversalPrompt::default();
        self.open = false;
        self.store.save("")
    }

    /// Persists the current prompt and closes the panel
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written
    pub fn save(&mut self) -> Result<()> {
        self.open = false;
        self.store.save(self.prompt.as_str())
    }
}
