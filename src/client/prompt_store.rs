//! Persistence for the universal prompt
//!
//! The prompt lives under a single `universalPrompt` key in a small JSON
//! file. It is read once when the client starts and written on every change.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use directories::ProjectDirs;
use serde_json::{Map, Value};

use crate::error::{RelayError, Result};

/// Key the prompt is stored under
pub const PROMPT_KEY: &str = "universalPrompt";

/// Storage for the universal prompt
pub trait PromptStore: Send + Sync {
    /// Returns the stored prompt, or `None` if nothing was ever saved
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Storage` if the stored value cannot be read
    fn load(&self) -> Result<Option<String>>;

    /// Replaces the stored prompt
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Storage` if the value cannot be written
    fn save(&self, prompt: &str) -> Result<()>;
}

/// JSON file backed prompt store
#[derive(Debug, Clone)]
pub struct FilePromptStore {
    path: PathBuf,
}

impl FilePromptStore {
    /// Store backed by the file at `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location in the platform config directory
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Storage` if no home directory can be determined
    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    /// `prompt.json` inside the platform config directory
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Storage` if no home directory can be determined
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "relaychat", "relaychat").ok_or_else(|| {
            RelayError::Storage("Could not determine config directory".to_string())
        })?;
        Ok(proj_dirs.config_dir().join("prompt.json"))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Option<Map<String, Value>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))
            .map_err(|e| RelayError::Storage(format!("{:#}", e)))?;

        if contents.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => Err(RelayError::Storage(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))
            .into()),
            Err(e) => Err(RelayError::Storage(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
            .into()),
        }
    }
}

impl PromptStore for FilePromptStore {
    fn load(&self) -> Result<Option<String>> {
        let document = self.read_document()?;
        Ok(document
            .and_then(|map| map.get(PROMPT_KEY).cloned())
            .and_then(|value| match value {
                Value::String(prompt) => Some(prompt),
                _ => None,
            }))
    }

    fn save(&self, prompt: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create prompt store directory")
                .map_err(|e| RelayError::Storage(format!("{:#}", e)))?;
        }

        let mut document = Map::new();
        document.insert(PROMPT_KEY.to_string(), Value::String(prompt.to_string()));
        let contents = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(RelayError::Serialization)?;

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))
            .map_err(|e| RelayError::Storage(format!("{:#}", e)))?;

        tracing::debug!(path = %self.path.display(), "Saved universal prompt");
        Ok(())
    }
}

/// In-memory prompt store
#[derive(Debug, Default)]
pub struct MemoryPromptStore {
    value: Mutex<Option<String>>,
}

impl MemoryPromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds `prompt`
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(prompt.into())),
        }
    }
}

impl PromptStore for MemoryPromptStore {
    fn load(&self) -> Result<Option<String>> {
        self.value
            .lock()
            .map(|value| value.clone())
            .map_err(|_| RelayError::Storage("prompt store lock poisoned".to_string()).into())
    }

    fn save(&self, prompt: &str) -> Result<()> {
        let mut value = self
            .value
            .lock()
            .map_err(|_| RelayError::Storage("prompt store lock poisoned".to_string()))?;
        *value = Some(prompt.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = FilePromptStore::new(dir.path().join("prompt.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_single_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("prompt.json");
        let store = FilePromptStore::new(&path);

        store.save("Respond in pidgin English.").unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({ "universalPrompt": "Respond in pidgin English." })
        );

        let reopened = FilePromptStore::new(&path);
        assert_eq!(
            reopened.load().unwrap().as_deref(),
            Some("Respond in pidgin English.")
        );
    }

    #[test]
    fn test_file_store_saves_empty_prompt() {
        let dir = TempDir::new().unwrap();
        let store = FilePromptStore::new(dir.path().join("prompt.json"));
        store.save("first").unwrap();
        store.save("").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prompt.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(FilePromptStore::new(&path).load().is_err());
    }

    #[test]
    fn test_file_store_ignores_non_string_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prompt.json");
        std::fs::write(&path, r#"{"universalPrompt": 3}"#).unwrap();
        assert_eq!(FilePromptStore::new(&path).load().unwrap(), None);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryPromptStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save("Be brief.").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("Be brief."));
    }
}
