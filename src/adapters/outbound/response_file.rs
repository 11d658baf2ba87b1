use crate::common::{DomainError, DomainResult};
use crate::domains::narration::ResponseSlot;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const DEFAULT_RESPONSE_PATH: &str = "LLM_Response/LLM_response.txt";
pub const DEFAULT_SUMMARY_PATH: &str = "LLM_Response/Whole_LLM_response.txt";

/// Response slot stored as a flat text file, overwritten on every write.
pub struct FileResponseSlot {
    path: PathBuf,
}

impl FileResponseSlot {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for FileResponseSlot {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSE_PATH)
    }
}

impl ResponseSlot for FileResponseSlot {
    /// A slot that was never written reads as empty.
    fn read(&self) -> DomainResult<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(&self.path).map_err(|e| {
            DomainError::InfrastructureError(format!("Failed to read {}: {}", self.path.display(), e))
        })
    }

    fn write(&self, text: &str) -> DomainResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                DomainError::InfrastructureError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        // Readers only ever see the old or the new text.
        let staging = self.staging_path();
        fs::write(&staging, text).map_err(|e| {
            DomainError::InfrastructureError(format!("Failed to write {}: {}", staging.display(), e))
        })?;
        fs::rename(&staging, &self.path).map_err(|e| {
            DomainError::InfrastructureError(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryResponseSlot {
    text: RwLock<String>,
}

impl InMemoryResponseSlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseSlot for InMemoryResponseSlot {
    fn read(&self) -> DomainResult<String> {
        self.text
            .read()
            .map(|t| t.clone())
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))
    }

    fn write(&self, text: &str) -> DomainResult<()> {
        let mut slot = self
            .text
            .write()
            .map_err(|e| DomainError::InfrastructureError(e.to_string()))?;
        *slot = text.to_string();
        Ok(())
    }
}
