//! Durable storage for the bearer token.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult, ErrorContext};

/// Where a session token survives restarts.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> ClientResult<Option<String>>;
    fn save(&self, token: &str) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;
}

/// Process-local store, used in tests and for `--no-persist` runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ClientResult<Option<String>> {
        Ok(self.token.read().clone())
    }

    fn save(&self, token: &str) -> ClientResult<()> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.token.write() = None;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenFile {
    access_token: String,
    saved_at: chrono::DateTime<chrono::Utc>,
}

/// JSON file holding `{"access_token": ..., "saved_at": ...}`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, operation: &str, err: impl std::fmt::Display) -> ClientError {
        ClientError::Storage {
            message: err.to_string(),
            context: ErrorContext::new(operation).with_details(self.path.display().to_string()),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ClientResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| self.storage_error("load_token", e))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let file: TokenFile =
            serde_json::from_str(&content).map_err(|e| self.storage_error("load_token", e))?;
        Ok(Some(file.access_token).filter(|t| !t.is_empty()))
    }

    fn save(&self, token: &str) -> ClientResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.storage_error("save_token", e))?;
        }
        let file = TokenFile {
            access_token: token.to_string(),
            saved_at: chrono::Utc::now(),
        };
        let content =
            serde_json::to_string_pretty(&file).map_err(|e| self.storage_error("save_token", e))?;
        fs::write(&self.path, content).map_err(|e| self.storage_error("save_token", e))
    }

    fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error("clear_token", e)),
        }
    }
}
