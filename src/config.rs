//! Persisted WeChat credentials
//!
//! The bridge remembers the application identifier (and optional universal
//! link) across restarts so the OS redirect component can re-create the SDK
//! handle before the host shell has finished loading.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::types::AppId;

/// WeChat credentials held by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub app_id: AppId,
    /// iOS universal link registered with the open platform, if any.
    pub universal_link: Option<String>,
}

impl BridgeConfig {
    pub fn new(app_id: AppId, universal_link: Option<String>) -> Self {
        Self {
            app_id,
            universal_link,
        }
    }
}

/// Durable store for [`BridgeConfig`].
///
/// Persisting replaces both fields: a config without a universal link clears
/// any previously stored one. Validation is the caller's concern.
pub trait ConfigStore: Send + Sync {
    fn persist(&self, config: &BridgeConfig) -> Result<(), BridgeError>;
    fn load(&self) -> Result<Option<BridgeConfig>, BridgeError>;
}

/// File-backed store: one JSON document at a caller-supplied path.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for FileConfigStore {
    fn persist(&self, config: &BridgeConfig) -> Result<(), BridgeError> {
        let data = serde_json::to_vec_pretty(config)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, data)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<BridgeConfig>, BridgeError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path)?;
        Ok(Some(serde_json::from_slice(&data)?))
    }
}

/// In-memory store for hosts that own persistence themselves, and for tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    inner: Mutex<Option<BridgeConfig>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn persist(&self, config: &BridgeConfig) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *inner = Some(config.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<BridgeConfig>, BridgeError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.clone())
    }
}
