use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::AgentError;

const STORE_FILE: &str = "device.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Per-device persisted state: the id correlating this device with a
/// server-side agent entity, and the opaque authorization token.
///
/// Backed by a small JSON file created on first write; a missing file reads
/// as an empty store. Handles are cheap to clone and share one cache.
#[derive(Clone)]
pub struct DeviceStore {
    inner: Arc<Mutex<StoreInner>>,
}

struct StoreInner {
    path: PathBuf,
    data: StoreData,
}

impl DeviceStore {
    /// Opens the store under `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, AgentError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|e| AgentError::storage(format!("Failed to create {}", dir.display()), e))?;

        let path = dir.join(STORE_FILE);
        let data = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Corrupt device store at {}, starting empty: {e}", path.display());
                StoreData::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => {
                return Err(AgentError::storage(
                    format!("Failed to read {}", path.display()),
                    e,
                ))
            }
        };

        debug!("Opened device store at {}", path.display());
        Ok(Self { inner: Arc::new(Mutex::new(StoreInner { path, data })) })
    }

    pub fn agent_id(&self) -> Option<String> {
        self.inner.lock().data.agent_id.clone()
    }

    pub fn set_agent_id(&self, id: &str) -> Result<(), AgentError> {
        let mut inner = self.inner.lock();
        inner.data.agent_id = Some(id.to_string());
        Self::persist(&inner)
    }

    /// Forgets the provisioned agent, forcing a re-provision on next use.
    pub fn clear_agent(&self) -> Result<(), AgentError> {
        let mut inner = self.inner.lock();
        inner.data.agent_id = None;
        Self::persist(&inner)
    }

    pub fn token(&self) -> Option<String> {
        self.inner.lock().data.token.clone()
    }

    pub fn set_token(&self, token: &str) -> Result<(), AgentError> {
        let mut inner = self.inner.lock();
        inner.data.token = Some(token.to_string());
        Self::persist(&inner)
    }

    fn persist(inner: &StoreInner) -> Result<(), AgentError> {
        let raw = serde_json::to_string_pretty(&inner.data).map_err(|e| {
            AgentError::storage("Failed to serialize device store", e)
        })?;
        fs::write(&inner.path, raw).map_err(|e| {
            AgentError::storage(format!("Failed to write {}", inner.path.display()), e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeviceStore::open(dir.path()).unwrap();
        assert!(store.agent_id().is_none());
        assert!(store.token().is_none());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DeviceStore::open(dir.path()).unwrap();
            store.set_agent_id("agent-7").unwrap();
            store.set_token("tok-123").unwrap();
        }
        let store = DeviceStore::open(dir.path()).unwrap();
        assert_eq!(store.agent_id().as_deref(), Some("agent-7"));
        assert_eq!(store.token().as_deref(), Some("tok-123"));

        store.clear_agent().unwrap();
        let store = DeviceStore::open(dir.path()).unwrap();
        assert!(store.agent_id().is_none());
        assert_eq!(store.token().as_deref(), Some("tok-123"));
    }

    #[test]
    fn corrupt_file_starts_empty_and_stays_usable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STORE_FILE), "not json at all").unwrap();

        let store = DeviceStore::open(dir.path()).unwrap();
        assert!(store.agent_id().is_none());
        store.set_agent_id("agent-1").unwrap();
        assert_eq!(store.agent_id().as_deref(), Some("agent-1"));
    }

    #[test]
    fn clones_share_one_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeviceStore::open(dir.path()).unwrap();
        let other = store.clone();
        store.set_agent_id("agent-9").unwrap();
        assert_eq!(other.agent_id().as_deref(), Some("agent-9"));
    }
}
