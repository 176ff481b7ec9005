use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tron_signing_core::{FlowIntent, IntentStore, PortError};

use crate::AdapterConfig;

type IntentMap = BTreeMap<String, FlowIntent>;

/// Saga intent persistence. `File` keeps every intent in one JSON document,
/// rewritten through a temp file on each save.
#[derive(Debug, Clone)]
pub enum IntentStoreAdapter {
    Memory(Arc<Mutex<IntentMap>>),
    File {
        path: PathBuf,
        lock: Arc<Mutex<()>>,
    },
}

impl Default for IntentStoreAdapter {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl IntentStoreAdapter {
    pub fn in_memory() -> Self {
        Self::Memory(Arc::new(Mutex::new(IntentMap::new())))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_config(config: &AdapterConfig) -> Self {
        match config.intent_store_path {
            Some(ref path) => Self::file(path.clone()),
            None => Self::in_memory(),
        }
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> PortError {
    PortError::Transport(format!("intent store lock poisoned: {e}"))
}

fn check_revision(map: &IntentMap, intent: &FlowIntent) -> Result<(), PortError> {
    if let Some(existing) = map.get(&intent.intent_id) {
        if existing.state_revision > intent.state_revision {
            return Err(PortError::Conflict(format!(
                "state revision regression for {}: stored {}, got {}",
                intent.intent_id, existing.state_revision, intent.state_revision
            )));
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<IntentMap, PortError> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(IntentMap::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            PortError::Validation(format!("corrupt intent store {}: {e}", path.display()))
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(IntentMap::new()),
        Err(e) => Err(PortError::Transport(format!(
            "read {} failed: {e}",
            path.display()
        ))),
    }
}

fn write_file(path: &Path, map: &IntentMap) -> Result<(), PortError> {
    let bytes = serde_json::to_vec_pretty(map)
        .map_err(|e| PortError::Validation(format!("intent serialization failed: {e}")))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            PortError::Transport(format!("create {} failed: {e}", parent.display()))
        })?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)
        .map_err(|e| PortError::Transport(format!("write {} failed: {e}", tmp.display())))?;
    fs::rename(&tmp, path)
        .map_err(|e| PortError::Transport(format!("replace {} failed: {e}", path.display())))
}

impl IntentStore for IntentStoreAdapter {
    fn save_intent(&self, intent: &FlowIntent) -> Result<(), PortError> {
        match self {
            Self::Memory(map) => {
                let mut g = map.lock().map_err(poisoned)?;
                check_revision(&g, intent)?;
                g.insert(intent.intent_id.clone(), intent.clone());
                Ok(())
            }
            Self::File { path, lock } => {
                let _g = lock.lock().map_err(poisoned)?;
                let mut map = read_file(path)?;
                check_revision(&map, intent)?;
                map.insert(intent.intent_id.clone(), intent.clone());
                write_file(path, &map)
            }
        }
    }

    fn load_intent(&self, intent_id: &str) -> Result<Option<FlowIntent>, PortError> {
        match self {
            Self::Memory(map) => Ok(map.lock().map_err(poisoned)?.get(intent_id).cloned()),
            Self::File { path, lock } => {
                let _g = lock.lock().map_err(poisoned)?;
                Ok(read_file(path)?.remove(intent_id))
            }
        }
    }

    fn list_intents(&self) -> Result<Vec<FlowIntent>, PortError> {
        match self {
            Self::Memory(map) => Ok(map.lock().map_err(poisoned)?.values().cloned().collect()),
            Self::File { path, lock } => {
                let _g = lock.lock().map_err(poisoned)?;
                Ok(read_file(path)?.into_values().collect())
            }
        }
    }
}
