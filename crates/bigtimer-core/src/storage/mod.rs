mod config;
pub mod database;

pub use config::{CheckoutConfig, Config, GateConfig, PriceIds};
pub use database::Database;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::{ConfigError, StorageError};

/// Returns `~/.config/bigtimer[-dev]/` based on BIGTIMER_ENV.
///
/// Set BIGTIMER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("BIGTIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("bigtimer-dev")
    } else {
        base_dir.join("bigtimer")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDirUnavailable(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Per-profile string blob storage, one value per key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process store. Clones share the same entries, so a test can keep a
/// handle while the gate owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    reject_writes: Rc<Cell<bool>>,
    reject_reads: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, as a full quota would.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }

    /// Make every subsequent read fail, as a locked database would.
    pub fn reject_reads(&self, reject: bool) {
        self.reject_reads.set(reject);
    }

    /// Write directly, bypassing write rejection.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.reject_reads.get() {
            return Err(StorageError::Locked);
        }
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes.get() {
            return Err(StorageError::WriteRejected {
                key: key.to_string(),
                message: "quota exceeded".to_string(),
            });
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
