//! Handles shared by every command: config, record store and upload area.

use crate::config::Config;
use crate::error::{CliError, Result};
use gym_store::{FileStore, SqliteStore};
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Opened storage plus the configuration it came from
pub struct Context {
    config: Config,
    store: Arc<Mutex<SqliteStore>>,
    files: FileStore,
}

impl Context {
    /// Open the database and upload area named in `config`, creating them on first use
    pub fn open(config: Config) -> Result<Self> {
        if let Some(parent) = config.storage.database.parent() {
            fs::create_dir_all(parent)?;
        }
        let store = SqliteStore::new(&config.storage.database)?;
        debug!("Opened database {}", config.storage.database.display());
        Ok(Self::with_store(config, store))
    }

    /// Wrap an already opened store
    pub fn with_store(config: Config, store: SqliteStore) -> Self {
        let files = FileStore::new(config.storage.uploads.clone());
        Self {
            config,
            store: Arc::new(Mutex::new(store)),
            files,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lock the store for the duration of one command step
    pub fn store(&self) -> Result<MutexGuard<'_, SqliteStore>> {
        self.store.lock().map_err(|_| CliError::LockPoisoned)
    }

    /// Shared handle for the question generator
    pub fn shared_store(&self) -> Arc<Mutex<SqliteStore>> {
        Arc::clone(&self.store)
    }

    /// Uploaded file storage
    pub fn files(&self) -> &FileStore {
        &self.files
    }
}
